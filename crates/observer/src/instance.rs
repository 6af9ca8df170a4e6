//! 원격 인스턴스 추상화
//!
//! [`Instance`] trait은 관측 엔진이 원격 머신에 대해 필요로 하는 최소한의 연산
//! (liveness 프로브, 로그 읽기)만 노출합니다. 인스턴스의 수명주기(start/stop/destroy)는
//! 오케스트레이터의 책임이며 이 trait에 포함되지 않습니다.
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────────┐
//! │ RebootDetector │ ──▶ │ Instance (trait)     │
//! └────────────────┘     └──────────────────────┘
//!                            │           │
//!                            ▼           ▼
//!                     DockerInstance   MockInstance
//! ```

use std::future::Future;
use std::time::Duration;

use powerwatch_core::types::LogText;

use crate::error::ObserverError;
use crate::probe;

/// 관측 대상 원격 인스턴스
///
/// 모든 메서드는 읽기 전용이며, 관측 엔진은 인스턴스 상태를 변경하지 않습니다.
/// `Send + Sync + 'static`이므로 `Arc<I>`로 여러 비동기 태스크에서 공유할 수 있습니다.
///
/// 대기 메서드들은 [`probe::wait_for_reachability`] 기반의 기본 구현을 제공하므로,
/// 구현체는 `is_reachable`과 `read_file`만 구현하면 됩니다.
pub trait Instance: Send + Sync + 'static {
    /// 인스턴스가 현재 응답하는지 확인합니다.
    ///
    /// 실패는 `false`로 표현되며 에러를 반환하지 않습니다.
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;

    /// 원격 파일 전체를 읽어 스냅샷으로 반환합니다.
    ///
    /// # Errors
    ///
    /// 인스턴스에 도달할 수 없거나 읽기가 실패하면 `ObserverError::TransientIo`를 반환합니다.
    fn read_file(&self, path: &str) -> impl Future<Output = Result<LogText, ObserverError>> + Send;

    /// 인스턴스가 응답할 때까지 대기합니다.
    ///
    /// # Errors
    ///
    /// `timeout` 내에 응답하지 않으면 `ObserverError::ProbeTimeout`을 반환합니다.
    fn wait_until_reachable(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ObserverError>> + Send {
        probe::wait_for_reachability(self, true, timeout, probe::DEFAULT_PROBE_INTERVAL)
    }

    /// 인스턴스가 응답을 멈출 때까지 대기합니다.
    ///
    /// 종료/재부팅 구간을 가로지를 때 사용합니다.
    ///
    /// # Errors
    ///
    /// `timeout` 내에 응답이 멈추지 않으면 `ObserverError::ProbeTimeout`을 반환합니다.
    fn wait_until_unreachable(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ObserverError>> + Send {
        probe::wait_for_reachability(self, false, timeout, probe::DEFAULT_PROBE_INTERVAL)
    }
}

/// 테스트용 Mock 인스턴스
///
/// 읽기 결과를 순서대로 재생하거나, 가상 시간에 따라 로그 내용이 바뀌는
/// 타임라인을 재생할 수 있습니다. `tokio::time::pause()`와 함께 사용합니다.
#[cfg(test)]
pub struct MockInstance {
    /// 생성 시각 (타임라인 기준점)
    created: tokio::time::Instant,
    /// reachability 전환 시점과 전환 후 상태
    reachability: (Duration, bool),
    /// 순서대로 재생할 읽기 결과 (Err는 일시적 실패)
    reads: std::sync::Mutex<std::collections::VecDeque<Result<String, String>>>,
    /// (경과 시간, 로그 내용) 타임라인
    timeline: Vec<(Duration, String)>,
    /// read_file 호출 횟수
    pub read_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockInstance {
    /// 항상 응답하고 빈 로그를 반환하는 mock을 생성합니다.
    pub fn new() -> Self {
        Self {
            created: tokio::time::Instant::now(),
            reachability: (Duration::ZERO, true),
            reads: std::sync::Mutex::new(std::collections::VecDeque::new()),
            timeline: Vec::new(),
            read_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// 절대 응답하지 않도록 설정합니다.
    pub fn unreachable(mut self) -> Self {
        self.reachability = (Duration::ZERO, false);
        self
    }

    /// `after` 경과 후부터 응답하도록 설정합니다.
    pub fn reachable_after(mut self, after: Duration) -> Self {
        self.reachability = (after, true);
        self
    }

    /// `after` 경과 후부터 응답하지 않도록 설정합니다.
    pub fn unreachable_after(mut self, after: Duration) -> Self {
        self.reachability = (after, false);
        self
    }

    /// 순서대로 재생할 읽기 결과를 설정합니다.
    pub fn with_reads(self, reads: Vec<Result<&str, &str>>) -> Self {
        {
            let mut queue = self.reads.lock().unwrap();
            for read in reads {
                queue.push_back(read.map(str::to_owned).map_err(str::to_owned));
            }
        }
        self
    }

    /// 경과 시간에 따른 로그 내용을 설정합니다.
    pub fn with_timeline(mut self, timeline: Vec<(Duration, &str)>) -> Self {
        self.timeline = timeline
            .into_iter()
            .map(|(at, text)| (at, text.to_owned()))
            .collect();
        self
    }

    /// read_file 호출 횟수를 반환합니다.
    pub fn read_count(&self) -> usize {
        self.read_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Instance for MockInstance {
    async fn is_reachable(&self) -> bool {
        let (switch_at, after) = self.reachability;
        if self.created.elapsed() >= switch_at {
            after
        } else {
            !after
        }
    }

    async fn read_file(&self, _path: &str) -> Result<LogText, ObserverError> {
        self.read_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(read) = self.reads.lock().unwrap().pop_front() {
            return read
                .map(LogText::from)
                .map_err(ObserverError::TransientIo);
        }

        if self.timeline.is_empty() {
            return Ok(LogText::from(""));
        }

        let elapsed = self.created.elapsed();
        self.timeline
            .iter()
            .rev()
            .find(|(at, _)| *at <= elapsed)
            .map(|(_, text)| LogText::from(text.as_str()))
            .ok_or_else(|| ObserverError::TransientIo("log file does not exist yet".to_owned()))
    }
}

/// `is_reachable`이 응답 전에 오래 멈추는 테스트용 인스턴스
///
/// 로그에는 항상 부팅이 한 번만 기록되어 있습니다.
#[cfg(test)]
pub struct SlowProbe(pub Duration);

#[cfg(test)]
impl Instance for SlowProbe {
    async fn is_reachable(&self) -> bool {
        tokio::time::sleep(self.0).await;
        true
    }

    async fn read_file(&self, _path: &str) -> Result<LogText, ObserverError> {
        Ok(LogText::from("running 'init-local'\n"))
    }
}
