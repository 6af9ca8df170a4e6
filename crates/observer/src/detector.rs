//! 재부팅 감지기
//!
//! [`RebootDetector`]는 제한된 예산 안에서 인스턴스가 두 번 이상 부팅되었는지
//! (한 번 이상 재부팅되었는지) 판정합니다.
//!
//! # 감지 루프
//!
//! ```text
//! loop {
//!   예산 소진? ──yes──▶ DetectionTimeout
//!     │ no
//!     ▼
//!   wait_until_reachable(min(probe_timeout, 남은 예산))  (프로브 호출도 같은 한도로 제한)
//!     │ 실패 → 일시적 실패로 기록
//!     ▼
//!   read_file(log_path)  (남은 예산으로 제한)
//!     │ 실패 → 일시적 실패로 기록
//!     ▼
//!   BootCycleCount ≥ 2 ? ──yes──▶ Ok(DetectionReport)
//!     │ no
//!     ▼
//!   sleep(min(poll_interval, 남은 예산))
//! }
//! ```
//!
//! 모든 대기가 남은 예산으로 잘리므로, 결과는 예산 T에 대해
//! `[T, T + poll_interval]` 구간 안에 반환됩니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use powerwatch_core::metrics as m;
use powerwatch_core::types::BootCycleCount;

use crate::config::DetectorConfig;
use crate::error::ObserverError;
use crate::instance::Instance;
use crate::probe;
use crate::session::{DetectionReport, ObservationSession};

/// 재부팅 감지기
///
/// 인스턴스 핸들은 `Arc`로 공유되며 읽기 전용으로만 사용됩니다.
/// 각 `detect` 호출은 독립된 [`ObservationSession`]을 소유하므로
/// 서로 다른 인스턴스에 대한 감지를 동시에 실행할 수 있습니다.
pub struct RebootDetector<I: Instance> {
    instance: Arc<I>,
    config: DetectorConfig,
}

impl<I: Instance> RebootDetector<I> {
    /// 새 감지기를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않으면 `ObserverError::Config`를 반환합니다.
    pub fn new(instance: Arc<I>, config: DetectorConfig) -> Result<Self, ObserverError> {
        config.validate()?;
        Ok(Self { instance, config })
    }

    /// 감지기 설정
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 관측 대상 인스턴스
    pub fn instance(&self) -> &Arc<I> {
        &self.instance
    }

    /// 예산 안에 두 번째 부팅이 관측될 때까지 폴링합니다.
    ///
    /// 프로브/읽기 실패는 진단용으로만 집계되며 감지를 중단시키지 않습니다.
    ///
    /// # Errors
    ///
    /// 예산이 소진되면 마지막으로 관측된 부팅 횟수와 함께
    /// `ObserverError::DetectionTimeout`을 반환합니다.
    pub async fn detect(&self) -> Result<DetectionReport, ObserverError> {
        self.run(None).await
    }

    /// [`detect`](Self::detect)와 같지만 취소 토큰을 함께 감시합니다.
    ///
    /// # Errors
    ///
    /// 토큰이 취소되면 `ObserverError::Cancelled`, 예산이 소진되면
    /// `ObserverError::DetectionTimeout`을 반환합니다.
    pub async fn detect_until_cancelled(
        &self,
        token: &CancellationToken,
    ) -> Result<DetectionReport, ObserverError> {
        self.run(Some(token)).await
    }

    /// 인스턴스가 응답을 멈출 때까지 대기합니다 (poweroff/halt 모드).
    ///
    /// # Errors
    ///
    /// `timeout` 안에 응답이 멈추지 않으면 `ObserverError::ProbeTimeout`을 반환합니다.
    pub async fn wait_for_stop(&self, timeout: Duration) -> Result<(), ObserverError> {
        info!(
            timeout_secs = timeout.as_secs(),
            "waiting for instance to stop"
        );
        match self.instance.wait_until_unreachable(timeout).await {
            Ok(()) => {
                info!("instance stopped");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "instance did not stop in time");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        token: Option<&CancellationToken>,
    ) -> Result<DetectionReport, ObserverError> {
        let mut session =
            ObservationSession::start(self.config.max_wait(), self.config.poll_interval());

        info!(
            session_id = %session.id(),
            max_wait_ms = self.config.max_wait_ms,
            poll_interval_ms = self.config.poll_interval_ms,
            log_path = %self.config.log_path,
            "reboot detection started"
        );

        let result = loop {
            if token.is_some_and(CancellationToken::is_cancelled) {
                break Err(session.cancelled_error());
            }
            if session.remaining().is_none() {
                break Err(session.timeout_error());
            }

            session.record_poll();
            metrics::counter!(m::DETECTOR_POLLS_TOTAL).increment(1);

            let Some(polled) = or_cancelled(token, self.poll_once(session.deadline())).await
            else {
                break Err(session.cancelled_error());
            };

            match polled {
                Ok(count) => {
                    let count = session.observe(count);
                    if count.has_rebooted() {
                        break Ok(session.report());
                    }
                    if count.get() == 1 {
                        debug!(
                            session_id = %session.id(),
                            polls = session.polls(),
                            "single boot observed, waiting for reboot"
                        );
                    }
                }
                Err(e) => {
                    session.record_transient(&e);
                    metrics::counter!(m::DETECTOR_TRANSIENT_FAILURES_TOTAL).increment(1);
                }
            }

            let Some(remaining) = session.remaining() else {
                break Err(session.timeout_error());
            };
            let nap = session.poll_interval().min(remaining);
            if or_cancelled(token, tokio::time::sleep(nap)).await.is_none() {
                break Err(session.cancelled_error());
            }
        };

        let label = match &result {
            Ok(_) => "success",
            Err(ObserverError::Cancelled { .. }) => "cancelled",
            Err(_) => "timeout",
        };
        metrics::counter!(m::DETECTOR_SESSIONS_TOTAL, m::LABEL_RESULT => label).increment(1);
        metrics::histogram!(m::DETECTOR_SESSION_DURATION_SECONDS)
            .record(session.elapsed().as_secs_f64());

        match &result {
            Ok(report) => info!(
                session_id = %report.session_id,
                boot_count = report.boot_count,
                polls = report.polls,
                transient_failures = report.transient_failures,
                elapsed_ms = report.elapsed_ms,
                "reboot detected"
            ),
            Err(e) => warn!(
                session_id = %session.id(),
                highest_boot_count = session.highest_count().get(),
                transient_failures = session.transient_failures(),
                error = %e,
                "reboot detection ended without second boot"
            ),
        }

        result
    }

    /// 폴링 1회: reachability 대기 → 로그 읽기 → 부팅 횟수 계산
    async fn poll_once(&self, deadline: Instant) -> Result<BootCycleCount, ObserverError> {
        let remaining = probe::remaining_until(deadline).unwrap_or(Duration::ZERO);
        let probe_budget = self.config.probe_timeout().min(remaining);
        tokio::time::timeout(probe_budget, self.instance.wait_until_reachable(probe_budget))
            .await
            .map_err(|_elapsed| ObserverError::ProbeTimeout {
                waited_secs: probe::ceil_secs(probe_budget),
            })??;

        let remaining = probe::remaining_until(deadline).unwrap_or(Duration::ZERO);
        let log = tokio::time::timeout(remaining, self.instance.read_file(&self.config.log_path))
            .await
            .map_err(|_elapsed| ObserverError::TransientIo("log read timed out".to_owned()))??;

        Ok(BootCycleCount::count(&log, &self.config.boot_marker))
    }
}

/// 토큰이 있으면 취소와 경합시키고, 취소되면 `None`을 반환합니다.
async fn or_cancelled<F: Future>(token: Option<&CancellationToken>, fut: F) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            () = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}
