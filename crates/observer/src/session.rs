//! 관측 세션 상태
//!
//! [`ObservationSession`]은 감지 호출 1회의 가변 상태를 소유합니다.
//! 감지 호출이 시작될 때 생성되고 반환될 때 폐기되며, 저장되지 않습니다.
//! 세션 간에는 어떤 가변 상태도 공유하지 않습니다.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::warn;
use uuid::Uuid;

use powerwatch_core::types::BootCycleCount;

use crate::error::ObserverError;
use crate::probe;

/// 감지 호출 1회의 상태
#[derive(Debug)]
pub struct ObservationSession {
    id: Uuid,
    started: Instant,
    deadline: Instant,
    budget: Duration,
    poll_interval: Duration,
    polls: u64,
    transient_failures: u64,
    last_count: BootCycleCount,
    highest_count: BootCycleCount,
}

impl ObservationSession {
    /// 새 세션을 시작합니다. 데드라인은 지금으로부터 `budget` 이후입니다.
    pub fn start(budget: Duration, poll_interval: Duration) -> Self {
        let started = Instant::now();
        Self {
            id: Uuid::new_v4(),
            started,
            deadline: probe::deadline_after(budget),
            budget,
            poll_interval,
            polls: 0,
            transient_failures: 0,
            last_count: BootCycleCount::default(),
            highest_count: BootCycleCount::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// 데드라인까지 남은 시간. 예산이 소진되었으면 `None`.
    pub fn remaining(&self) -> Option<Duration> {
        probe::remaining_until(self.deadline)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 폴링 1회를 기록합니다.
    pub fn record_poll(&mut self) {
        self.polls += 1;
    }

    /// 삼켜진 일시적 실패 1회를 기록합니다.
    pub fn record_transient(&mut self, err: &ObserverError) {
        self.transient_failures += 1;
        tracing::debug!(
            session_id = %self.id,
            failures = self.transient_failures,
            error = %err,
            "transient failure swallowed"
        );
    }

    /// 새 스냅샷에서 센 부팅 횟수를 기록합니다.
    ///
    /// 최고값은 감소하지 않습니다. 스냅샷의 횟수가 이전보다 작으면
    /// (로그 파일이 재생성된 경우 등) 경고를 남기고 현재 값을 그대로 반환합니다.
    pub fn observe(&mut self, count: BootCycleCount) -> BootCycleCount {
        if count < self.last_count {
            warn!(
                session_id = %self.id,
                previous = self.last_count.get(),
                current = count.get(),
                "boot count decreased between snapshots"
            );
        }
        self.last_count = count;
        self.highest_count = self.highest_count.max(count);
        count
    }

    /// 마지막으로 관측된 부팅 횟수
    pub fn last_count(&self) -> BootCycleCount {
        self.last_count
    }

    /// 세션 동안 관측된 최고 부팅 횟수
    pub fn highest_count(&self) -> BootCycleCount {
        self.highest_count
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn transient_failures(&self) -> u64 {
        self.transient_failures
    }

    /// 예산 소진 에러를 생성합니다.
    pub fn timeout_error(&self) -> ObserverError {
        ObserverError::DetectionTimeout {
            waited_secs: probe::ceil_secs(self.budget),
            last_boot_count: self.last_count.get(),
        }
    }

    /// 취소 에러를 생성합니다.
    pub fn cancelled_error(&self) -> ObserverError {
        ObserverError::Cancelled {
            last_boot_count: self.last_count.get(),
        }
    }

    /// 성공 보고서를 생성합니다.
    pub fn report(&self) -> DetectionReport {
        DetectionReport {
            session_id: self.id,
            boot_count: self.last_count.get(),
            polls: self.polls,
            transient_failures: self.transient_failures,
            elapsed_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// 재부팅 감지 성공 보고서
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    /// 세션 ID (추적용)
    pub session_id: Uuid,
    /// 성공 시점의 부팅 횟수 (항상 2 이상)
    pub boot_count: usize,
    /// 로그 폴링 횟수
    pub polls: u64,
    /// 삼켜진 일시적 실패 횟수
    pub transient_failures: u64,
    /// 소요 시간 (밀리초)
    pub elapsed_ms: u64,
}
