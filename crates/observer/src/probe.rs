//! 프로브/재시도 공용 배관
//!
//! 모든 대기는 전역 타임아웃 프리미티브가 아닌 명시적 데드라인 값으로 표현합니다.
//! 스레드 기반이든 협력형 태스크 기반이든 동일하게 동작하도록 하기 위함입니다.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::error::ObserverError;
use crate::instance::Instance;

/// 기본 reachability 재확인 주기
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// 데드라인 계산 시 오버플로 방지용 상한 (30일)
const MAX_DEADLINE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// 현재 시각으로부터 `budget` 이후의 데드라인을 계산합니다.
pub fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget.min(MAX_DEADLINE))
        .unwrap_or(now)
}

/// 데드라인까지 남은 시간. 이미 지났으면 `None`.
pub fn remaining_until(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
}

/// 초 단위로 올림한 대기 시간 (에러 메시지용)
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

/// 인스턴스가 원하는 reachability 상태가 될 때까지 폴링합니다.
///
/// 최소 한 번은 프로브를 호출하며, `timeout`이 지나면 `ProbeTimeout`을 반환합니다.
/// 프로브 호출 자체와 대기 간격 모두 남은 시간으로 잘립니다.
pub async fn wait_for_reachability<I: Instance + ?Sized>(
    instance: &I,
    want_reachable: bool,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ObserverError> {
    let deadline = deadline_after(timeout);
    let timed_out = || ObserverError::ProbeTimeout {
        waited_secs: ceil_secs(timeout),
    };
    loop {
        let budget = remaining_until(deadline).unwrap_or(Duration::ZERO);
        let reachable = tokio::time::timeout(budget, instance.is_reachable())
            .await
            .map_err(|_elapsed| timed_out())?;
        if reachable == want_reachable {
            return Ok(());
        }

        let Some(remaining) = remaining_until(deadline) else {
            return Err(timed_out());
        };

        trace!(
            want_reachable,
            remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            "instance not yet in wanted state"
        );
        tokio::time::sleep(interval.min(remaining)).await;
    }
}
