//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `powerwatch_`
//! - 모듈명: `detector_`, `verifier_`, `scenario_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(powerwatch_core::metrics::DETECTOR_POLLS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, timeout, cancelled, failure)
pub const LABEL_RESULT: &str = "result";

/// 전원 모드 레이블 키 (poweroff, reboot, halt)
pub const LABEL_MODE: &str = "mode";

// ─── Detector 메트릭 ───────────────────────────────────────────────

/// Detector: 로그 폴링 횟수 (counter)
pub const DETECTOR_POLLS_TOTAL: &str = "powerwatch_detector_polls_total";

/// Detector: 삼켜진 일시적 실패 횟수 (counter)
pub const DETECTOR_TRANSIENT_FAILURES_TOTAL: &str =
    "powerwatch_detector_transient_failures_total";

/// Detector: 종료된 관측 세션 수 (counter, label: result)
pub const DETECTOR_SESSIONS_TOTAL: &str = "powerwatch_detector_sessions_total";

/// Detector: 관측 세션 소요 시간 (histogram, 초)
pub const DETECTOR_SESSION_DURATION_SECONDS: &str =
    "powerwatch_detector_session_duration_seconds";

// ─── Verifier 메트릭 ───────────────────────────────────────────────

/// Verifier: 마커 순서 검증 횟수 (counter, label: result)
pub const VERIFIER_CHECKS_TOTAL: &str = "powerwatch_verifier_checks_total";

// ─── Scenario 메트릭 ───────────────────────────────────────────────

/// Scenario: 실행된 시나리오 수 (counter, labels: mode, result)
pub const SCENARIO_RUNS_TOTAL: &str = "powerwatch_scenario_runs_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더가 설치되지 않았다면 아무 효과가 없습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        DETECTOR_POLLS_TOTAL,
        "Total number of log polls performed by the reboot detector"
    );
    describe_counter!(
        DETECTOR_TRANSIENT_FAILURES_TOTAL,
        "Total number of probe or log read failures swallowed during detection"
    );
    describe_counter!(
        DETECTOR_SESSIONS_TOTAL,
        "Total number of finished observation sessions by result"
    );
    describe_histogram!(
        DETECTOR_SESSION_DURATION_SECONDS,
        "Wall-clock duration of a single observation session in seconds"
    );
    describe_counter!(
        VERIFIER_CHECKS_TOTAL,
        "Total number of ordered marker verifications by result"
    );
    describe_counter!(
        SCENARIO_RUNS_TOTAL,
        "Total number of power-state scenarios run by mode and result"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        DETECTOR_POLLS_TOTAL,
        DETECTOR_TRANSIENT_FAILURES_TOTAL,
        DETECTOR_SESSIONS_TOTAL,
        DETECTOR_SESSION_DURATION_SECONDS,
        VERIFIER_CHECKS_TOTAL,
        SCENARIO_RUNS_TOTAL,
    ];

    #[test]
    fn all_metrics_start_with_powerwatch_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("powerwatch_"),
                "Metric '{}' does not start with 'powerwatch_' prefix",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더 없이 호출해도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_RESULT, LABEL_MODE] {
            assert_eq!(label.to_lowercase(), label);
        }
    }
}
