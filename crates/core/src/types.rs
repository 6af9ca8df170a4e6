//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 관측 엔진과 시나리오 오케스트레이터가 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 원격 로그의 불변 스냅샷
///
/// 매 읽기마다 파일 전체를 가져오며, 부분적으로 소비되지 않습니다.
/// 내부적으로 `Arc<str>`를 사용하므로 복제 비용이 작습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogText(Arc<str>);

impl LogText {
    /// 문자열로부터 스냅샷을 생성합니다.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// 원시 바이트로부터 스냅샷을 생성합니다.
    ///
    /// 원격 로그에 잘못된 UTF-8이 섞여 있어도 실패하지 않도록
    /// 손실 변환(`U+FFFD` 치환)을 사용합니다.
    pub fn from_bytes_lossy(bytes: &[u8]) -> Self {
        Self(Arc::from(String::from_utf8_lossy(bytes).as_ref()))
    }

    /// 스냅샷 텍스트를 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 스냅샷 길이(바이트)를 반환합니다.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 스냅샷이 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 부분 문자열이 포함되어 있는지 확인합니다.
    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl From<String> for LogText {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for LogText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for LogText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 부팅 횟수
///
/// 로그 스냅샷에서 부팅 마커가 등장한 횟수(겹치지 않는 매칭)입니다.
/// 같은 인스턴스의 로그는 append-only이므로 한 관측 세션 내에서 감소하지 않아야 합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BootCycleCount(pub usize);

impl BootCycleCount {
    /// 스냅샷에서 부팅 마커 등장 횟수를 셉니다.
    ///
    /// 빈 마커는 항상 0을 반환합니다.
    pub fn count(text: &LogText, boot_marker: &str) -> Self {
        if boot_marker.is_empty() {
            return Self(0);
        }
        Self(text.as_str().matches(boot_marker).count())
    }

    /// 재부팅이 한 번 이상 관측되었는지 (부팅 2회 이상)
    pub fn has_rebooted(self) -> bool {
        self.0 > 1
    }

    /// 횟수 값을 반환합니다.
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for BootCycleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 검증 결과
///
/// 오케스트레이터에 노출되는 태그된 결과입니다.
/// JSON 직렬화 시 `"outcome": "success" | "failure"` 태그를 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// 모든 기대가 충족됨
    Success,
    /// 기대 중 하나가 실패함
    Failure {
        /// 찾지 못한 마커 인덱스 (마커 검증 이전 단계에서 실패했으면 None)
        failed_marker_index: Option<usize>,
        /// 마지막으로 관측된 부팅 횟수
        last_known_boot_count: usize,
        /// 실패한 기대를 명시하는 메시지
        reason: String,
    },
}

impl VerificationOutcome {
    /// 성공 여부를 반환합니다.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure { reason, .. } => write!(f, "failure: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_count_counts_non_overlapping_occurrences() {
        let text = LogText::from(
            "Cloud-init running 'init-local'\n...\nCloud-init running 'init-local'\n",
        );
        assert_eq!(BootCycleCount::count(&text, "running 'init-local'").get(), 2);
    }

    #[test]
    fn boot_count_zero_for_empty_log() {
        let text = LogText::from("");
        assert_eq!(BootCycleCount::count(&text, "running 'init-local'").get(), 0);
    }

    #[test]
    fn boot_count_empty_marker_is_zero() {
        let text = LogText::from("anything");
        assert_eq!(BootCycleCount::count(&text, "").get(), 0);
    }

    #[test]
    fn boot_count_is_idempotent_on_same_snapshot() {
        let text = LogText::from("running 'init-local'\nrunning 'init-local'");
        let a = BootCycleCount::count(&text, "running 'init-local'");
        let b = BootCycleCount::count(&text, "running 'init-local'");
        assert_eq!(a, b);
        assert!(a.has_rebooted());
    }

    #[test]
    fn single_boot_has_not_rebooted() {
        assert!(!BootCycleCount(1).has_rebooted());
        assert!(!BootCycleCount(0).has_rebooted());
    }

    #[test]
    fn log_text_lossy_conversion() {
        let text = LogText::from_bytes_lossy(b"ok \xff tail");
        assert!(text.contains("ok"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(VerificationOutcome::Success).unwrap();
        assert_eq!(json["outcome"], "success");

        let failure = VerificationOutcome::Failure {
            failed_marker_index: Some(2),
            last_known_boot_count: 2,
            reason: "marker #2 not found".to_owned(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["failed_marker_index"], 2);
        assert_eq!(json["last_known_boot_count"], 2);
        assert!(!failure.is_success());
    }
}
