//! 클린 부팅 검사
//!
//! 캡처한 로그에서 경고/에러/트레이스백 라인을 찾아 보고합니다.
//! 설정된 무시 목록의 부분 문자열을 포함한 라인은 제외합니다.

use serde::Serialize;

use powerwatch_core::types::LogText;

use crate::error::ScenarioError;

/// 문제로 간주하는 키워드
pub const ISSUE_KEYWORDS: [&str; 4] = ["WARNING", "ERROR", "CRITICAL", "Traceback"];

/// 클린 부팅 검사기
#[derive(Debug, Clone, Default)]
pub struct CleanBootChecker {
    ignore: Vec<String>,
}

/// 클린 부팅 검사 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanBootReport {
    /// 문제로 판정된 라인 (원문 그대로)
    pub issues: Vec<String>,
}

impl CleanBootReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl CleanBootChecker {
    pub fn new(ignore: Vec<String>) -> Self {
        Self { ignore }
    }

    /// 로그를 검사하여 문제 라인을 수집합니다.
    pub fn check(&self, log: &LogText) -> CleanBootReport {
        let issues = log
            .as_str()
            .lines()
            .filter(|line| ISSUE_KEYWORDS.iter().any(|kw| line.contains(kw)))
            .filter(|line| !self.ignore.iter().any(|needle| line.contains(needle.as_str())))
            .map(str::to_owned)
            .collect();
        CleanBootReport { issues }
    }

    /// 문제 라인이 있으면 에러를 반환합니다.
    pub fn ensure_clean(&self, log: &LogText) -> Result<(), ScenarioError> {
        let report = self.check(log);
        if report.is_clean() {
            return Ok(());
        }
        let first = report.issues.first().map(String::as_str).unwrap_or_default();
        Err(ScenarioError::CleanBoot(format!(
            "{} issue line(s), first: {first}",
            report.issues.len()
        )))
    }
}
