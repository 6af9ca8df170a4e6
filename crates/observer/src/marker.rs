//! 로그 마커 정의
//!
//! [`Marker`]는 로그에서 찾을 리터럴 문자열 또는 정규식 패턴입니다.
//! 마커의 정체성은 정확한 문자열 값입니다.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ObserverError;

/// 로그 마커
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// 문자 그대로 매칭되는 부분 문자열
    Literal(String),
    /// 정규식 패턴
    Pattern(String),
}

impl Marker {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// 정규식으로 컴파일 가능하면 패턴, 아니면 리터럴로 취급합니다.
    pub fn auto(text: impl Into<String>) -> Self {
        let text = text.into();
        if Regex::new(&text).is_ok() {
            Self::Pattern(text)
        } else {
            Self::Literal(text)
        }
    }

    /// 마커의 원본 문자열
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Pattern(s) => s,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// 마커를 정규식으로 컴파일합니다. 리터럴은 이스케이프됩니다.
    ///
    /// # Errors
    ///
    /// 패턴이 유효하지 않으면 `ObserverError::InvalidPattern`을 반환합니다.
    pub fn compile(&self, index: usize) -> Result<Regex, ObserverError> {
        let source = match self {
            Self::Literal(text) => regex::escape(text),
            Self::Pattern(pattern) => pattern.clone(),
        };
        Regex::new(&source).map_err(|e| ObserverError::InvalidPattern {
            index,
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Marker {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Marker {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}
