//! 재부팅 감지기 설정
//!
//! [`DetectorConfig`]는 core의 [`DetectorSection`](powerwatch_core::config::DetectorSection)을
//! 기반으로 감지기 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use powerwatch_core::config::PowerwatchConfig;
//! use powerwatch_observer::config::DetectorConfig;
//!
//! let core_config = PowerwatchConfig::default();
//! let config = DetectorConfig::from_core(&core_config.detector);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use powerwatch_core::config::{DEFAULT_BOOT_MARKER, DEFAULT_LOG_PATH, DetectorSection};

use crate::error::ObserverError;

/// 재부팅 감지기 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// 관측 예산 (밀리초)
    pub max_wait_ms: u64,
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 단일 liveness 프로브 대기 한도 (밀리초)
    pub probe_timeout_ms: u64,
    /// 원격 로그 경로
    pub log_path: String,
    /// 부팅 횟수를 세는 마커 문자열
    pub boot_marker: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: 600_000,
            poll_interval_ms: 1_000,
            probe_timeout_ms: 300_000,
            log_path: DEFAULT_LOG_PATH.to_owned(),
            boot_marker: DEFAULT_BOOT_MARKER.to_owned(),
        }
    }
}

/// 설정 상한값 상수
const MAX_WAIT_MS: u64 = 24 * 60 * 60 * 1000;
const MAX_POLL_INTERVAL_MS: u64 = 60 * 60 * 1000;

impl DetectorConfig {
    /// core의 `DetectorSection`에서 감지기 설정을 생성합니다.
    pub fn from_core(core: &DetectorSection) -> Self {
        Self {
            max_wait_ms: core.max_wait_secs.saturating_mul(1000),
            poll_interval_ms: core.poll_interval_ms,
            probe_timeout_ms: core.probe_timeout_secs.saturating_mul(1000),
            log_path: core.log_path.clone(),
            boot_marker: core.boot_marker.clone(),
        }
    }

    /// 관측 예산
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 단일 프로브 대기 한도
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ObserverError> {
        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ObserverError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            });
        }

        if self.max_wait_ms < self.poll_interval_ms || self.max_wait_ms > MAX_WAIT_MS {
            return Err(ObserverError::Config {
                field: "max_wait_ms".to_owned(),
                reason: format!("must be between poll_interval_ms and {MAX_WAIT_MS}"),
            });
        }

        if self.probe_timeout_ms == 0 {
            return Err(ObserverError::Config {
                field: "probe_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.boot_marker.is_empty() {
            return Err(ObserverError::Config {
                field: "boot_marker".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.log_path.is_empty() {
            return Err(ObserverError::Config {
                field: "log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// 재부팅 감지기 설정 빌더
#[derive(Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 관측 예산을 설정합니다.
    pub fn max_wait(mut self, budget: Duration) -> Self {
        self.config.max_wait_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 폴링 주기를 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 단일 프로브 대기 한도를 설정합니다.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 원격 로그 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<String>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 부팅 마커를 설정합니다.
    pub fn boot_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.boot_marker = marker.into();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<DetectorConfig, ObserverError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
