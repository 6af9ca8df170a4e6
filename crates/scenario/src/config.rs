//! 시나리오 실행 설정
//!
//! [`ScenarioConfig`]는 core의 [`PowerwatchConfig`]에서 `[detector]`와 `[scenario]`
//! 섹션을 읽어 시나리오 러너가 사용하는 설정을 구성합니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_observer::DetectorConfig;

use crate::error::ScenarioError;

/// 시나리오 실행 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// 재부팅 감지기 설정
    pub detector: DetectorConfig,
    /// 인스턴스 정지 대기 한도 (초)
    pub stop_timeout_secs: u64,
    /// 재시작 후 응답 대기 한도 (초)
    pub start_timeout_secs: u64,
    /// Docker 소켓 경로
    pub docker_socket: String,
    /// 클린 부팅 검사 여부
    pub clean_boot_check: bool,
    /// 클린 부팅 검사에서 무시할 부분 문자열
    pub clean_boot_ignore: Vec<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::from_core(&PowerwatchConfig::default())
    }
}

impl ScenarioConfig {
    /// core 설정에서 시나리오 설정을 생성합니다.
    pub fn from_core(core: &PowerwatchConfig) -> Self {
        Self {
            detector: DetectorConfig::from_core(&core.detector),
            stop_timeout_secs: core.scenario.stop_timeout_secs,
            start_timeout_secs: core.scenario.start_timeout_secs,
            docker_socket: core.scenario.docker_socket.clone(),
            clean_boot_check: core.scenario.clean_boot_check,
            clean_boot_ignore: core.scenario.clean_boot_ignore.clone(),
        }
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.detector.validate()?;

        if self.stop_timeout_secs == 0 {
            return Err(ScenarioError::Config {
                field: "stop_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.start_timeout_secs == 0 {
            return Err(ScenarioError::Config {
                field: "start_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 시나리오 설정 빌더
#[derive(Default)]
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 감지기 설정을 교체합니다.
    pub fn detector(mut self, detector: DetectorConfig) -> Self {
        self.config.detector = detector;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout_secs = timeout.as_secs();
        self
    }

    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.config.start_timeout_secs = timeout.as_secs();
        self
    }

    pub fn docker_socket(mut self, socket: impl Into<String>) -> Self {
        self.config.docker_socket = socket.into();
        self
    }

    pub fn clean_boot_check(mut self, enabled: bool) -> Self {
        self.config.clean_boot_check = enabled;
        self
    }

    /// 클린 부팅 검사에서 무시할 부분 문자열을 추가합니다.
    pub fn ignore_boot_issue(mut self, needle: impl Into<String>) -> Self {
        self.config.clean_boot_ignore.push(needle.into());
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<ScenarioConfig, ScenarioError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_core_defaults() {
        let config = ScenarioConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stop_timeout(), Duration::from_secs(300));
        assert_eq!(config.start_timeout(), Duration::from_secs(300));
        assert_eq!(config.docker_socket, "/var/run/docker.sock");
        assert!(config.clean_boot_check);
        assert_eq!(config.detector.max_wait(), Duration::from_secs(600));
    }

    #[test]
    fn from_core_copies_scenario_section() {
        let mut core = PowerwatchConfig::default();
        core.scenario.stop_timeout_secs = 60;
        core.scenario.clean_boot_ignore = vec!["snapd".to_owned()];
        core.detector.poll_interval_ms = 250;

        let config = ScenarioConfig::from_core(&core);
        assert_eq!(config.stop_timeout_secs, 60);
        assert_eq!(config.clean_boot_ignore, vec!["snapd".to_owned()]);
        assert_eq!(config.detector.poll_interval_ms, 250);
    }

    #[test]
    fn builder_rejects_zero_stop_timeout() {
        let err = ScenarioConfigBuilder::new()
            .stop_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("stop_timeout_secs"));
    }

    #[test]
    fn builder_propagates_detector_validation() {
        let detector = DetectorConfig {
            boot_marker: String::new(),
            ..DetectorConfig::default()
        };
        let err = ScenarioConfigBuilder::new()
            .detector(detector)
            .build()
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Observer(_)));
    }

    #[test]
    fn builder_collects_ignore_list() {
        let config = ScenarioConfigBuilder::new()
            .clean_boot_check(false)
            .ignore_boot_issue("a")
            .ignore_boot_issue("b")
            .docker_socket("/run/docker.sock")
            .build()
            .unwrap();
        assert!(!config.clean_boot_check);
        assert_eq!(config.clean_boot_ignore.len(), 2);
        assert_eq!(config.docker_socket, "/run/docker.sock");
    }
}
