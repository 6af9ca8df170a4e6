//! 설정 관리 -- powerwatch.toml 파싱 및 런타임 설정
//!
//! [`PowerwatchConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`POWERWATCH_DETECTOR_MAX_WAIT_SECS=900` 형식)
//! 3. 설정 파일 (`powerwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), powerwatch_core::error::PowerwatchError> {
//! use powerwatch_core::config::PowerwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = PowerwatchConfig::load("powerwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = PowerwatchConfig::parse("[detector]\nmax_wait_secs = 900")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, PowerwatchError};

/// 기본 부팅 마커 -- cloud-init이 부팅마다 한 번 기록하는 문자열
pub const DEFAULT_BOOT_MARKER: &str = "running 'init-local'";

/// 기본 원격 로그 경로
pub const DEFAULT_LOG_PATH: &str = "/var/log/cloud-init.log";

/// 기본 Docker 소켓 경로
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Powerwatch 통합 설정
///
/// `powerwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 크레이트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 재부팅 감지기 설정
    #[serde(default)]
    pub detector: DetectorSection,
    /// 시나리오 실행 설정
    #[serde(default)]
    pub scenario: ScenarioSection,
}

impl PowerwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PowerwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 사용하여 설정을 로드합니다.
    ///
    /// CLI의 일회성 명령은 설정 파일 없이도 동작해야 하므로
    /// `FileNotFound`만 기본값으로 대체하고 나머지 에러는 그대로 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, PowerwatchError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(config) => Ok(config),
            Err(PowerwatchError::Config(ConfigError::FileNotFound { .. })) => {
                warn!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PowerwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PowerwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PowerwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PowerwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            PowerwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `POWERWATCH_{SECTION}_{FIELD}`
    /// 예: `POWERWATCH_DETECTOR_POLL_INTERVAL_MS=500`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(
            &mut self.general.log_level,
            "POWERWATCH_GENERAL_LOG_LEVEL",
        );
        override_string(
            &mut self.general.log_format,
            "POWERWATCH_GENERAL_LOG_FORMAT",
        );

        // Detector
        override_u64(
            &mut self.detector.max_wait_secs,
            "POWERWATCH_DETECTOR_MAX_WAIT_SECS",
        );
        override_u64(
            &mut self.detector.poll_interval_ms,
            "POWERWATCH_DETECTOR_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.detector.probe_timeout_secs,
            "POWERWATCH_DETECTOR_PROBE_TIMEOUT_SECS",
        );
        override_string(&mut self.detector.log_path, "POWERWATCH_DETECTOR_LOG_PATH");
        override_string(
            &mut self.detector.boot_marker,
            "POWERWATCH_DETECTOR_BOOT_MARKER",
        );

        // Scenario
        override_u64(
            &mut self.scenario.stop_timeout_secs,
            "POWERWATCH_SCENARIO_STOP_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.scenario.start_timeout_secs,
            "POWERWATCH_SCENARIO_START_TIMEOUT_SECS",
        );
        override_string(
            &mut self.scenario.docker_socket,
            "POWERWATCH_SCENARIO_DOCKER_SOCKET",
        );
        override_bool(
            &mut self.scenario.clean_boot_check,
            "POWERWATCH_SCENARIO_CLEAN_BOOT_CHECK",
        );
        override_csv(
            &mut self.scenario.clean_boot_ignore,
            "POWERWATCH_SCENARIO_CLEAN_BOOT_IGNORE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), PowerwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 폴링 주기는 0이 될 수 없음 (busy-wait 방지)
        if self.detector.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detector.poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detector.max_wait_secs.saturating_mul(1000) < self.detector.poll_interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "detector.max_wait_secs".to_owned(),
                reason: "budget must be at least one poll interval".to_owned(),
            }
            .into());
        }

        if self.detector.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detector.probe_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detector.boot_marker.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "detector.boot_marker".to_owned(),
                reason: "boot marker must not be empty".to_owned(),
            }
            .into());
        }

        if self.detector.log_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "detector.log_path".to_owned(),
                reason: "log path must not be empty".to_owned(),
            }
            .into());
        }

        if self.scenario.stop_timeout_secs == 0 || self.scenario.start_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scenario.stop_timeout_secs/start_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 재부팅 감지기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// 관측 예산 (초)
    pub max_wait_secs: u64,
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 단일 liveness 프로브 대기 한도 (초)
    pub probe_timeout_secs: u64,
    /// 원격 로그 경로
    pub log_path: String,
    /// 부팅 횟수를 세는 마커 문자열
    pub boot_marker: String,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            max_wait_secs: 600,
            poll_interval_ms: 1000,
            probe_timeout_secs: 300,
            log_path: DEFAULT_LOG_PATH.to_owned(),
            boot_marker: DEFAULT_BOOT_MARKER.to_owned(),
        }
    }
}

/// 시나리오 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSection {
    /// poweroff/halt 후 정지 대기 한도 (초)
    pub stop_timeout_secs: u64,
    /// start 후 도달 가능 대기 한도 (초)
    pub start_timeout_secs: u64,
    /// Docker 소켓 경로
    pub docker_socket: String,
    /// 클린 부팅 검사 활성화
    pub clean_boot_check: bool,
    /// 클린 부팅 검사에서 무시할 부분 문자열
    pub clean_boot_ignore: Vec<String>,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 300,
            start_timeout_secs: 300,
            docker_socket: DEFAULT_DOCKER_SOCKET.to_owned(),
            clean_boot_check: true,
            clean_boot_ignore: Vec::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = PowerwatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.detector.max_wait_secs, 600);
        assert_eq!(config.detector.poll_interval_ms, 1000);
        assert_eq!(config.detector.boot_marker, "running 'init-local'");
        assert_eq!(config.detector.log_path, "/var/log/cloud-init.log");
        assert!(config.scenario.clean_boot_check);
    }

    #[test]
    fn default_config_passes_validation() {
        PowerwatchConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = PowerwatchConfig::parse("").unwrap();
        assert_eq!(config.detector.probe_timeout_secs, 300);
        assert_eq!(config.scenario.docker_socket, "/var/run/docker.sock");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[detector]
max_wait_secs = 900
boot_marker = "Cloud-init v. 24.1 running 'init-local'"
"#;
        let config = PowerwatchConfig::parse(toml).unwrap();
        assert_eq!(config.detector.max_wait_secs, 900);
        // poll_interval_ms는 기본값 유지
        assert_eq!(config.detector.poll_interval_ms, 1000);
        assert!(config.detector.boot_marker.starts_with("Cloud-init"));
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = PowerwatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            PowerwatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = PowerwatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = PowerwatchConfig::default();
        config.detector.poll_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn validate_rejects_budget_shorter_than_poll() {
        let mut config = PowerwatchConfig::default();
        config.detector.max_wait_secs = 1;
        config.detector.poll_interval_ms = 5_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_wait_secs"));
    }

    #[test]
    fn validate_rejects_empty_boot_marker() {
        let mut config = PowerwatchConfig::default();
        config.detector.boot_marker = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("boot_marker"));
    }

    #[test]
    fn validate_rejects_zero_stop_timeout() {
        let mut config = PowerwatchConfig::default();
        config.scenario.stop_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_u64() {
        let mut val = 600;
        // SAFETY: serial 테스트로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_POWERWATCH_U64", "42") };
        override_u64(&mut val, "TEST_POWERWATCH_U64");
        assert_eq!(val, 42);
        unsafe { std::env::remove_var("TEST_POWERWATCH_U64") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut val = 600;
        // SAFETY: serial 테스트로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_POWERWATCH_U64_BAD", "ten minutes") };
        override_u64(&mut val, "TEST_POWERWATCH_U64_BAD");
        assert_eq!(val, 600);
        unsafe { std::env::remove_var("TEST_POWERWATCH_U64_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_bool_valid() {
        let mut val = true;
        // SAFETY: serial 테스트로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_POWERWATCH_BOOL", "false") };
        override_bool(&mut val, "TEST_POWERWATCH_BOOL");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_POWERWATCH_BOOL") };
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_empty_items() {
        let mut val = Vec::new();
        // SAFETY: serial 테스트로 환경변수 조작이 다른 테스트와 겹치지 않습니다.
        unsafe { std::env::set_var("TEST_POWERWATCH_CSV", "apt, ,snapd") };
        override_csv(&mut val, "TEST_POWERWATCH_CSV");
        assert_eq!(val, vec!["apt", "snapd"]);
        unsafe { std::env::remove_var("TEST_POWERWATCH_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_POWERWATCH_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = PowerwatchConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = PowerwatchConfig::parse(&toml_str).unwrap();
        assert_eq!(config.detector.boot_marker, parsed.detector.boot_marker);
        assert_eq!(
            config.scenario.stop_timeout_secs,
            parsed.scenario.stop_timeout_secs
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = PowerwatchConfig::from_file("/nonexistent/path/powerwatch.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PowerwatchError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    #[serial]
    async fn load_or_default_falls_back_when_missing() {
        let config = PowerwatchConfig::load_or_default("/nonexistent/path/powerwatch.toml")
            .await
            .unwrap();
        assert_eq!(config.detector.max_wait_secs, 600);
    }
}
