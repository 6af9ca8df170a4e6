//! 전원 상태 설정 및 user-data 렌더링
//!
//! [`PowerStateConfig`]는 원격 에이전트의 `power_state` 설정을 표현합니다.
//! 기대 마커 중 하나(`will execute: ...` 라인)가 이 설정에서 파생되므로,
//! user-data 렌더링과 기대 라인 계산을 같은 곳에서 수행합니다.
//!
//! # 렌더링 예시
//!
//! ```text
//! #cloud-config
//! power_state:
//!   delay: now
//!   mode: reboot
//!   message: msg
//!   timeout: 0
//!   condition: true
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// user-data 문서 헤더
pub const CLOUD_CONFIG_HEADER: &str = "#cloud-config";

/// 전원 상태 전이 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    Poweroff,
    Reboot,
    Halt,
}

impl PowerMode {
    /// 모든 모드
    pub const ALL: [PowerMode; 3] = [Self::Poweroff, Self::Reboot, Self::Halt];

    /// `shutdown` 명령 플래그
    pub fn shutdown_flag(self) -> &'static str {
        match self {
            Self::Poweroff => "-P",
            Self::Reboot => "-r",
            Self::Halt => "-H",
        }
    }

    /// 메트릭 레이블 등에 쓰이는 고정 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poweroff => "poweroff",
            Self::Reboot => "reboot",
            Self::Halt => "halt",
        }
    }

    /// 전이 후 인스턴스가 스스로 다시 올라오는지 여부
    pub fn restarts_on_its_own(self) -> bool {
        matches!(self, Self::Reboot)
    }
}

impl fmt::Display for PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerMode {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "poweroff" => Ok(Self::Poweroff),
            "reboot" => Ok(Self::Reboot),
            "halt" => Ok(Self::Halt),
            other => Err(ScenarioError::Config {
                field: "mode".to_owned(),
                reason: format!("unknown power mode '{other}' (expected poweroff, reboot, halt)"),
            }),
        }
    }
}

/// 상태 전이 수행 조건
///
/// 불리언 값이거나, 원격에서 실행되어 종료 코드로 판정되는 명령입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Bool(bool),
    Command(String),
}

impl Default for Condition {
    fn default() -> Self {
        Self::Bool(true)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Command(cmd) => f.write_str(cmd),
        }
    }
}

impl FromStr for Condition {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ScenarioError::Config {
                field: "condition".to_owned(),
                reason: "must not be empty".to_owned(),
            }),
            "true" | "True" => Ok(Self::Bool(true)),
            "false" | "False" => Ok(Self::Bool(false)),
            cmd => Ok(Self::Command(cmd.to_owned())),
        }
    }
}

/// `power_state` 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerStateConfig {
    /// 지연: `now`, `+N`(분), 또는 `N`
    pub delay: String,
    /// 전이 모드
    pub mode: PowerMode,
    /// 종료 시 브로드캐스트 메시지
    pub message: String,
    /// 전이 전 프로세스 종료 대기 시간 (초)
    pub timeout: u64,
    /// 전이 수행 조건
    pub condition: Condition,
}

impl PowerStateConfig {
    /// 기본값(`delay: now`, `message: msg`, `timeout: 0`, `condition: true`)으로 생성합니다.
    pub fn new(mode: PowerMode) -> Self {
        Self {
            delay: "now".to_owned(),
            mode,
            message: "msg".to_owned(),
            timeout: 0,
            condition: Condition::default(),
        }
    }

    pub fn with_delay(mut self, delay: impl Into<String>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let digits = self.delay.strip_prefix('+').unwrap_or(&self.delay);
        let delay_ok = self.delay == "now"
            || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
        if !delay_ok {
            return Err(ScenarioError::Config {
                field: "delay".to_owned(),
                reason: format!("'{}' is not 'now', '+N' or 'N'", self.delay),
            });
        }

        if self.message.contains('\n') {
            return Err(ScenarioError::Config {
                field: "message".to_owned(),
                reason: "must be a single line".to_owned(),
            });
        }

        Ok(())
    }

    /// 에이전트가 전이 직전에 기록하는 라인
    pub fn expected_execute_line(&self) -> String {
        format!(
            "will execute: shutdown {} {} {}",
            self.mode.shutdown_flag(),
            self.delay,
            self.message
        )
    }

    /// `#cloud-config` user-data 문서를 렌더링합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않으면 `ScenarioError::Config`,
    /// YAML 직렬화가 실패하면 `ScenarioError::Render`를 반환합니다.
    pub fn render_user_data(&self) -> Result<String, ScenarioError> {
        #[derive(Serialize)]
        struct UserData<'a> {
            power_state: &'a PowerStateConfig,
        }

        self.validate()?;
        let body = serde_yaml::to_string(&UserData { power_state: self })
            .map_err(|e| ScenarioError::Render(e.to_string()))?;
        Ok(format!("{CLOUD_CONFIG_HEADER}\n{body}"))
    }
}
