//! 시나리오 에러 타입
//!
//! [`ScenarioError`]는 시나리오 실행 중 발생하는 에러를 표현합니다.
//! 관측 엔진 에러는 그대로 감싸며, `From<ScenarioError> for PowerwatchError`로
//! 상위 레이어에 전파됩니다.

use powerwatch_core::error::{ConfigError, InstanceError, PowerwatchError};
use powerwatch_observer::ObserverError;

/// 시나리오 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// 관측 엔진 에러 (감지 타임아웃, 프로브 타임아웃 등)
    #[error(transparent)]
    Observer(#[from] ObserverError),

    /// Docker API 호출 실패
    #[error("docker error: {0}")]
    Docker(String),

    /// 인스턴스 수명주기 조작 실패
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// 부팅 로그에 경고/에러 라인이 존재
    #[error("unclean boot: {0}")]
    CleanBoot(String),

    /// user-data 렌더링 실패
    #[error("failed to render user-data: {0}")]
    Render(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<ScenarioError> for PowerwatchError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::Observer(e) => e.into(),
            ScenarioError::Docker(msg) => PowerwatchError::Instance(InstanceError::Unreachable(msg)),
            ScenarioError::Lifecycle(msg) => {
                PowerwatchError::Instance(InstanceError::Lifecycle(msg))
            }
            ScenarioError::CleanBoot(msg) => {
                PowerwatchError::Instance(InstanceError::UncleanBoot(msg))
            }
            ScenarioError::Render(reason) => {
                PowerwatchError::Config(ConfigError::InvalidValue {
                    field: "power_state".to_owned(),
                    reason,
                })
            }
            ScenarioError::Config { field, reason } => {
                PowerwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
