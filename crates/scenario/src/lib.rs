#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`ScenarioError`)
//! - [`config`]: 시나리오 설정 (`ScenarioConfig`, 빌더)
//! - [`power_state`]: 전원 상태 설정과 user-data 렌더링
//! - [`case`]: 표준 케이스와 기대 마커
//! - [`clean_boot`]: 클린 부팅 검사
//! - [`lifecycle`]: 인스턴스 수명주기 (`Lifecycle` trait)
//! - [`docker`]: Docker 인스턴스 어댑터 (`DockerInstance`)
//! - [`runner`]: 시나리오 러너 (`ScenarioRunner`, `ScenarioReport`)

pub mod case;
pub mod clean_boot;
pub mod config;
pub mod docker;
pub mod error;
pub mod lifecycle;
pub mod power_state;
pub mod runner;

// --- Public API Re-exports ---

pub use case::{ScenarioCase, false_condition_case, standard_cases};
pub use clean_boot::{CleanBootChecker, CleanBootReport};
pub use config::{ScenarioConfig, ScenarioConfigBuilder};
pub use docker::DockerInstance;
pub use error::ScenarioError;
pub use lifecycle::Lifecycle;
pub use power_state::{Condition, PowerMode, PowerStateConfig};
pub use runner::{ScenarioReport, ScenarioRunner};
