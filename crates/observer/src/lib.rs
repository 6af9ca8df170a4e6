#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`ObserverError`)
//! - [`config`]: 감지기 설정 (`DetectorConfig`, 빌더)
//! - [`instance`]: 원격 인스턴스 추상화 (`Instance` trait)
//! - [`probe`]: 데드라인 계산 및 reachability 폴링
//! - [`session`]: 감지 호출 1회의 상태 (`ObservationSession`, `DetectionReport`)
//! - [`detector`]: 재부팅 감지기 (`RebootDetector`)
//! - [`marker`]: 로그 마커 (`Marker`)
//! - [`verifier`]: 순서 마커 검증기 (`OrderedMarkerVerifier`)

pub mod config;
pub mod detector;
pub mod error;
pub mod instance;
pub mod marker;
pub mod probe;
pub mod session;
pub mod verifier;

// --- Public API Re-exports ---

pub use config::{DetectorConfig, DetectorConfigBuilder};
pub use detector::RebootDetector;
pub use error::ObserverError;
pub use instance::Instance;
pub use marker::Marker;
pub use session::{DetectionReport, ObservationSession};
pub use verifier::{MarkerMatches, OrderedMarkerVerifier};

// 취소 토큰은 `detect_until_cancelled` 호출자가 그대로 사용할 수 있도록 노출합니다.
pub use tokio_util::sync::CancellationToken;
