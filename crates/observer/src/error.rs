//! 관측 엔진 에러 타입
//!
//! [`ObserverError`]는 재부팅 감지와 마커 검증 중 발생하는 모든 에러를 표현합니다.
//! `From<ObserverError> for PowerwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! `TransientIo`와 `ProbeTimeout`은 감지 루프 안에서 삼켜지며,
//! 호출자에게 전달되는 것은 `DetectionTimeout`, `MarkerNotFound` 등 최종 판정뿐입니다.

use powerwatch_core::error::{
    ConfigError, InstanceError, ObservationError, PowerwatchError, VerificationError,
};

/// 관측 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// 일시적 I/O 실패 (인스턴스 재부팅 중 연결 끊김 등)
    #[error("transient io error: {0}")]
    TransientIo(String),

    /// liveness 프로브 대기 시간 초과
    #[error("probe timed out after {waited_secs} seconds")]
    ProbeTimeout {
        /// 대기한 시간 (초)
        waited_secs: u64,
    },

    /// 예산 내에 두 번째 부팅이 관측되지 않음
    #[error(
        "no second boot observed within {waited_secs} seconds (last boot count: {last_boot_count})"
    )]
    DetectionTimeout {
        /// 소진된 예산 (초)
        waited_secs: u64,
        /// 마지막으로 관측된 부팅 횟수
        last_boot_count: usize,
    },

    /// 이전 매칭 위치 이후에서 마커를 찾지 못함
    #[error(
        "marker #{index} '{marker}' not found after offset {search_from} (searched {searched_len} bytes)"
    )]
    MarkerNotFound {
        /// 실패한 마커의 인덱스
        index: usize,
        /// 실패한 마커 문자열
        marker: String,
        /// 검색 시작 오프셋 (바이트)
        search_from: usize,
        /// 검색한 텍스트 길이 (바이트)
        searched_len: usize,
    },

    /// 마커 패턴 컴파일 실패
    #[error("invalid marker pattern #{index}: {reason}")]
    InvalidPattern {
        /// 문제가 된 마커 인덱스
        index: usize,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 취소 토큰에 의해 관측이 중단됨
    #[error("observation cancelled (last boot count: {last_boot_count})")]
    Cancelled {
        /// 마지막으로 관측된 부팅 횟수
        last_boot_count: usize,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl ObserverError {
    /// 감지 루프 안에서 재시도 가능한 에러인지 확인합니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_) | Self::ProbeTimeout { .. })
    }
}

impl From<ObserverError> for PowerwatchError {
    fn from(err: ObserverError) -> Self {
        match err {
            ObserverError::TransientIo(msg) => {
                PowerwatchError::Instance(InstanceError::Unreachable(msg))
            }
            ObserverError::ProbeTimeout { waited_secs } => {
                PowerwatchError::Observation(ObservationError::ProbeTimeout { waited_secs })
            }
            ObserverError::DetectionTimeout {
                waited_secs,
                last_boot_count,
            } => PowerwatchError::Observation(ObservationError::DetectionTimeout {
                waited_secs,
                last_boot_count,
            }),
            ObserverError::Cancelled { last_boot_count } => {
                PowerwatchError::Observation(ObservationError::Cancelled { last_boot_count })
            }
            ObserverError::MarkerNotFound { index, marker, .. } => {
                PowerwatchError::Verification(VerificationError::MarkerNotFound { index, marker })
            }
            ObserverError::InvalidPattern { index, reason } => {
                PowerwatchError::Verification(VerificationError::InvalidPattern { index, reason })
            }
            ObserverError::Config { field, reason } => {
                PowerwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}
