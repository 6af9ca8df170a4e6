//! 에러 타입 -- 도메인별 에러 정의
//!
//! 각 크레이트는 자체 도메인 에러(`ObserverError`, `ScenarioError`)를 가지며,
//! `From` 변환을 통해 [`PowerwatchError`]로 전파됩니다.

/// Powerwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PowerwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 상태 전이 관측 에러 (재부팅 감지, 프로브)
    #[error("observation error: {0}")]
    Observation(#[from] ObservationError),

    /// 마커 순서 검증 에러
    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    /// 인스턴스 제어/접근 에러
    #[error("instance error: {0}")]
    Instance(#[from] InstanceError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 상태 전이 관측 에러
#[derive(Debug, thiserror::Error)]
pub enum ObservationError {
    /// 예산 내에 두 번째 부팅이 관측되지 않음
    #[error("no second boot observed within {waited_secs} seconds (last boot count: {last_boot_count})")]
    DetectionTimeout {
        waited_secs: u64,
        last_boot_count: usize,
    },

    /// 프로브 대기 시간 초과
    #[error("probe timed out after {waited_secs} seconds")]
    ProbeTimeout { waited_secs: u64 },

    /// 관측 세션 취소
    #[error("observation cancelled (last boot count: {last_boot_count})")]
    Cancelled { last_boot_count: usize },
}

/// 마커 순서 검증 에러
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// 이전 매칭 위치 이후에서 마커를 찾지 못함
    #[error("marker #{index} '{marker}' not found")]
    MarkerNotFound { index: usize, marker: String },

    /// 마커 패턴 컴파일 실패
    #[error("invalid marker pattern #{index}: {reason}")]
    InvalidPattern { index: usize, reason: String },

    /// 로그에 기대한 라인이 없음
    #[error("expected log line missing: {0}")]
    MissingLine(String),
}

/// 인스턴스 제어/접근 에러
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// 인스턴스에 연결할 수 없음
    #[error("instance unreachable: {0}")]
    Unreachable(String),

    /// 수명주기 제어 실패 (start 등)
    #[error("lifecycle action failed: {0}")]
    Lifecycle(String),

    /// 클린 부팅 검사 실패
    #[error("unclean boot: {0}")]
    UncleanBoot(String),
}
