//! CLI-specific error types and exit code mapping

use powerwatch_core::error::{InstanceError, ObservationError, PowerwatchError};
use powerwatch_observer::ObserverError;
use powerwatch_scenario::ScenarioError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to the process exit status so that
/// scripts can tell a failed check from a broken setup.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The log did not satisfy the expected markers.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from powerwatch-core.
    #[error("{0}")]
    Core(#[from] PowerwatchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | General / command error                   |
    /// | 2    | Configuration error                       |
    /// | 3    | Instance unreachable or lifecycle failure |
    /// | 4    | Verification failed (markers, clean boot) |
    /// | 5    | No second boot within the budget          |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::VerificationFailed(_) => 4,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                PowerwatchError::Config(_) => 2,
                PowerwatchError::Instance(InstanceError::UncleanBoot(_)) => 4,
                PowerwatchError::Instance(_) => 3,
                PowerwatchError::Verification(_) => 4,
                PowerwatchError::Observation(ObservationError::DetectionTimeout { .. }) => 5,
                PowerwatchError::Observation(_) => 1,
                PowerwatchError::Io(_) => 10,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ObserverError> for CliError {
    fn from(e: ObserverError) -> Self {
        Self::Core(e.into())
    }
}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        Self::Core(e.into())
    }
}
