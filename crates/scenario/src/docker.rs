//! Docker 기반 인스턴스 어댑터
//!
//! [`DockerInstance`]는 이미 실행된 컨테이너를 관측 대상 인스턴스로 사용합니다.
//!
//! - reachability: 컨테이너가 running 상태이고 `exec true`가 0으로 종료
//! - 파일 읽기: `exec cat <path>`의 stdout 수집
//! - 시작: `start_container`
//!
//! ```text
//! ┌────────────────┐
//! │ ScenarioRunner │
//! └───────┬────────┘
//!         │ Instance + Lifecycle
//!         ▼
//!  ┌──────────────┐   exec / inspect / start
//!  │DockerInstance│ ─────────────────────────▶ Docker Daemon
//!  └──────────────┘
//! ```
//!
//! # Container Reference Validation
//!
//! 컨테이너 참조는 Docker API 호출 전에 검증됩니다.
//! - 1-64자 hex ID, 또는
//! - `[a-zA-Z0-9][a-zA-Z0-9_.-]*` 형식의 컨테이너 이름 (최대 128자)

use std::sync::Arc;
use std::time::Duration;

use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use futures_util::StreamExt;
use tracing::{debug, info};

use powerwatch_core::config::DEFAULT_DOCKER_SOCKET;
use powerwatch_core::types::LogText;
use powerwatch_observer::{Instance, ObserverError};

use crate::error::ScenarioError;
use crate::lifecycle::Lifecycle;

/// 단일 exec 호출 대기 한도
const EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// 컨테이너 이름 최대 길이
const MAX_NAME_LEN: usize = 128;

/// 컨테이너 참조(ID 또는 이름)를 검증합니다.
fn validate_container_ref(reference: &str) -> Result<(), ScenarioError> {
    if reference.is_empty() {
        return Err(ScenarioError::Docker(
            "invalid container reference: empty".to_owned(),
        ));
    }

    let is_hex_id = reference.len() <= 64 && reference.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex_id {
        return Ok(());
    }

    let mut chars = reference.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok || reference.len() > MAX_NAME_LEN {
        return Err(ScenarioError::Docker(format!(
            "invalid container reference: '{reference}'"
        )));
    }
    Ok(())
}

/// 소켓 경로가 비어 있거나 기본값이면 로컬 기본 연결을 사용합니다.
fn uses_local_defaults(socket_path: &str) -> bool {
    socket_path.is_empty() || socket_path == DEFAULT_DOCKER_SOCKET
}

/// exec 실행 결과
struct ExecOutput {
    exit_code: Option<i64>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Docker 컨테이너를 관측 대상 인스턴스로 감싼 어댑터
pub struct DockerInstance {
    docker: Arc<bollard::Docker>,
    container: String,
}

impl DockerInstance {
    /// 기본 로컬 소켓으로 Docker에 연결합니다.
    ///
    /// # Errors
    ///
    /// 컨테이너 참조가 유효하지 않거나 연결이 실패하면 `ScenarioError::Docker`를 반환합니다.
    pub fn connect_local(container: &str) -> Result<Self, ScenarioError> {
        validate_container_ref(container)?;
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|e| ScenarioError::Docker(format!("failed to connect to docker: {e}")))?;
        Ok(Self {
            docker: Arc::new(docker),
            container: container.to_owned(),
        })
    }

    /// 지정한 소켓 경로로 Docker에 연결합니다.
    ///
    /// # Errors
    ///
    /// 컨테이너 참조가 유효하지 않거나 연결이 실패하면 `ScenarioError::Docker`를 반환합니다.
    pub fn connect_with_socket(socket_path: &str, container: &str) -> Result<Self, ScenarioError> {
        validate_container_ref(container)?;
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    ScenarioError::Docker(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self {
            docker: Arc::new(docker),
            container: container.to_owned(),
        })
    }

    /// 설정된 소켓 경로로 Docker에 연결합니다.
    ///
    /// 기본 소켓 경로면 `DOCKER_HOST`를 따르는 로컬 기본값으로 연결하고,
    /// 그 외에는 지정한 소켓을 사용합니다.
    ///
    /// # Errors
    ///
    /// 컨테이너 참조가 유효하지 않거나 연결이 실패하면 `ScenarioError::Docker`를 반환합니다.
    pub fn connect(socket_path: &str, container: &str) -> Result<Self, ScenarioError> {
        if uses_local_defaults(socket_path) {
            Self::connect_local(container)
        } else {
            Self::connect_with_socket(socket_path, container)
        }
    }

    /// 대상 컨테이너 참조
    pub fn container(&self) -> &str {
        &self.container
    }

    /// 컨테이너가 running 상태인지 확인합니다.
    async fn is_running(&self) -> Result<bool, ScenarioError> {
        let details = self
            .docker
            .inspect_container(&self.container, None)
            .await
            .map_err(|e| ScenarioError::Docker(format!("inspect container failed: {e}")))?;
        Ok(details.state.and_then(|s| s.running).unwrap_or(false))
    }

    /// 컨테이너 안에서 명령을 실행하고 출력을 수집합니다.
    async fn exec(&self, cmd: Vec<&str>) -> Result<ExecOutput, ScenarioError> {
        let created = self
            .docker
            .create_exec(
                &self.container,
                CreateExecOptions {
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    cmd: Some(cmd),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ScenarioError::Docker(format!("create exec failed: {e}")))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let StartExecResults::Attached { mut output, .. } = self
            .docker
            .start_exec(&created.id, None)
            .await
            .map_err(|e| ScenarioError::Docker(format!("start exec failed: {e}")))?
        {
            while let Some(chunk) = output.next().await {
                match chunk.map_err(|e| ScenarioError::Docker(format!("exec stream failed: {e}")))? {
                    LogOutput::StdOut { message } | LogOutput::Console { message } => {
                        stdout.extend_from_slice(&message);
                    }
                    LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                    LogOutput::StdIn { .. } => {}
                }
            }
        }

        let inspected = self
            .docker
            .inspect_exec(&created.id)
            .await
            .map_err(|e| ScenarioError::Docker(format!("inspect exec failed: {e}")))?;

        Ok(ExecOutput {
            exit_code: inspected.exit_code,
            stdout,
            stderr,
        })
    }

    /// exec 호출을 [`EXEC_TIMEOUT`]으로 제한합니다.
    async fn exec_bounded(&self, cmd: Vec<&str>) -> Result<ExecOutput, ScenarioError> {
        tokio::time::timeout(EXEC_TIMEOUT, self.exec(cmd))
            .await
            .map_err(|_elapsed| {
                ScenarioError::Docker(format!(
                    "exec timed out after {} seconds",
                    EXEC_TIMEOUT.as_secs()
                ))
            })?
    }
}

impl Instance for DockerInstance {
    async fn is_reachable(&self) -> bool {
        match self.is_running().await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                debug!(container = %self.container, error = %e, "reachability check failed");
                return false;
            }
        }

        match self.exec_bounded(vec!["true"]).await {
            Ok(out) => out.exit_code == Some(0),
            Err(e) => {
                debug!(container = %self.container, error = %e, "exec probe failed");
                false
            }
        }
    }

    async fn read_file(&self, path: &str) -> Result<LogText, ObserverError> {
        let out = self
            .exec_bounded(vec!["cat", path])
            .await
            .map_err(|e| ObserverError::TransientIo(e.to_string()))?;

        if out.exit_code != Some(0) {
            return Err(ObserverError::TransientIo(format!(
                "cat {path} exited with {:?}: {}",
                out.exit_code,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        Ok(LogText::from_bytes_lossy(&out.stdout))
    }
}

impl Lifecycle for DockerInstance {
    async fn start(&self) -> Result<(), ScenarioError> {
        info!(container = %self.container, "starting container");
        self.docker
            .start_container::<String>(&self.container, None)
            .await
            .map_err(|e| ScenarioError::Lifecycle(format!("start container failed: {e}")))
    }
}
