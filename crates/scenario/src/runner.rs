//! 시나리오 러너
//!
//! [`ScenarioRunner`]는 케이스 하나를 다음 순서로 실행합니다.
//!
//! 1. 전이 관측
//!    - reboot: [`RebootDetector::detect`]로 두 번째 부팅 대기
//!    - poweroff/halt: 정지 대기 → [`Lifecycle::start`] → 응답 대기
//! 2. 로그 캡처
//! 3. 캡처 후 인스턴스 응답 확인
//! 4. 클린 부팅 검사 (설정 시)
//! 5. 기대 마커 순서 검증
//!
//! 1-2단계의 실패(예산 소진, 시작 실패 등)는 에러로 반환되고,
//! 3-5단계의 실패는 `Failure` 결과를 담은 [`ScenarioReport`]로 보고됩니다.

use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use powerwatch_core::metrics as m;
use powerwatch_core::types::{BootCycleCount, LogText, VerificationOutcome};
use powerwatch_observer::{Instance, OrderedMarkerVerifier, RebootDetector};

use crate::case::ScenarioCase;
use crate::clean_boot::CleanBootChecker;
use crate::config::ScenarioConfig;
use crate::error::ScenarioError;
use crate::lifecycle::Lifecycle;
use crate::power_state::PowerMode;

/// 시나리오 실행 보고서
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// 케이스 이름
    pub case: String,
    /// 전이 모드
    pub mode: PowerMode,
    /// 최종 판정
    pub outcome: VerificationOutcome,
    /// 캡처한 로그의 부팅 횟수
    pub boot_count: usize,
    /// 소요 시간 (초)
    pub elapsed_secs: f64,
    /// 클린 부팅 검사에서 발견된 라인
    pub clean_boot_issues: Vec<String>,
}

/// 시나리오 러너
pub struct ScenarioRunner<M: Instance + Lifecycle> {
    machine: Arc<M>,
    config: ScenarioConfig,
    detector: RebootDetector<M>,
    clean_boot: CleanBootChecker,
}

impl<M: Instance + Lifecycle> ScenarioRunner<M> {
    /// 새 러너를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정이 유효하지 않으면 에러를 반환합니다.
    pub fn new(machine: Arc<M>, config: ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        let detector = RebootDetector::new(Arc::clone(&machine), config.detector.clone())?;
        let clean_boot = CleanBootChecker::new(config.clean_boot_ignore.clone());
        Ok(Self {
            machine,
            config,
            detector,
            clean_boot,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// 표준 케이스를 실행합니다.
    ///
    /// # Errors
    ///
    /// 전이 관측 단계(감지 타임아웃, 정지/시작 실패)나 로그 캡처가 실패하면 에러를 반환합니다.
    pub async fn run(&self, case: &ScenarioCase) -> Result<ScenarioReport, ScenarioError> {
        let started = Instant::now();
        let mode = case.mode();
        info!(case = %case.name, mode = %mode, "scenario started");

        let result = self.run_inner(case, started).await;
        record_run(mode, &result);
        result
    }

    /// 조건이 거짓인 케이스를 실행합니다. 전이가 일어나지 않아야 합니다.
    ///
    /// # Errors
    ///
    /// 로그 캡처가 실패하면 에러를 반환합니다.
    pub async fn run_false_condition(
        &self,
        case: &ScenarioCase,
    ) -> Result<ScenarioReport, ScenarioError> {
        let started = Instant::now();
        info!(case = %case.name, "false-condition scenario started");

        let result = async {
            let log = self.capture().await?;
            self.judge(case, &log, false, started).await
        }
        .await;
        record_run(case.mode(), &result);
        result
    }

    async fn run_inner(
        &self,
        case: &ScenarioCase,
        started: Instant,
    ) -> Result<ScenarioReport, ScenarioError> {
        if case.mode().restarts_on_its_own() {
            let report = self.detector.detect().await?;
            info!(
                case = %case.name,
                boot_count = report.boot_count,
                polls = report.polls,
                "reboot observed"
            );
        } else {
            self.detector.wait_for_stop(self.config.stop_timeout()).await?;
            self.machine.start().await?;
            self.machine
                .wait_until_reachable(self.config.start_timeout())
                .await?;
            info!(case = %case.name, "instance restarted");
        }

        let log = self.capture().await?;
        self.judge(case, &log, self.config.clean_boot_check, started)
            .await
    }

    async fn capture(&self) -> Result<LogText, ScenarioError> {
        Ok(self
            .machine
            .read_file(&self.config.detector.log_path)
            .await?)
    }

    /// 캡처한 로그로 최종 판정을 내립니다.
    async fn judge(
        &self,
        case: &ScenarioCase,
        log: &LogText,
        check_clean_boot: bool,
        started: Instant,
    ) -> Result<ScenarioReport, ScenarioError> {
        let boot_marker = &self.config.detector.boot_marker;
        let boot_count = BootCycleCount::count(log, boot_marker).get();

        let clean_boot_issues = if check_clean_boot {
            self.clean_boot.check(log).issues
        } else {
            Vec::new()
        };

        let verifier = OrderedMarkerVerifier::new(case.expected_markers(boot_marker))?;

        let outcome = if !self.machine.is_reachable().await {
            failure(boot_count, "instance not reachable after transition".to_owned())
        } else if !clean_boot_issues.is_empty() {
            failure(
                boot_count,
                format!(
                    "unclean boot: {} issue line(s), first: {}",
                    clean_boot_issues.len(),
                    clean_boot_issues[0]
                ),
            )
        } else {
            verifier.outcome(log, boot_count)
        };

        let report = ScenarioReport {
            case: case.name.clone(),
            mode: case.mode(),
            outcome,
            boot_count,
            elapsed_secs: started.elapsed().as_secs_f64(),
            clean_boot_issues,
        };

        if report.outcome.is_success() {
            info!(case = %report.case, boot_count, "scenario passed");
        } else {
            warn!(case = %report.case, outcome = %report.outcome, "scenario failed");
        }
        Ok(report)
    }
}

fn failure(last_known_boot_count: usize, reason: String) -> VerificationOutcome {
    VerificationOutcome::Failure {
        failed_marker_index: None,
        last_known_boot_count,
        reason,
    }
}

fn record_run(mode: PowerMode, result: &Result<ScenarioReport, ScenarioError>) {
    let label = match result {
        Ok(report) if report.outcome.is_success() => "success",
        Ok(_) => "failure",
        Err(_) => "error",
    };
    metrics::counter!(
        m::SCENARIO_RUNS_TOTAL,
        m::LABEL_MODE => mode.as_str(),
        m::LABEL_RESULT => label
    )
    .increment(1);
}
