//! `powerwatch run` command handler

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_core::types::VerificationOutcome;
use powerwatch_scenario::{
    DockerInstance, ScenarioCase, ScenarioConfig, ScenarioReport, ScenarioRunner,
    false_condition_case,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command against an already provisioned container.
///
/// # Errors
///
/// Transition failures (timeouts, start failures) are returned as errors.
/// A report with a failure outcome maps to `CliError::VerificationFailed`.
pub async fn execute(
    args: RunArgs,
    config: &PowerwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scenario_config = ScenarioConfig::from_core(config);
    let machine = Arc::new(DockerInstance::connect(
        &scenario_config.docker_socket,
        &args.container,
    )?);
    let runner = ScenarioRunner::new(machine, scenario_config)?;

    let case = select_case(&args);
    info!(container = %args.container, case = %case.name, "running scenario");

    let report = if case.expects_no_transition() {
        runner.run_false_condition(&case).await?
    } else {
        runner.run(&case).await?
    };
    writer.render(&report)?;

    match report.outcome {
        VerificationOutcome::Success => Ok(()),
        VerificationOutcome::Failure { reason, .. } => Err(CliError::VerificationFailed(reason)),
    }
}

fn select_case(args: &RunArgs) -> ScenarioCase {
    if args.false_condition {
        false_condition_case()
    } else {
        ScenarioCase::standard(args.mode)
    }
}

impl Render for ScenarioReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scenario: {} (mode: {})", self.case.bold(), self.mode)?;
        writeln!(w, "  Boot count: {}", self.boot_count)?;
        writeln!(w, "  Elapsed:    {:.1}s", self.elapsed_secs)?;

        match &self.outcome {
            VerificationOutcome::Success => {
                writeln!(w, "  Result:     {}", "PASS".green().bold())?;
            }
            VerificationOutcome::Failure {
                failed_marker_index,
                reason,
                ..
            } => {
                writeln!(w, "  Result:     {}", "FAIL".red().bold())?;
                if let Some(idx) = failed_marker_index {
                    writeln!(w, "  Marker:     #{idx}")?;
                }
                writeln!(w, "  Reason:     {}", reason.red())?;
            }
        }

        if !self.clean_boot_issues.is_empty() {
            writeln!(w, "  Clean boot issues:")?;
            for line in &self.clean_boot_issues {
                writeln!(w, "    {}", line.yellow())?;
            }
        }
        Ok(())
    }
}
