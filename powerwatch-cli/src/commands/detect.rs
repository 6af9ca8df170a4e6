//! `powerwatch detect` command handler
//!
//! Watches a running container until its log shows a second boot.
//! Ctrl-C cancels the observation.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_observer::{CancellationToken, DetectionReport, DetectorConfig, RebootDetector};
use powerwatch_scenario::DockerInstance;

use crate::cli::DetectArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `detect` command.
///
/// # Errors
///
/// Returns a detection timeout (exit code 5) if no second boot is seen
/// within the budget.
pub async fn execute(
    args: DetectArgs,
    config: &PowerwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let detector_config = detector_config(&args, config);
    info!(
        container = %args.container,
        max_wait_ms = detector_config.max_wait_ms,
        "watching for reboot"
    );

    let instance = Arc::new(DockerInstance::connect(
        &config.scenario.docker_socket,
        &args.container,
    )?);
    let detector = RebootDetector::new(instance, detector_config)?;

    let token = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling detection");
                token.cancel();
            }
        }
    });

    let result = detector.detect_until_cancelled(&token).await;
    ctrl_c.abort();

    let report = DetectReport {
        container: args.container,
        detection: result?,
    };
    writer.render(&report)
}

/// Detector settings from the config file with command-line overrides applied.
fn detector_config(args: &DetectArgs, config: &PowerwatchConfig) -> DetectorConfig {
    let mut detector = DetectorConfig::from_core(&config.detector);
    if let Some(secs) = args.max_wait_secs {
        detector.max_wait_ms = secs.saturating_mul(1000);
    }
    if let Some(ms) = args.poll_interval_ms {
        detector.poll_interval_ms = ms;
    }
    detector
}

/// Successful detection for one container.
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub container: String,
    #[serde(flatten)]
    pub detection: DetectionReport,
}

impl Render for DetectReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{} {} rebooted (boot count {})",
            "✓".green().bold(),
            self.container.bold(),
            self.detection.boot_count
        )?;
        writeln!(w, "  Session:   {}", self.detection.session_id)?;
        writeln!(
            w,
            "  Polls:     {} ({} transient failure(s))",
            self.detection.polls, self.detection.transient_failures
        )?;
        writeln!(
            w,
            "  Elapsed:   {:.1}s",
            self.detection.elapsed_ms as f64 / 1000.0
        )?;
        Ok(())
    }
}
