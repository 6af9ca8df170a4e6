//! `powerwatch verify` command handler
//!
//! Checks a captured log file offline: ordered markers, boot count and,
//! optionally, clean boot.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_core::types::{BootCycleCount, LogText, VerificationOutcome};
use powerwatch_observer::{Marker, OrderedMarkerVerifier};
use powerwatch_scenario::{CleanBootChecker, CleanBootReport, ScenarioCase, false_condition_case};

use crate::cli::{MatchMode, VerifyArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `verify` command.
///
/// # Errors
///
/// Returns `CliError::VerificationFailed` when a marker is missing and a
/// clean-boot error when `--clean-boot` finds issue lines.
pub async fn execute(
    args: VerifyArgs,
    config: &PowerwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %args.log_file.display(), "verifying captured log");

    let bytes = tokio::fs::read(&args.log_file).await?;
    let log = LogText::from_bytes_lossy(&bytes);
    let markers = resolve_markers(&args, &config.detector.boot_marker)?;

    let checker = args
        .clean_boot
        .then(|| CleanBootChecker::new(config.scenario.clean_boot_ignore.clone()));

    let report = VerifyReport::build(
        args.log_file.display().to_string(),
        &log,
        markers,
        &config.detector.boot_marker,
        checker.as_ref(),
    )?;
    writer.render(&report)?;

    if let VerificationOutcome::Failure { reason, .. } = &report.outcome {
        return Err(CliError::VerificationFailed(reason.clone()));
    }
    if let Some(checker) = checker {
        checker.ensure_clean(&log)?;
    }
    Ok(())
}

/// Resolve the marker list from `--mode`, `--false-condition` or `--marker`.
fn resolve_markers(args: &VerifyArgs, boot_marker: &str) -> Result<Vec<Marker>, CliError> {
    if let Some(mode) = args.mode {
        return Ok(ScenarioCase::standard(mode).expected_markers(boot_marker));
    }
    if args.false_condition {
        return Ok(false_condition_case().expected_markers(boot_marker));
    }
    if args.markers.is_empty() {
        return Err(CliError::Command(
            "one of --mode, --false-condition or --marker is required".to_owned(),
        ));
    }

    let build: fn(String) -> Marker = match args.match_mode {
        MatchMode::Literal => Marker::literal,
        MatchMode::Pattern => Marker::pattern,
        MatchMode::Auto => Marker::auto,
    };
    Ok(args.markers.iter().cloned().map(build).collect())
}

/// Result of checking one log file.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub source: String,
    pub log_bytes: usize,
    pub boot_count: usize,
    pub markers: Vec<Marker>,
    /// Byte offset of each matched marker (empty on failure)
    pub positions: Vec<usize>,
    pub outcome: VerificationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_boot: Option<CleanBootReport>,
}

impl VerifyReport {
    /// Check `log` against `markers`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern marker does not compile.
    pub fn build(
        source: String,
        log: &LogText,
        markers: Vec<Marker>,
        boot_marker: &str,
        checker: Option<&CleanBootChecker>,
    ) -> Result<Self, CliError> {
        let verifier = OrderedMarkerVerifier::new(markers)?;
        let boot_count = BootCycleCount::count(log, boot_marker).get();

        let (outcome, positions) = match verifier.verify(log) {
            Ok(matches) => (VerificationOutcome::Success, matches.positions),
            Err(_) => (verifier.outcome(log, boot_count), Vec::new()),
        };

        Ok(Self {
            source,
            log_bytes: log.len(),
            boot_count,
            markers: verifier.markers().to_vec(),
            positions,
            outcome,
            clean_boot: checker.map(|c| c.check(log)),
        })
    }

    fn failed_index(&self) -> Option<usize> {
        match &self.outcome {
            VerificationOutcome::Failure {
                failed_marker_index,
                ..
            } => *failed_marker_index,
            VerificationOutcome::Success => None,
        }
    }
}

impl Render for VerifyReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Log: {} ({} bytes, boot count {})",
            self.source.bold(),
            self.log_bytes,
            self.boot_count
        )?;

        let failed = self.failed_index();
        for (idx, marker) in self.markers.iter().enumerate() {
            let kind = if marker.is_literal() { "literal" } else { "pattern" };
            let status = match (self.positions.get(idx), failed) {
                (Some(pos), _) => format!("{} @{pos}", "found".green()),
                (None, Some(f)) if f == idx => "missing".red().bold().to_string(),
                (None, Some(f)) if idx > f => "not checked".dimmed().to_string(),
                _ => "-".to_owned(),
            };
            writeln!(w, "  [{idx}] {kind:<7} {:?}  {status}", marker.as_str())?;
        }

        match &self.outcome {
            VerificationOutcome::Success => {
                writeln!(w, "  Result: {}", "PASS".green().bold())?;
            }
            VerificationOutcome::Failure { reason, .. } => {
                writeln!(w, "  Result: {} ({reason})", "FAIL".red().bold())?;
            }
        }

        if let Some(ref clean) = self.clean_boot {
            if clean.is_clean() {
                writeln!(w, "  Clean boot: {}", "yes".green())?;
            } else {
                writeln!(
                    w,
                    "  Clean boot: {} ({} issue line(s))",
                    "no".red().bold(),
                    clean.issues.len()
                )?;
                for line in &clean.issues {
                    writeln!(w, "    {}", line.yellow())?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerwatch_scenario::PowerMode;
    use std::path::PathBuf;

    const BOOT_MARKER: &str = "running 'init-local'";

    const REBOOT_LOG: &str = "\
main.py[DEBUG]: Cloud-init v. 23.1 running 'init-local'
stages.py[DEBUG]: Running module power_state_change
cc_power_state_change.py[DEBUG]: will execute: shutdown -r now msg
main.py[DEBUG]: Cloud-init v. 23.1 running 'init-local'
helpers.py[DEBUG]: config-power_state_change already ran
";

    fn args(mode: Option<PowerMode>, markers: &[&str], match_mode: MatchMode) -> VerifyArgs {
        VerifyArgs {
            log_file: PathBuf::from("cloud-init.log"),
            mode,
            false_condition: false,
            markers: markers.iter().map(|s| (*s).to_owned()).collect(),
            match_mode,
            clean_boot: false,
        }
    }

    fn render(report: &VerifyReport) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_resolve_markers_from_mode() {
        let markers = resolve_markers(&args(Some(PowerMode::Reboot), &[], MatchMode::Literal), BOOT_MARKER)
            .expect("mode markers");
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[2], Marker::literal(BOOT_MARKER));
    }

    #[test]
    fn test_resolve_markers_false_condition() {
        let mut a = args(None, &[], MatchMode::Literal);
        a.false_condition = true;
        let markers = resolve_markers(&a, BOOT_MARKER).expect("false-condition markers");
        assert_eq!(markers.len(), 1);
        assert!(markers[0].as_str().contains("Condition was false"));
    }

    #[test]
    fn test_resolve_markers_match_modes() {
        let literal = resolve_markers(&args(None, &["a+b"], MatchMode::Literal), BOOT_MARKER)
            .expect("literal");
        assert_eq!(literal, vec![Marker::literal("a+b")]);

        let pattern = resolve_markers(&args(None, &["a+b"], MatchMode::Pattern), BOOT_MARKER)
            .expect("pattern");
        assert_eq!(pattern, vec![Marker::pattern("a+b")]);

        let auto = resolve_markers(&args(None, &["(unclosed"], MatchMode::Auto), BOOT_MARKER)
            .expect("auto");
        assert!(auto[0].is_literal(), "uncompilable text falls back to literal");
    }

    #[test]
    fn test_resolve_markers_requires_a_source() {
        let err = resolve_markers(&args(None, &[], MatchMode::Literal), BOOT_MARKER)
            .expect_err("no markers given");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_report_success_with_positions() {
        let log = LogText::from(REBOOT_LOG);
        let markers = ScenarioCase::standard(PowerMode::Reboot).expected_markers(BOOT_MARKER);
        let report = VerifyReport::build("r.log".to_owned(), &log, markers, BOOT_MARKER, None)
            .expect("report");

        assert!(report.outcome.is_success());
        assert_eq!(report.boot_count, 2);
        assert_eq!(report.positions.len(), 4);
        assert!(report.positions.windows(2).all(|p| p[0] < p[1]));

        let output = render(&report);
        assert!(output.contains("boot count 2"));
        assert!(output.contains("PASS"));
    }

    #[test]
    fn test_report_failure_marks_missing_and_unchecked() {
        let log = LogText::from(REBOOT_LOG);
        let markers = ScenarioCase::standard(PowerMode::Halt).expected_markers(BOOT_MARKER);
        let report = VerifyReport::build("h.log".to_owned(), &log, markers, BOOT_MARKER, None)
            .expect("report");

        assert_eq!(report.failed_index(), Some(1));
        assert!(report.positions.is_empty());

        let output = render(&report);
        assert!(output.contains("missing"));
        assert!(output.contains("not checked"));
        assert!(output.contains("FAIL"));
    }

    #[test]
    fn test_report_invalid_pattern_is_error() {
        let log = LogText::from("x");
        let err = VerifyReport::build(
            "x.log".to_owned(),
            &log,
            vec![Marker::pattern("(")],
            BOOT_MARKER,
            None,
        )
        .expect_err("invalid pattern");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_report_clean_boot_section() {
        let log = LogText::from(format!("{REBOOT_LOG}util.py[WARNING]: datasource missing\n"));
        let checker = CleanBootChecker::default();
        let report = VerifyReport::build(
            "r.log".to_owned(),
            &log,
            Vec::<Marker>::new(),
            BOOT_MARKER,
            Some(&checker),
        )
        .expect("report");

        let clean = report.clean_boot.as_ref().expect("clean boot requested");
        assert_eq!(clean.issues.len(), 1);
        assert!(render(&report).contains("1 issue line(s)"));
    }

    #[test]
    fn test_report_json_shape() {
        let log = LogText::from(REBOOT_LOG);
        let report = VerifyReport::build(
            "r.log".to_owned(),
            &log,
            vec![Marker::literal("no such line")],
            BOOT_MARKER,
            None,
        )
        .expect("report");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["outcome"]["outcome"], "failure");
        assert_eq!(json["outcome"]["failed_marker_index"], 0);
        assert_eq!(json["outcome"]["last_known_boot_count"], 2);
        assert_eq!(json["markers"][0]["literal"], "no such line");
        assert!(json.get("clean_boot").is_none());
    }
}
