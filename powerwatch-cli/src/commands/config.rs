//! `powerwatch config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use powerwatch_core::config::PowerwatchConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Section names accepted by `config show --section`.
const SECTIONS: [&str; 3] = ["general", "detector", "scenario"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the configuration file, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing, unparsable or invalid.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match PowerwatchConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Display the effective configuration (file, env overrides and defaults).
///
/// A missing file shows the defaults.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = PowerwatchConfig::load_or_default(config_path).await?;
    let report = ConfigReport::build(config_path, &config, section)?;
    writer.render(&report)
}

/// Configuration display report.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Structured configuration for JSON output
    pub config: serde_json::Value,
    /// TOML rendering for text output
    #[serde(skip)]
    pub config_toml: String,
}

impl ConfigReport {
    /// Build a report for the whole config or one section.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Command` for an unknown section name.
    pub fn build(
        config_path: &Path,
        config: &PowerwatchConfig,
        section: Option<String>,
    ) -> Result<Self, CliError> {
        let (config_toml, value) = match section.as_deref() {
            None => section_parts(config)?,
            Some("general") => section_parts(&config.general)?,
            Some("detector") => section_parts(&config.detector)?,
            Some("scenario") => section_parts(&config.scenario)?,
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown section: {other} (expected: {})",
                    SECTIONS.join(", ")
                )));
            }
        };

        Ok(Self {
            source: config_path.display().to_string(),
            section,
            config: value,
            config_toml,
        })
    }
}

fn section_parts<T: Serialize>(section: &T) -> Result<(String, serde_json::Value), CliError> {
    let config_toml = toml::to_string_pretty(section)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
    let value = serde_json::to_value(section)?;
    Ok((config_toml, value))
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Debug, Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Empty if valid
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &impl Render) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_full_report_contains_every_section() {
        let config = PowerwatchConfig::default();
        let report = ConfigReport::build(Path::new("powerwatch.toml"), &config, None)
            .expect("full report should build");

        assert!(report.section.is_none());
        for section in SECTIONS {
            assert!(
                report.config_toml.contains(&format!("[{section}]")),
                "toml should contain [{section}]"
            );
            assert!(report.config.get(section).is_some(), "json should contain {section}");
        }
    }

    #[test]
    fn test_section_report_only_contains_that_section() {
        let config = PowerwatchConfig::default();
        let report = ConfigReport::build(
            Path::new("powerwatch.toml"),
            &config,
            Some("detector".to_owned()),
        )
        .expect("detector section should build");

        assert!(report.config_toml.contains("boot_marker"));
        assert!(!report.config_toml.contains("docker_socket"));
        assert_eq!(report.config["max_wait_secs"], 600);

        let output = render(&report);
        assert!(output.contains("Configuration [detector] (source: powerwatch.toml)"));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let config = PowerwatchConfig::default();
        let err = ConfigReport::build(Path::new("p.toml"), &config, Some("ebpf".to_owned()))
            .expect_err("unknown section should fail");
        assert!(err.to_string().contains("unknown section: ebpf"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_report_json_skips_toml_text() {
        let config = PowerwatchConfig::default();
        let report = ConfigReport::build(Path::new("p.toml"), &config, Some("general".to_owned()))
            .expect("general section should build");
        let json = serde_json::to_value(&report).expect("serialize");
        assert!(json.get("config_toml").is_none());
        assert_eq!(json["section"], "general");
        assert_eq!(json["config"]["log_level"], "info");
    }

    #[test]
    fn test_validation_report_render_valid() {
        let report = ConfigValidationReport {
            source: "/etc/powerwatch.toml".to_owned(),
            valid: true,
            errors: Vec::new(),
        };
        let output = render(&report);
        assert!(output.contains("Config Validation: /etc/powerwatch.toml"));
        assert!(output.contains("VALID"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn test_validation_report_render_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["detector.poll_interval_ms must be greater than 0".to_owned()],
        };
        let output = render(&report);
        assert!(output.contains("INVALID"));
        assert!(output.contains("Error: detector.poll_interval_ms"));
    }

    #[tokio::test]
    async fn test_validate_missing_file_is_config_error() {
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute_validate(Path::new("/nonexistent/powerwatch.toml"), &writer)
            .await
            .expect_err("missing file should be invalid");
        assert_eq!(err.exit_code(), 2);
    }
}
