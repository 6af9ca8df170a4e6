//! `powerwatch user-data` command handler
//!
//! Prints the `#cloud-config` document that provisions a power-state
//! transition, along with the markers a successful run leaves in the log.

use std::io::Write;

use serde::Serialize;

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_scenario::{PowerStateConfig, ScenarioCase};

use crate::cli::UserDataArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

pub fn execute(
    args: UserDataArgs,
    config: &PowerwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = UserDataReport::build(power_state(args), &config.detector.boot_marker)?;
    writer.render(&report)
}

fn power_state(args: UserDataArgs) -> PowerStateConfig {
    let mut power_state = ScenarioCase::standard(args.mode).power_state;
    if let Some(delay) = args.delay {
        power_state = power_state.with_delay(delay);
    }
    if let Some(timeout) = args.timeout {
        power_state = power_state.with_timeout(timeout);
    }
    if let Some(condition) = args.condition {
        power_state = power_state.with_condition(condition);
    }
    if let Some(message) = args.message {
        power_state = power_state.with_message(message);
    }
    power_state
}

#[derive(Debug, Serialize)]
pub struct UserDataReport {
    pub power_state: PowerStateConfig,
    pub user_data: String,
    pub expected_markers: Vec<String>,
}

impl UserDataReport {
    /// # Errors
    ///
    /// Returns a config error if the power-state settings are invalid.
    pub fn build(power_state: PowerStateConfig, boot_marker: &str) -> Result<Self, CliError> {
        let user_data = power_state.render_user_data()?;
        let expected_markers = ScenarioCase::new("custom", power_state.clone())
            .expected_markers(boot_marker)
            .iter()
            .map(|m| m.as_str().to_owned())
            .collect();
        Ok(Self {
            power_state,
            user_data,
            expected_markers,
        })
    }
}

impl Render for UserDataReport {
    // Text output is the bare document so it can be piped into a file.
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.user_data)
    }
}
