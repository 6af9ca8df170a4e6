//! `powerwatch cases` command handler

use std::io::Write;

use serde::Serialize;

use powerwatch_core::config::PowerwatchConfig;
use powerwatch_scenario::{ScenarioCase, false_condition_case, standard_cases};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

pub fn execute(config: &PowerwatchConfig, writer: &OutputWriter) -> Result<(), CliError> {
    writer.render(&CasesReport::build(&config.detector.boot_marker))
}

/// One built-in case with the markers it must leave in the log.
#[derive(Debug, Serialize)]
pub struct CaseEntry {
    #[serde(flatten)]
    pub case: ScenarioCase,
    pub expected_markers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CasesReport {
    pub cases: Vec<CaseEntry>,
}

impl CasesReport {
    pub fn build(boot_marker: &str) -> Self {
        let cases = standard_cases()
            .into_iter()
            .chain(std::iter::once(false_condition_case()))
            .map(|case| CaseEntry {
                expected_markers: marker_strings(&case, boot_marker),
                case,
            })
            .collect();
        Self { cases }
    }
}

fn marker_strings(case: &ScenarioCase, boot_marker: &str) -> Vec<String> {
    case.expected_markers(boot_marker)
        .iter()
        .map(|m| m.as_str().to_owned())
        .collect()
}

impl Render for CasesReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for entry in &self.cases {
            let ps = &entry.case.power_state;
            writeln!(
                w,
                "{}  mode={} delay={} timeout={} condition={}",
                entry.case.name.bold(),
                ps.mode,
                ps.delay,
                ps.timeout,
                ps.condition
            )?;
            for (idx, marker) in entry.expected_markers.iter().enumerate() {
                writeln!(w, "  {idx}. {marker}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_three_standard_cases_and_false_condition() {
        let report = CasesReport::build("running 'init-local'");
        let names: Vec<&str> = report.cases.iter().map(|c| c.case.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["poweroff", "reboot", "halt", "poweroff_false_condition"]
        );
        assert_eq!(report.cases[3].expected_markers.len(), 1);
    }

    #[test]
    fn test_render_shows_markers_in_order() {
        colored::control::set_override(false);
        let report = CasesReport::build("running 'init-local'");
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("halt  mode=halt delay=+1 timeout=0 condition=true"));
        let run = output.find("0. Running module power_state_change").expect("first marker");
        let ran = output.find("3. config-power_state_change already ran").expect("last marker");
        assert!(run < ran);
    }

    #[test]
    fn test_json_flattens_case_fields() {
        let report = CasesReport::build("running 'init-local'");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["cases"][0]["name"], "poweroff");
        assert_eq!(json["cases"][0]["power_state"]["timeout"], 10);
        assert_eq!(json["cases"][1]["expected_markers"][2], "running 'init-local'");
    }
}
