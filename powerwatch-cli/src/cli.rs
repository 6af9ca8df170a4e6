//! Clap derive definitions for the powerwatch CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use powerwatch_scenario::{Condition, PowerMode};

/// Powerwatch: verify power-state transitions of cloud instances.
#[derive(Parser, Debug)]
#[command(name = "powerwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "powerwatch.toml", global = true)]
    pub config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a captured log against an ordered list of markers
    Verify(VerifyArgs),

    /// Watch a running container until it boots a second time
    Detect(DetectArgs),

    /// Run a power-state scenario against a container
    Run(RunArgs),

    /// Render the #cloud-config user-data for a power-state transition
    UserData(UserDataArgs),

    /// List the built-in scenario cases and their expected markers
    Cases,

    /// Validate or display the configuration file
    Config(ConfigArgs),
}

/// How `--marker` values are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    /// Match the text verbatim
    #[default]
    Literal,
    /// Treat the text as a regular expression
    Pattern,
    /// Literal unless the text contains regex metacharacters
    Auto,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Captured log file to check
    pub log_file: PathBuf,

    /// Use the expected markers of a built-in case
    #[arg(long, conflicts_with_all = ["markers", "false_condition"])]
    pub mode: Option<PowerMode>,

    /// Use the expected markers of the false-condition case
    #[arg(long, conflicts_with = "markers")]
    pub false_condition: bool,

    /// Marker to find, in order (repeatable)
    #[arg(long = "marker")]
    pub markers: Vec<String>,

    /// How marker text is matched
    #[arg(long, value_enum, default_value_t = MatchMode::Literal)]
    pub match_mode: MatchMode,

    /// Also fail when the log contains warning or error lines
    #[arg(long)]
    pub clean_boot: bool,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Container ID or name
    pub container: String,

    /// Override the observation budget in seconds
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Container ID or name
    pub container: String,

    /// Power-state mode the container was provisioned with
    #[arg(long, default_value = "reboot")]
    pub mode: PowerMode,

    /// Expect the false-condition case instead of a transition
    #[arg(long, conflicts_with = "mode")]
    pub false_condition: bool,
}

#[derive(Args, Debug)]
pub struct UserDataArgs {
    /// Power-state mode
    #[arg(long, default_value = "reboot")]
    pub mode: PowerMode,

    /// Shutdown delay ("now", "+N" minutes)
    #[arg(long)]
    pub delay: Option<String>,

    /// Seconds to wait for other modules before transitioning
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Condition: true, false, or a command evaluated on the instance
    #[arg(long)]
    pub condition: Option<Condition>,

    /// Message passed to shutdown
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file
    Validate,
    /// Show the effective configuration
    Show {
        /// Only show one section (general, detector, scenario)
        #[arg(long)]
        section: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
