//! Command handlers -- one module per subcommand

pub mod cases;
pub mod config;
pub mod detect;
pub mod run;
pub mod user_data;
pub mod verify;
