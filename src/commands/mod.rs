mod case_cmd;
mod config_cmd;
mod import_cmd;
mod project;

use clap::ValueEnum;

pub use case_cmd::{DecodeCommand, EncodeCommand};
pub use config_cmd::ConfigCommand;
pub use import_cmd::ImportCommand;
pub use project::ProjectCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
