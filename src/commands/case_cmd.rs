use apicase_core::infer::to_pretty_json;
use apicase_core::{decode, encode, CanonicalTestCase, Level};
use clap::{Args, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum LevelArg {
    #[default]
    Test,
    Config,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Test => Level::Test,
            LevelArg::Config => Level::Config,
        }
    }
}

/// Convert a submitted editor form into a runner case
#[derive(Args)]
pub struct EncodeCommand {
    /// Form JSON file
    pub file: PathBuf,

    /// Entity level
    #[arg(long, short, value_enum, default_value = "test")]
    pub level: LevelArg,
}

/// Convert a runner case into editor rows
#[derive(Args)]
pub struct DecodeCommand {
    /// Case JSON file
    pub file: PathBuf,

    /// Entity level
    #[arg(long, short, value_enum, default_value = "test")]
    pub level: LevelArg,

    /// Print the rows folded back into a submittable form
    #[arg(long)]
    pub form: bool,
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(value)
}

impl EncodeCommand {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let form = read_json(&self.file)?;
        let encoded = encode(&form, self.level.into());

        if !encoded.is_complete() {
            eprintln!("Skipped: {}", encoded.skipped.join(", "));
        }
        println!("{}", to_pretty_json(&serde_json::to_value(&encoded.case)?)?);
        Ok(())
    }
}

impl DecodeCommand {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let level = self.level.into();
        let case: CanonicalTestCase = serde_json::from_value(read_json(&self.file)?)?;
        let editor = decode(&case, level)?;

        let output = if self.form {
            editor.to_form(level)?.to_value()?
        } else {
            serde_json::to_value(&editor)?
        };
        println!("{}", to_pretty_json(&output)?);
        Ok(())
    }
}
