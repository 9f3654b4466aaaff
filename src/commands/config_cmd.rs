use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Hides all but the last four characters of a secret.
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let mut shown = config.clone();
                shown.catalog.token = shown.catalog.token.as_deref().map(mask);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&shown)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &shown.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("database_path: {}", shown.database_path.value.display());
                        println!("  source: {}", shown.database_path.source);
                        println!();

                        println!("importer: {}", shown.importer.value);
                        println!("  source: {}", shown.importer.source);
                        println!();

                        println!("catalog:");
                        println!(
                            "  base_url: {}",
                            shown.catalog.base_url.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "  token: {}",
                            shown.catalog.token.as_deref().unwrap_or("(not set)")
                        );
                        match shown.catalog.project_id {
                            Some(id) => println!("  project_id: {}", id),
                            None => println!("  project_id: (not set)"),
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("abcdef123456"), "****3456");
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask(""), "****");
    }
}
