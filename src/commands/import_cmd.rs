use clap::Args;

use super::OutputFormat;
use crate::config::Config;
use crate::sync::Importer;

/// Import new and changed catalog items into a project
#[derive(Args)]
pub struct ImportCommand {
    /// Local project ID (defaults to catalog.project_id from config)
    #[arg(long, short)]
    pub project: Option<i64>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ImportCommand {
    pub async fn run(
        &self,
        importer: &Importer,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let project_id = self
            .project
            .or(config.catalog.project_id)
            .ok_or("No project given. Pass --project or set catalog.project_id in config.")?;

        let report = importer.run(project_id).await?;
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => println!("Import complete: {}", report),
        }
        Ok(())
    }
}
