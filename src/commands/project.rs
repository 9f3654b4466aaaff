use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::db::ProjectRepository;
use crate::models::Project;

#[derive(Args)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub command: ProjectSubcommand,
}

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a new project
    Add {
        /// Name of the project
        name: String,

        /// Short description
        #[arg(long)]
        description: Option<String>,

        /// Catalog URL for this project (overrides config)
        #[arg(long, requires = "catalog_token")]
        catalog_url: Option<String>,

        /// Catalog token for this project (overrides config)
        #[arg(long, requires = "catalog_url")]
        catalog_token: Option<String>,
    },

    /// List all projects
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ProjectCommand {
    pub async fn run(&self, repo: &ProjectRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProjectSubcommand::Add {
                name,
                description,
                catalog_url,
                catalog_token,
            } => {
                if name.trim().is_empty() {
                    return Err("Project name cannot be empty".into());
                }

                let mut project = Project::new(name.trim());
                if let Some(description) = description {
                    project = project.with_description(description);
                }
                if let (Some(url), Some(token)) = (catalog_url, catalog_token) {
                    project = project.with_catalog(url, token);
                }

                let created = repo.create(&project).await?;
                println!("Created project: {} (id {})", created.name, created.id);
                Ok(())
            }
            ProjectSubcommand::List { format } => {
                let projects = repo.list().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&projects)?);
                    }
                    OutputFormat::Text => {
                        if projects.is_empty() {
                            println!("No projects found.");
                        }
                        for project in &projects {
                            print!("{}", project);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
