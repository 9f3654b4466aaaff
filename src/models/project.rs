use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A local project that catalog items are imported into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Assigned by the database; 0 before insert
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Per-project catalog URL, overriding the configured one
    pub catalog_url: Option<String>,
    /// Per-project catalog token, overriding the configured one
    pub catalog_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            catalog_url: None,
            catalog_token: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_catalog(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self.catalog_token = Some(token.into());
        self
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (id {})", self.name, self.id)?;
        if !self.description.is_empty() {
            writeln!(f, "  {}", self.description)?;
        }
        if let Some(url) = &self.catalog_url {
            writeln!(f, "  catalog: {}", url)?;
        }
        Ok(())
    }
}
