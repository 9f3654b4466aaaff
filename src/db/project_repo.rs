use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::Project;

pub struct ProjectRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: String,
    catalog_url: Option<String>,
    catalog_token: Option<String>,
    created_at: String,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            catalog_url: row.catalog_url,
            catalog_token: row.catalog_token,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project: &Project) -> Result<Project, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, catalog_url, catalog_token, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.catalog_url)
        .bind(&project.catalog_token)
        .bind(project.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Project>, sqlx::Error> {
        let row: Option<ProjectRow> = sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Project::from))
    }

    pub async fn list(&self) -> Result<Vec<Project>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as("SELECT * FROM projects ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }
}
