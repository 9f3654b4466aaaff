use sqlx::SqlitePool;

use crate::models::User;

pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as("SELECT id, name FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| User {
            id: r.id,
            name: r.name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IMPORTER;
    use crate::db::init_db;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_importer_is_seeded() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let repo = UserRepository::new(pool);

        let user = repo.get_by_name(DEFAULT_IMPORTER).await.unwrap().unwrap();
        assert_eq!(user.name, DEFAULT_IMPORTER);
        assert!(repo.get_by_name("nobody").await.unwrap().is_none());
    }
}
