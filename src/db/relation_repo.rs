use apicase_core::CategoryTree;
use sqlx::SqlitePool;

use super::json_column;

/// Tree type holding imported API categories.
pub const API_TREE: i64 = 1;

pub struct RelationRepository {
    pool: SqlitePool,
}

impl RelationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the stored tree, or `None` if the project has none yet.
    pub async fn get_tree(
        &self,
        project_id: i64,
        tree_type: i64,
    ) -> Result<Option<CategoryTree>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT tree FROM relations WHERE project_id = ? AND tree_type = ?")
                .bind(project_id)
                .bind(tree_type)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(tree,)| serde_json::from_str(&tree).map_err(json_column))
            .transpose()
    }

    pub async fn save_tree(
        &self,
        project_id: i64,
        tree_type: i64,
        tree: &CategoryTree,
    ) -> Result<(), sqlx::Error> {
        let tree = serde_json::to_string(tree).map_err(json_column)?;
        sqlx::query(
            r#"
            INSERT INTO relations (project_id, tree_type, tree) VALUES (?, ?, ?)
            ON CONFLICT (project_id, tree_type) DO UPDATE SET tree = excluded.tree
            "#,
        )
        .bind(project_id)
        .bind(tree_type)
        .bind(&tree)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
