use apicase_core::ImportedRecord;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::json_column;

pub struct ApiRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ApiRow {
    id: i64,
    project_id: i64,
    external_id: i64,
    up_time: i64,
    name: String,
    method: String,
    url: String,
    body: String,
    relation: i64,
    creator: Option<String>,
}

impl TryFrom<ApiRow> for ImportedRecord {
    type Error = sqlx::Error;

    fn try_from(row: ApiRow) -> Result<Self, Self::Error> {
        Ok(ImportedRecord {
            id: Some(row.id),
            project_id: row.project_id,
            external_id: row.external_id,
            up_time: row.up_time,
            name: row.name,
            method: row.method,
            url: row.url,
            body: serde_json::from_str(&row.body).map_err(json_column)?,
            relation: row.relation,
            creator: row.creator,
        })
    }
}

impl ApiRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<ImportedRecord>, sqlx::Error> {
        let rows: Vec<ApiRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, external_id, up_time, name, method, url, body, relation, creator
            FROM apis WHERE project_id = ? ORDER BY external_id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ImportedRecord::try_from).collect()
    }

    /// Writes merged records in one transaction: `updates` by row id,
    /// `creates` as new rows. Returns `(updated, created)` counts.
    pub async fn save(
        &self,
        updates: &[ImportedRecord],
        creates: &[ImportedRecord],
    ) -> Result<(usize, usize), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        let mut updated = 0;
        for record in updates {
            let Some(id) = record.id else {
                return Err(sqlx::Error::RowNotFound);
            };
            Self::update_one(&mut tx, id, record, &now).await?;
            updated += 1;
        }

        for record in creates {
            Self::insert_one(&mut tx, record, &now).await?;
        }

        tx.commit().await?;
        Ok((updated, creates.len()))
    }

    async fn insert_one(
        tx: &mut Transaction<'_, Sqlite>,
        record: &ImportedRecord,
        now: &str,
    ) -> Result<(), sqlx::Error> {
        let body = serde_json::to_string(&record.body).map_err(json_column)?;
        sqlx::query(
            r#"
            INSERT INTO apis (project_id, external_id, up_time, name, method, url, body, relation, creator, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.project_id)
        .bind(record.external_id)
        .bind(record.up_time)
        .bind(&record.name)
        .bind(&record.method)
        .bind(&record.url)
        .bind(&body)
        .bind(record.relation)
        .bind(&record.creator)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn update_one(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        record: &ImportedRecord,
        now: &str,
    ) -> Result<(), sqlx::Error> {
        let body = serde_json::to_string(&record.body).map_err(json_column)?;
        let result = sqlx::query(
            r#"
            UPDATE apis
            SET up_time = ?, name = ?, method = ?, url = ?, body = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.up_time)
        .bind(&record.name)
        .bind(&record.method)
        .bind(&record.url)
        .bind(&body)
        .bind(now)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }
}
