use apicase_core::reconcile::uptime_index;
use apicase_core::{
    diff_for_sync, encode_form, merge_api, CatalogClient, CategoryTree, ImportedRecord, Level,
    NormalizedItem, Normalizer,
};
use futures::StreamExt;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::Span;

use crate::config::CatalogConfig;
use crate::db::{ApiRepository, ProjectRepository, RelationRepository, UserRepository, API_TREE};
use crate::models::Project;

/// Errors that stop an import run.
#[derive(Debug)]
pub enum ImportError {
    /// No local project with this id
    ProjectNotFound(i64),
    /// Neither the project nor the config names a catalog URL and token
    CatalogNotConfigured(i64),
    /// Storage failure
    Database(sqlx::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::ProjectNotFound(id) => write!(f, "Project not found: {}", id),
            ImportError::CatalogNotConfigured(id) => write!(
                f,
                "No catalog configured for project {}. Set catalog.base_url and catalog.token in config.",
                id
            ),
            ImportError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<sqlx::Error> for ImportError {
    fn from(e: sqlx::Error) -> Self {
        ImportError::Database(e)
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    /// New or changed items that could not be fetched or normalized
    pub skipped: usize,
    /// Category tree nodes added
    pub categories_added: usize,
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} new categories",
            self.created, self.updated, self.skipped, self.categories_added
        )
    }
}

/// Runs catalog imports against the local database.
pub struct Importer {
    projects: ProjectRepository,
    relations: RelationRepository,
    users: UserRepository,
    apis: ApiRepository,
    catalog: CatalogConfig,
    importer_name: String,
    span: Span,
}

impl Importer {
    pub fn new(pool: SqlitePool, catalog: CatalogConfig, importer_name: impl Into<String>) -> Self {
        Self {
            projects: ProjectRepository::new(pool.clone()),
            relations: RelationRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            apis: ApiRepository::new(pool),
            catalog,
            importer_name: importer_name.into(),
            span: Span::current(),
        }
    }

    /// Logs under `span` instead of the caller's current span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub async fn run(&self, project_id: i64) -> Result<ImportReport, ImportError> {
        let project = self
            .projects
            .get_by_id(project_id)
            .await?
            .ok_or(ImportError::ProjectNotFound(project_id))?;
        let client = self.client_for(&project)?;
        tracing::info!(
            parent: &self.span,
            "Importing catalog {} into project '{}'",
            client.base_url(),
            project.name
        );

        let mut report = ImportReport::default();
        let (tree, added) = self.sync_categories(&client, project.id).await?;
        report.categories_added = added;

        let imported = self.apis.list_by_project(project.id).await?;
        let remote = client.fetch_uptime_mapping().await;
        let plan = diff_for_sync(&remote, &uptime_index(&imported));
        if plan.is_empty() {
            tracing::info!(parent: &self.span, "Project '{}' is up to date", project.name);
            return Ok(report);
        }
        tracing::info!(
            parent: &self.span,
            "{} new and {} changed catalog items",
            plan.create.len(),
            plan.update.len()
        );

        let creator = self
            .users
            .get_by_name(&self.importer_name)
            .await?
            .map(|user| user.name);
        if creator.is_none() {
            tracing::warn!(
                parent: &self.span,
                "Importer identity '{}' not found, records will have no creator",
                self.importer_name
            );
        }

        let ids = plan.ids();
        let normalizer = Normalizer::with_span(project.id, self.span.clone());
        let mut fresh = Vec::with_capacity(ids.len());
        let mut details = Box::pin(client.fetch_details_batch(&ids));
        while let Some(item) = details.next().await {
            let normalized = match normalizer.normalize(&item) {
                Ok(normalized) => normalized,
                Err(e) => {
                    tracing::error!(parent: &self.span, "{}", e);
                    continue;
                }
            };
            let record = self.project_record(normalized, project.id, &tree, creator.as_deref());
            fresh.extend(record);
        }
        report.skipped = ids.len() - fresh.len();

        let (updates, creates) = merge_api(fresh, &imported);
        let (updated, created) = self.apis.save(&updates, &creates).await?;
        report.updated = updated;
        report.created = created;

        tracing::info!(parent: &self.span, "Import finished: {}", report);
        Ok(report)
    }

    fn client_for(&self, project: &Project) -> Result<CatalogClient, ImportError> {
        let base_url = project
            .catalog_url
            .clone()
            .or_else(|| self.catalog.base_url.clone());
        let token = project
            .catalog_token
            .clone()
            .or_else(|| self.catalog.token.clone());
        match (base_url, token) {
            (Some(base_url), Some(token)) => {
                Ok(CatalogClient::with_span(base_url, token, self.span.clone()))
            }
            _ => Err(ImportError::CatalogNotConfigured(project.id)),
        }
    }

    /// Appends unseen catalog categories to the project's tree.
    ///
    /// When the category menu cannot be fetched the stored tree is used
    /// unchanged.
    async fn sync_categories(
        &self,
        client: &CatalogClient,
        project_id: i64,
    ) -> Result<(CategoryTree, usize), ImportError> {
        let stored = self.relations.get_tree(project_id, API_TREE).await?;
        let exists = stored.is_some();
        let mut tree = stored.unwrap_or_default();

        let Some(categories) = client.fetch_category_names().await else {
            tracing::warn!(
                parent: &self.span,
                "Catalog categories unavailable, keeping the current tree"
            );
            return Ok((tree, 0));
        };

        let added = tree.merge_categories(&categories);
        if added > 0 || !exists {
            self.relations.save_tree(project_id, API_TREE, &tree).await?;
        }
        if added > 0 {
            tracing::info!(parent: &self.span, "Added {} categories to the tree", added);
        }
        Ok((tree, added))
    }

    fn project_record(
        &self,
        normalized: NormalizedItem,
        project_id: i64,
        tree: &CategoryTree,
        creator: Option<&str>,
    ) -> Option<ImportedRecord> {
        let NormalizedItem { form, meta } = normalized;
        let encoded = match encode_form(&form, Level::Test) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(
                    parent: &self.span,
                    "Catalog item {}: failed to encode: {}",
                    meta.external_id,
                    e
                );
                return None;
            }
        };

        Some(ImportedRecord {
            id: None,
            project_id,
            external_id: meta.external_id,
            up_time: meta.up_time,
            name: form.name.unwrap_or_default(),
            method: form.method.unwrap_or_default(),
            url: form.url.unwrap_or_default(),
            body: encoded.case,
            relation: tree.node_for(meta.category_id),
            creator: creator.map(str::to_string),
        })
    }
}
