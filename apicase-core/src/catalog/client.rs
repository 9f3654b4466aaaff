//! HTTP client for the external API catalog service.
//!
//! Menu and list calls never fail past this boundary: transport and decode
//! errors are logged and turned into a sentinel (`MenuResponse::failure()`)
//! or `None`. Detail fetches fan out over a bounded number of concurrent
//! requests sharing one connection pool.

use std::collections::BTreeMap;

use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::Span;

use super::model::{DetailResponse, ListResponse, MenuResponse, RemoteCatalogItem};

/// Maximum number of detail requests in flight at once.
pub const DETAIL_CONCURRENCY: usize = 10;

/// Page size for the list endpoint, large enough to cover the whole catalog
/// in one page.
pub const LIST_PAGE_LIMIT: u32 = 100_000;

const API_PREFIX: &str = "/api/interface";

/// Client for one catalog project, authenticated by its token.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    span: Span,
}

impl CatalogClient {
    /// Creates a client that logs under the caller's current span.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_span(base_url, token, Span::current())
    }

    /// Creates a client that logs under `span`.
    pub fn with_span(base_url: impl Into<String>, token: impl Into<String>, span: Span) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: reqwest::Client::new(),
            span,
        }
    }

    /// Returns the catalog base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the category menu.
    ///
    /// Returns [`MenuResponse::failure()`] when the request fails, the payload
    /// cannot be decoded, or the service reports an error code.
    pub async fn fetch_category_tree(&self) -> MenuResponse {
        let url = self.build_url("list_menu", &[]);
        match self.get_json::<MenuResponse>(&url).await {
            Ok(menu) if menu.is_ok() => menu,
            Ok(menu) => {
                tracing::warn!(
                    parent: &self.span,
                    "Catalog menu returned errcode {}: {}",
                    menu.errcode,
                    menu.errmsg.as_deref().unwrap_or("")
                );
                MenuResponse::failure()
            }
            Err(e) => {
                tracing::error!(parent: &self.span, "Failed to fetch catalog menu: {}", e);
                MenuResponse::failure()
            }
        }
    }

    /// Flattens the menu into `{item id -> last update time}`.
    pub async fn fetch_uptime_mapping(&self) -> BTreeMap<i64, i64> {
        self.fetch_category_tree()
            .await
            .data
            .into_iter()
            .flat_map(|category| category.list)
            .map(|item| (item.id, item.up_time))
            .collect()
    }

    /// Maps `{category id -> category name}` for categories that hold at
    /// least one item. `None` when the menu could not be fetched.
    pub async fn fetch_category_names(&self) -> Option<BTreeMap<i64, String>> {
        let menu = self.fetch_category_tree().await;
        if !menu.is_ok() {
            return None;
        }
        Some(
            menu.data
                .into_iter()
                .filter(|category| !category.list.is_empty())
                .map(|category| (category.id, category.name))
                .collect(),
        )
    }

    /// Fetches every item id from the list endpoint.
    ///
    /// `None` when the request fails or the service reports an error code.
    pub async fn fetch_id_list(&self) -> Option<Vec<i64>> {
        let url = self.build_url(
            "list",
            &[("page", "1".to_string()), ("limit", LIST_PAGE_LIMIT.to_string())],
        );
        match self.get_json::<ListResponse>(&url).await {
            Ok(list) if list.errcode == 0 => {
                Some(list.data.list.iter().filter_map(|item| item.id()).collect())
            }
            Ok(list) => {
                tracing::warn!(parent: &self.span, "Catalog list returned errcode {}", list.errcode);
                None
            }
            Err(e) => {
                tracing::error!(parent: &self.span, "Failed to fetch catalog list: {}", e);
                None
            }
        }
    }

    /// Fetches item details for `ids`, at most [`DETAIL_CONCURRENCY`] at a
    /// time.
    ///
    /// The stream is lazy and yields items in completion order. A failed
    /// request is logged and left out; it does not affect the others. The
    /// stream ends once every request has either succeeded or failed.
    pub fn fetch_details_batch<'a>(
        &'a self,
        ids: &'a [i64],
    ) -> impl Stream<Item = RemoteCatalogItem> + 'a {
        stream::iter(ids.iter().copied())
            .map(move |id| self.fetch_detail(id))
            .buffer_unordered(DETAIL_CONCURRENCY)
            .filter_map(futures::future::ready)
    }

    /// Drains [`Self::fetch_details_batch`] into a vector.
    pub async fn collect_details(&self, ids: &[i64]) -> Vec<RemoteCatalogItem> {
        self.fetch_details_batch(ids).collect().await
    }

    async fn fetch_detail(&self, id: i64) -> Option<RemoteCatalogItem> {
        let url = self.build_url("get", &[("id", id.to_string())]);
        match self.get_json::<DetailResponse>(&url).await {
            Ok(detail) => Some(detail.data),
            Err(e) => {
                tracing::error!(parent: &self.span, "Failed to fetch catalog item {}: {}", id, e);
                None
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    /// Builds an endpoint URL carrying the token and `query` pairs.
    fn build_url(&self, endpoint: &str, query: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}{}/{}?token={}",
            self.base_url.trim_end_matches('/'),
            API_PREFIX,
            endpoint,
            urlencoding::encode(&self.token)
        );
        for (key, value) in query {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}
