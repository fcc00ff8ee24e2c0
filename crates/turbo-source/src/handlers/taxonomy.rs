//! Term and author archives.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{Api, ApiRequest};
use crate::entry::{Content, ContentKind};
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::handlers::{fetch_listing, store_item};

/// Find an entity by slug, from the store unless forced, else from the API.
async fn resolve_slug(
    api: &dyn Api,
    ctx: &HandlerContext<'_>,
    kind: &str,
    endpoint: &str,
) -> Result<u64, HandlerError> {
    let slug = ctx.param("slug").ok_or_else(HandlerError::not_found)?;

    if !ctx.force {
        if let Some((id, _)) = ctx.store.entity_by_slug(kind, slug) {
            debug!(kind, slug, id, "term served from store");
            return Ok(id);
        }
    }

    let response = api.get(ApiRequest::new(endpoint).param("slug", slug)).await?;
    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(HandlerError::not_found)?;

    store_item(ctx, kind, item)
        .map(|entity| entity.id)
        .ok_or_else(|| HandlerError::Other(anyhow::anyhow!("{} `{}` without a numeric id", kind, slug)))
}

/// Archive of a taxonomy term, nested terms included.
pub struct TaxonomyHandler {
    taxonomy: String,
    endpoint: String,
    post_type_endpoint: String,
    params: BTreeMap<String, String>,
    api: Arc<dyn Api>,
    per_page: u32,
}

impl TaxonomyHandler {
    /// Create a handler listing `posts` for terms of `endpoint`.
    pub fn new(taxonomy: impl Into<String>, endpoint: impl Into<String>, api: Arc<dyn Api>, per_page: u32) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            endpoint: endpoint.into(),
            post_type_endpoint: "posts".to_string(),
            params: BTreeMap::new(),
            api,
            per_page,
        }
    }

    /// List items of another endpoint.
    pub fn with_post_type_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.post_type_endpoint = endpoint.into();
        self
    }

    /// Extra parameters for the listing request.
    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl Handler for TaxonomyHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        let id = resolve_slug(self.api.as_ref(), &ctx, &self.taxonomy, &self.endpoint).await?;

        let request = ApiRequest::new(self.post_type_endpoint.as_str())
            .param(self.endpoint.as_str(), id)
            .params(&self.params);
        let kind = ContentKind::Taxonomy {
            taxonomy: self.taxonomy.clone(),
            id,
        };

        fetch_listing(self.api.as_ref(), &ctx, kind, request, self.per_page).await
    }
}

/// Archive of an author's posts.
pub struct AuthorHandler {
    api: Arc<dyn Api>,
    per_page: u32,
}

impl AuthorHandler {
    pub fn new(api: Arc<dyn Api>, per_page: u32) -> Self {
        Self { api, per_page }
    }
}

#[async_trait]
impl Handler for AuthorHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        let id = resolve_slug(self.api.as_ref(), &ctx, "author", "users").await?;
        let request = ApiRequest::new("posts").param("author", id);

        fetch_listing(self.api.as_ref(), &ctx, ContentKind::Author { id }, request, self.per_page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::FakeApi;
    use crate::link::Query;
    use crate::pattern::Params;
    use crate::store::DataStore;
    use serde_json::json;

    fn ctx<'a>(params: &'a Params, query: &'a Query, store: &'a DataStore, force: bool) -> HandlerContext<'a> {
        HandlerContext {
            link: "/category/news/",
            route: "/category/news/",
            params,
            page: 1,
            query,
            store,
            force,
        }
    }

    fn slug(value: &str) -> Params {
        Params::from([("slug".to_string(), value.to_string())])
    }

    // === TaxonomyHandler Tests ===

    #[tokio::test]
    async fn test_taxonomy_lists_term_posts() {
        let api = Arc::new(
            FakeApi::default()
                .with("categories", json!({ "id": 3, "slug": "news", "taxonomy": "category" }))
                .with("posts", json!({ "id": 1, "slug": "one", "type": "post" })),
        );
        let handler = TaxonomyHandler::new("category", "categories", api.clone(), 10);
        let (params, query, store) = (slug("news"), Query::new(), DataStore::new());

        let content = handler.handle(ctx(&params, &query, &store, false)).await.unwrap();

        assert_eq!(
            content.kind,
            ContentKind::Taxonomy {
                taxonomy: "category".into(),
                id: 3
            }
        );
        assert_eq!(content.items.len(), 1);
        assert_eq!(api.last_request().unwrap().get("categories"), Some("3"));
        assert!(store.entity_by_slug("category", "news").is_some());
    }

    #[tokio::test]
    async fn test_taxonomy_custom_endpoint_and_params() {
        let api = Arc::new(FakeApi::default().with("actors", json!({ "id": 9, "slug": "keanu" })));
        let handler = TaxonomyHandler::new("actor", "actors", api.clone(), 10)
            .with_post_type_endpoint("movies")
            .with_params(BTreeMap::from([("orderby".to_string(), "title".to_string())]));
        let (params, query, store) = (slug("keanu"), Query::new(), DataStore::new());

        handler.handle(ctx(&params, &query, &store, false)).await.unwrap();

        let request = api.last_request().unwrap();
        assert_eq!(request.endpoint, "movies");
        assert_eq!(request.get("actors"), Some("9"));
        assert_eq!(request.get("orderby"), Some("title"));
    }

    #[tokio::test]
    async fn test_unknown_term_is_not_found() {
        let api = Arc::new(FakeApi::default());
        let handler = TaxonomyHandler::new("category", "categories", api.clone(), 10);
        let (params, query, store) = (slug("nope"), Query::new(), DataStore::new());

        let err = handler.handle(ctx(&params, &query, &store, false)).await.unwrap_err();

        assert!(matches!(err, HandlerError::Status { status: 404, .. }));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_term_skips_lookup() {
        let api = Arc::new(FakeApi::default());
        let handler = TaxonomyHandler::new("tag", "tags", api.clone(), 10);
        let store = DataStore::new();
        store.insert_entity("tag", json!({ "id": 4, "slug": "rust" }));
        let (params, query) = (slug("rust"), Query::new());

        handler.handle(ctx(&params, &query, &store, false)).await.unwrap();
        assert_eq!(api.calls(), 1);
        assert_eq!(api.last_request().unwrap().endpoint, "posts");
    }

    // === AuthorHandler Tests ===

    #[tokio::test]
    async fn test_author_lists_posts() {
        let api = Arc::new(FakeApi::default().with("users", json!({ "id": 5, "slug": "jane" })));
        let handler = AuthorHandler::new(api.clone(), 10);
        let (params, query, store) = (slug("jane"), Query::new(), DataStore::new());

        let content = handler.handle(ctx(&params, &query, &store, false)).await.unwrap();

        assert_eq!(content.kind, ContentKind::Author { id: 5 });
        assert_eq!(api.last_request().unwrap().get("author"), Some("5"));
        assert!(store.entity("author", 5).is_some());
    }
}
