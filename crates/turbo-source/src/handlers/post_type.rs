//! Single post type items.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{Api, ApiRequest};
use crate::entry::Content;
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::handlers::store_item;

/// Resolves a single item by `slug` (pretty permalinks) or `id` (query
/// permalinks), trying each endpoint in order.
pub struct PostTypeHandler {
    endpoints: Vec<String>,
    api: Arc<dyn Api>,
}

impl PostTypeHandler {
    /// Create a handler over the given endpoints.
    pub fn new(endpoints: Vec<String>, api: Arc<dyn Api>) -> Self {
        Self { endpoints, api }
    }

    /// The endpoints tried, in order.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

#[async_trait]
impl Handler for PostTypeHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        let (key, value) = match (ctx.param("id"), ctx.param("slug")) {
            (Some(id), _) => {
                let id = id.parse::<u64>().map_err(|_| HandlerError::not_found())?;
                ("include", id.to_string())
            }
            (None, Some(slug)) => ("slug", slug.to_string()),
            (None, None) => return Err(HandlerError::not_found()),
        };

        if !ctx.force && key == "slug" {
            if let Some(cached) = ctx.store.entity_by_route(ctx.route) {
                debug!(route = ctx.route, kind = %cached.kind, "post type served from store");
                return Ok(Content::post_type(cached.kind, cached.id));
            }
        }

        for endpoint in &self.endpoints {
            let request = ApiRequest::new(endpoint.as_str())
                .param(key, &value)
                .param("_embed", true);
            let response = self.api.get(request).await?;

            if let Some(item) = response.items.into_iter().next() {
                let entity = store_item(&ctx, endpoint, item).ok_or_else(|| {
                    HandlerError::Other(anyhow::anyhow!("{} item without a numeric id", endpoint))
                })?;
                return Ok(Content::post_type(entity.kind, entity.id));
            }
        }

        Err(HandlerError::not_found())
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

    fn ctx<'a>(
        route: &'a str,
        params: &'a Params,
        query: &'a Query,
        store: &'a DataStore,
        force: bool,
    ) -> HandlerContext<'a> {
        HandlerContext {
            link: route,
            route,
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

    #[tokio::test]
    async fn test_resolves_by_slug_across_endpoints() {
        let api = Arc::new(FakeApi::default().with(
            "pages",
            json!({ "id": 2, "slug": "about", "type": "page", "link": "https://cms.example.com/about/" }),
        ));
        let handler = PostTypeHandler::new(vec!["posts".into(), "pages".into()], api.clone());
        let store = DataStore::new();
        let (params, query) = (slug("about"), Query::new());

        let content = handler
            .handle(ctx("/about/", &params, &query, &store, false))
            .await
            .unwrap();

        assert_eq!(content, Content::post_type("page", 2));
        assert_eq!(api.calls(), 2);
        assert!(store.entity("page", 2).is_some());
    }

    #[tokio::test]
    async fn test_resolves_by_id() {
        let api = Arc::new(FakeApi::default().with("posts", json!({ "id": 42, "slug": "hello", "type": "post" })));
        let handler = PostTypeHandler::new(vec!["posts".into()], api.clone());
        let store = DataStore::new();
        let params = Params::from([("id".to_string(), "42".to_string())]);
        let query = Query::new();

        let content = handler
            .handle(ctx("/", &params, &query, &store, false))
            .await
            .unwrap();

        assert_eq!(content, Content::post_type("post", 42));
        assert_eq!(api.last_request().unwrap().get("include"), Some("42"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let handler = PostTypeHandler::new(vec!["posts".into()], Arc::new(FakeApi::default()));
        let store = DataStore::new();
        let (params, query) = (slug("missing"), Query::new());

        let err = handler
            .handle(ctx("/missing/", &params, &query, &store, false))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_store_hit_skips_api_unless_forced() {
        let api = Arc::new(FakeApi::default().with("movies", json!({ "id": 7, "slug": "up", "type": "movie" })));
        let handler = PostTypeHandler::new(vec!["movies".into()], api.clone());
        let store = DataStore::new();
        store.insert_entity("movie", json!({ "id": 7, "slug": "up", "link": "/movie/up/" }));
        let (params, query) = (slug("up"), Query::new());

        let content = handler
            .handle(ctx("/movie/up/", &params, &query, &store, false))
            .await
            .unwrap();
        assert_eq!(content, Content::post_type("movie", 7));
        assert_eq!(api.calls(), 0);

        handler
            .handle(ctx("/movie/up/", &params, &query, &store, true))
            .await
            .unwrap();
        assert_eq!(api.calls(), 1);
    }
}
