//! Built-in handlers for CMS resources.
//!
//! - `PostTypeHandler` - single items by slug or id
//! - `PostArchiveHandler` / `PostTypeArchiveHandler` - paginated listings
//! - `TaxonomyHandler` / `AuthorHandler` - term and author archives
//! - `DateHandler` - year, month and day archives

mod archive;
mod date;
mod post_type;
mod taxonomy;

pub use archive::*;
pub use date::*;
pub use post_type::*;
pub use taxonomy::*;

use serde_json::Value;

use crate::api::{Api, ApiRequest};
use crate::entry::{Content, ContentKind, EntityRef};
use crate::handler::{HandlerContext, HandlerError};
use crate::link;

/// Run a paginated listing request and store the returned items.
///
/// Pages past the last one resolve to 404.
pub(crate) async fn fetch_listing(
    api: &dyn Api,
    ctx: &HandlerContext<'_>,
    kind: ContentKind,
    request: ApiRequest,
    per_page: u32,
) -> Result<Content, HandlerError> {
    let mut request = request
        .param("page", ctx.page)
        .param("per_page", per_page)
        .param("_embed", true);
    if let Some(search) = ctx.search() {
        request = request.param("search", search);
    }

    let response = api.get(request).await?;

    let beyond_last = match response.total_pages {
        Some(total_pages) => ctx.page > total_pages.max(1),
        None => ctx.page > 1 && response.items.is_empty(),
    };
    if beyond_last {
        return Err(HandlerError::not_found());
    }

    let items = response
        .items
        .into_iter()
        .filter_map(|item| store_item(ctx, "post", item))
        .collect();

    Ok(Content::new(kind)
        .with_items(items)
        .with_totals(response.total, response.total_pages)
        .with_search(ctx.search()))
}

/// Store an API item and return a reference to it.
///
/// The entity kind comes from the item's `type` field, falling back to
/// `default_kind`.
pub(crate) fn store_item(ctx: &HandlerContext<'_>, default_kind: &str, item: Value) -> Option<EntityRef> {
    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(default_kind)
        .to_string();
    let link = item.get("link").and_then(Value::as_str).map(link::normalize);
    let id = ctx.store.insert_entity(&kind, item)?;
    Some(EntityRef { kind, id, link })
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory `Api` for handler tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;

    use crate::api::{Api, ApiRequest, ApiResponse};
    use crate::handler::HandlerError;

    #[derive(Default)]
    pub struct FakeApi {
        pub items: Mutex<Vec<(String, Value)>>,
        pub requests: Mutex<Vec<ApiRequest>>,
        pub calls: AtomicUsize,
    }

    impl FakeApi {
        pub fn with(mut self, endpoint: &str, item: Value) -> Self {
            self.items.get_mut().push((endpoint.to_string(), item));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<ApiRequest> {
            self.requests.lock().last().cloned()
        }
    }

    #[async_trait]
    impl Api for FakeApi {
        async fn get(&self, request: ApiRequest) -> Result<ApiResponse, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());

            let items: Vec<Value> = self
                .items
                .lock()
                .iter()
                .filter(|(endpoint, _)| *endpoint == request.endpoint)
                .map(|(_, item)| item.clone())
                .filter(|item| match request.get("slug") {
                    Some(slug) => item["slug"] == Value::from(slug),
                    None => true,
                })
                .filter(|item| match request.get("include") {
                    Some(id) => item["id"].to_string() == id,
                    None => true,
                })
                .collect();

            let total = items.len() as u64;
            Ok(ApiResponse::new(items).with_totals(total, 1))
        }
    }
}
