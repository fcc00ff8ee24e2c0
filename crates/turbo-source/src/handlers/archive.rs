//! Paginated post listings.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{Api, ApiRequest};
use crate::entry::{Content, ContentKind};
use crate::handler::{Handler, HandlerContext, HandlerError};
use crate::handlers::fetch_listing;

/// The main posts archive, served at the root or the posts page.
pub struct PostArchiveHandler {
    api: Arc<dyn Api>,
    per_page: u32,
}

impl PostArchiveHandler {
    pub fn new(api: Arc<dyn Api>, per_page: u32) -> Self {
        Self { api, per_page }
    }
}

#[async_trait]
impl Handler for PostArchiveHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        fetch_listing(
            self.api.as_ref(),
            &ctx,
            ContentKind::PostArchive,
            ApiRequest::new("posts"),
            self.per_page,
        )
        .await
    }
}

/// The archive of a custom post type.
pub struct PostTypeArchiveHandler {
    post_type: String,
    endpoint: String,
    api: Arc<dyn Api>,
    per_page: u32,
}

impl PostTypeArchiveHandler {
    pub fn new(
        post_type: impl Into<String>,
        endpoint: impl Into<String>,
        api: Arc<dyn Api>,
        per_page: u32,
    ) -> Self {
        Self {
            post_type: post_type.into(),
            endpoint: endpoint.into(),
            api,
            per_page,
        }
    }
}

#[async_trait]
impl Handler for PostTypeArchiveHandler {
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError> {
        fetch_listing(
            self.api.as_ref(),
            &ctx,
            ContentKind::PostTypeArchive {
                post_type: self.post_type.clone(),
            },
            ApiRequest::new(self.endpoint.as_str()),
            self.per_page,
        )
        .await
    }
}
