//! Handler interface invoked by the fetch action.

use async_trait::async_trait;
use http::StatusCode;

use crate::entry::Content;
use crate::link::Query;
use crate::pattern::Params;
use crate::store::DataStore;

/// Failure of a handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Classified HTTP-like failure. Settles the entry as an error.
    #[error("{status} {status_text}")]
    Status { status: u16, status_text: String },

    /// Any other failure. Propagated to the caller of `fetch`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// A classified failure with the canonical reason text for `status`.
    pub fn status(status: u16) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_string();
        Self::Status {
            status,
            status_text,
        }
    }

    /// A classified failure with a custom reason text.
    pub fn with_text(status: u16, status_text: impl Into<String>) -> Self {
        Self::Status {
            status,
            status_text: status_text.into(),
        }
    }

    /// 404 Not Found.
    pub fn not_found() -> Self {
        Self::status(404)
    }

    /// Whether this failure carries an HTTP-like status.
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

/// Everything a handler receives for one fetch.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Normalized link being fetched (the entry key).
    pub link: &'a str,
    /// Route after redirection.
    pub route: &'a str,
    /// Parameters captured by the handler's pattern.
    pub params: &'a Params,
    /// Page number.
    pub page: u32,
    /// Query parameters of the link.
    pub query: &'a Query,
    /// Shared store for fetched entities.
    pub store: &'a DataStore,
    /// Whether the caller asked to bypass cached entities.
    pub force: bool,
}

impl<'a> HandlerContext<'a> {
    /// Get a captured parameter by name.
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// The search query (`s`), if any.
    pub fn search(&self) -> Option<&'a str> {
        self.query.get("s").map(|s| s.as_str())
    }
}

/// Fetches and normalizes one category of CMS resource.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Resolve the matched route into content for its data entry.
    async fn handle(&self, ctx: HandlerContext<'_>) -> Result<Content, HandlerError>;
}
