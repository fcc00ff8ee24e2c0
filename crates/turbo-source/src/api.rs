//! Upstream REST API interface.
//!
//! Issuing HTTP requests is left to the host; this module defines the
//! request/response shapes handlers use and how endpoint URLs are built for
//! each platform variant.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::handler::HandlerError;

/// Base URL of the hosted platform's public API.
pub const HOSTED_API_BASE: &str = "https://public-api.wordpress.com/wp/v2/sites/";

/// Source platform variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Self-hosted installation exposing its own REST API.
    #[default]
    SelfHosted,
    /// Hosted platform, addressed by site name through a shared API.
    Hosted,
}

/// Resolved API location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base: Url,
    variant: Variant,
}

impl ApiConfig {
    /// Configure the API from the user-supplied value.
    ///
    /// Self-hosted sites pass the REST root (`https://site.com/wp-json/`).
    /// Hosted sites pass the site name or URL (`site.example.com`).
    pub fn init(api: &str, variant: Variant) -> Result<Self, ConfigError> {
        let invalid = |source| ConfigError::ApiUrl {
            url: api.to_string(),
            source,
        };

        let base = match variant {
            Variant::SelfHosted => {
                let mut url = Url::parse(api).map_err(invalid)?;
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                url
            }
            Variant::Hosted => {
                let site = match Url::parse(api) {
                    Ok(url) => url.host_str().unwrap_or_default().to_string(),
                    Err(_) => api.trim_matches('/').to_string(),
                };
                Url::parse(&format!("{}{}/", HOSTED_API_BASE, site)).map_err(invalid)?
            }
        };

        Ok(Self { base, variant })
    }

    /// Base URL every endpoint is joined to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The platform variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// URL of an endpoint (`posts`, `wp/v2/posts`, ...).
    ///
    /// Self-hosted endpoints without a namespace are placed under `wp/v2/`.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let endpoint = endpoint.trim_start_matches('/');
        match self.variant {
            Variant::SelfHosted if !endpoint.contains('/') => {
                self.base.join(&format!("wp/v2/{}", endpoint))
            }
            _ => self.base.join(endpoint),
        }
    }

    /// Full URL of a request, query included.
    pub fn request_url(&self, request: &ApiRequest) -> Result<Url, url::ParseError> {
        let mut url = self.endpoint_url(&request.endpoint)?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }
        Ok(url)
    }
}

/// A GET request against an API endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Endpoint name (`posts`, `categories`, ...).
    pub endpoint: String,
    /// Query parameters.
    pub params: BTreeMap<String, String>,
}

impl ApiRequest {
    /// Create a request for an endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add several query parameters.
    pub fn params<'a>(mut self, params: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Get a query parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }
}

/// A page of API results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// Returned items.
    pub items: Vec<Value>,
    /// Total number of items across pages.
    pub total: Option<u64>,
    /// Total number of pages.
    pub total_pages: Option<u32>,
}

impl ApiResponse {
    /// Create a response from items.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            total: None,
            total_pages: None,
        }
    }

    /// Set the pagination totals.
    pub fn with_totals(mut self, total: u64, total_pages: u32) -> Self {
        self.total = Some(total);
        self.total_pages = Some(total_pages);
        self
    }
}

/// REST client used by the built-in handlers.
///
/// Failures with an HTTP status should be returned as
/// `HandlerError::Status` so they settle as error entries.
#[async_trait]
pub trait Api: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse, HandlerError>;
}
