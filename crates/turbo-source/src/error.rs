//! Error types for the data source.

use thiserror::Error;

use crate::pattern::PatternError;

/// Errors raised while validating configuration or building the registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A handler or redirection pattern failed to compile.
    #[error("invalid pattern `{pattern}` for `{name}`: {source}")]
    Pattern {
        name: String,
        pattern: String,
        #[source]
        source: PatternError,
    },

    /// The API base URL could not be parsed.
    #[error("invalid API url `{url}`: {source}")]
    ApiUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A base path override does not start with `/`.
    #[error("`{field}` must start with '/': {value}")]
    InvalidPath { field: &'static str, value: String },

    /// A post type or taxonomy is declared without a name or endpoint.
    #[error("{0} declared with an empty name or endpoint")]
    EmptyName(&'static str),

    /// A post type or taxonomy is declared twice.
    #[error("duplicate {kind} `{name}`")]
    Duplicate { kind: &'static str, name: String },
}

/// Errors returned by `Source::fetch`.
///
/// Classified failures (HTTP-like statuses) never surface here; they settle
/// the data entry as an error instead.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A handler failed with an unclassified error.
    #[error("fetch of {link} failed: {source}")]
    Handler {
        link: String,
        #[source]
        source: anyhow::Error,
    },
}
