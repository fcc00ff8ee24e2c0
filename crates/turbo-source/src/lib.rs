//! Headless CMS data source for the TurboCommerce framework.
//!
//! This crate maps links to CMS resources and keeps their fetch state:
//! - `link` - Link parsing and normalization (the cache key)
//! - `Pattern` / `get_match` - Route pattern matching with named parameters
//! - `redirect` - Path rewrites applied before handler matching
//! - `Registry` - Ordered handlers and redirections built from `SourceConfig`
//! - `DataStore` / `DataEntry` - Per-link fetch state and fetched entities
//! - `Source::fetch` - normalize, redirect, match, invoke handler, settle
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use turbo_source::{FetchOptions, Source, SourceConfig};
//!
//! let config = SourceConfig::new("https://cms.example.com/wp-json/")
//!     .with_subdirectory("/blog")
//!     .with_post_type("movie", "movies", None);
//!
//! let source = Source::new(config, Arc::new(my_api))?;
//! source.fetch("/blog/movie/inception/", FetchOptions::default()).await?;
//!
//! let entry = source.get("/blog/movie/inception/").unwrap();
//! assert!(entry.is_ready);
//! ```

pub mod handlers;
pub mod link;

mod api;
mod config;
mod entry;
mod error;
mod fetch;
mod handler;
mod pattern;
mod redirect;
mod registry;
mod store;

pub use api::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use fetch::*;
pub use handler::*;
pub use link::{LinkParams, Query};
pub use pattern::*;
pub use redirect::*;
pub use registry::*;
pub use store::*;
