//! Router state for the TurboCommerce CMS source.
//!
//! Keeps the current link in sync with the host history and fetches the
//! data for every navigation:
//!
//! ```text
//! server render:  init_server(link)              -> state.link
//! client start:   init_client(history, link)     -> reconcile, replace, alias
//! navigation:     set(link, Push | Replace)      -> history, state, fetch
//! back/forward:   listen() -> PopEvent -> set(link, Pop)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_router::prelude::*;
//!
//! let history = Arc::new(MemoryHistory::new("/blog/"));
//! let router = Arc::new(Router::init_client(source, history, "/blog/"));
//! router.listen();
//!
//! router.set("/blog/hello-world/", SetOptions::push()).await?;
//! ```

pub mod prelude;

mod history;
mod router;

pub use history::*;
pub use router::*;
