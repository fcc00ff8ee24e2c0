//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use turbo_router::prelude::*;
//! ```

pub use crate::{History, MemoryHistory, NavigationMethod, PopEvent, Router, RouterState, SetOptions};
pub use turbo_source::{FetchOptions, Source, SourceConfig};
