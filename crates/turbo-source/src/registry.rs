//! Handler and redirection registry.
//!
//! Built once from a `SourceConfig`. Entries are kept sorted by descending
//! priority; ties keep registration order.

use std::sync::Arc;

use tracing::debug;

use crate::api::{Api, Variant};
use crate::config::SourceConfig;
use crate::error::ConfigError;
use crate::handler::Handler;
use crate::handlers::{
    AuthorHandler, DateHandler, PostArchiveHandler, PostTypeArchiveHandler, PostTypeHandler,
    TaxonomyHandler,
};
use crate::link::concat_path;
use crate::pattern::{sort_by_priority, Params, PatternEntry};
use crate::redirect::{redirection, Redirection};

/// A route handler entry.
pub type HandlerEntry = PatternEntry<Arc<dyn Handler>>;

/// Priority of taxonomy, author and date archives.
pub const ARCHIVE_PRIORITY: i32 = 20;
/// Priority of custom post types, archives, taxonomies and redirections.
pub const DEFAULT_PRIORITY: i32 = 10;
/// Priority of custom post type query permalinks.
pub const CUSTOM_QUERY_PRIORITY: i32 = 9;
/// Priority of the built-in query permalinks.
pub const QUERY_PRIORITY: i32 = 5;
/// Priority of the root posts archive.
pub const ROOT_PRIORITY: i32 = 1;
/// Priority of the catch-all post type handler.
pub const FALLBACK_PRIORITY: i32 = 0;

/// Ordered handlers and redirections.
#[derive(Debug, Default)]
pub struct Registry {
    handlers: Vec<HandlerEntry>,
    redirections: Vec<Redirection>,
}

fn handler_entry(
    name: &str,
    priority: i32,
    pattern: &str,
    handler: impl Handler + 'static,
) -> Result<HandlerEntry, ConfigError> {
    PatternEntry::new(name, priority, pattern, Arc::new(handler) as Arc<dyn Handler>).map_err(
        |source| ConfigError::Pattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
            source,
        },
    )
}

fn redirection_entry<F>(name: &str, pattern: &str, rewrite: F) -> Result<Redirection, ConfigError>
where
    F: Fn(&Params) -> String + Send + Sync + 'static,
{
    redirection(name, DEFAULT_PRIORITY, pattern, rewrite).map_err(|source| ConfigError::Pattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn post_type(endpoints: &[&str], api: &Arc<dyn Api>) -> PostTypeHandler {
    PostTypeHandler::new(
        endpoints.iter().map(|e| e.to_string()).collect(),
        Arc::clone(api),
    )
}

fn param(params: &Params, name: &str) -> String {
    params.get(name).cloned().unwrap_or_default()
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in handlers for the variant, the declared post types
    /// and taxonomies, and the redirections for the configured paths.
    pub fn build(config: &SourceConfig, api: Arc<dyn Api>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.add_builtin_handlers(config, &api)?;
        registry.add_custom_handlers(config, &api)?;
        registry.add_redirections(config)?;

        debug!(
            handlers = registry.handlers.len(),
            redirections = registry.redirections.len(),
            variant = ?config.variant,
            "registry built"
        );
        Ok(registry)
    }

    /// Add a handler, keeping priority order.
    pub fn with_handler(mut self, entry: HandlerEntry) -> Self {
        self.push_handler(entry);
        self
    }

    /// Add a redirection, keeping priority order.
    pub fn with_redirection(mut self, entry: Redirection) -> Self {
        self.push_redirection(entry);
        self
    }

    /// Handlers in matching order.
    pub fn handlers(&self) -> &[HandlerEntry] {
        &self.handlers
    }

    /// Redirections in matching order.
    pub fn redirections(&self) -> &[Redirection] {
        &self.redirections
    }

    /// Find a handler by name.
    pub fn handler(&self, name: &str) -> Option<&HandlerEntry> {
        self.handlers.iter().find(|entry| entry.name == name)
    }

    /// Find a redirection by name.
    pub fn redirection(&self, name: &str) -> Option<&Redirection> {
        self.redirections.iter().find(|entry| entry.name == name)
    }

    fn push_handler(&mut self, entry: HandlerEntry) {
        self.handlers.push(entry);
        sort_by_priority(&mut self.handlers);
    }

    fn push_redirection(&mut self, entry: Redirection) {
        self.redirections.push(entry);
        sort_by_priority(&mut self.redirections);
    }

    fn add_builtin_handlers(&mut self, config: &SourceConfig, api: &Arc<dyn Api>) -> Result<(), ConfigError> {
        let per_page = config.per_page;

        self.push_handler(handler_entry(
            "date",
            ARCHIVE_PRIORITY,
            r"/:year(\d+)/:month(\d+)?/:day(\d+)?/",
            DateHandler::new(Arc::clone(api), per_page),
        )?);
        self.push_handler(handler_entry(
            "category",
            ARCHIVE_PRIORITY,
            "/category/(.*)?/:slug/",
            TaxonomyHandler::new("category", "categories", Arc::clone(api), per_page),
        )?);
        self.push_handler(handler_entry(
            "tag",
            ARCHIVE_PRIORITY,
            "/tag/:slug/",
            TaxonomyHandler::new("tag", "tags", Arc::clone(api), per_page),
        )?);
        self.push_handler(handler_entry(
            "author",
            ARCHIVE_PRIORITY,
            "/author/:slug/",
            AuthorHandler::new(Arc::clone(api), per_page),
        )?);
        self.push_handler(handler_entry(
            "post - query permalink",
            QUERY_PRIORITY,
            r"RegExp:(\?|&)p=(?P<id>\d+)",
            post_type(&["posts"], api),
        )?);
        self.push_handler(handler_entry(
            "page - query permalink",
            QUERY_PRIORITY,
            r"RegExp:(\?|&)page_id=(?P<id>\d+)",
            post_type(&["pages"], api),
        )?);
        if config.variant == Variant::SelfHosted {
            self.push_handler(handler_entry(
                "attachment - query permalink",
                QUERY_PRIORITY,
                r"RegExp:(\?|&)attachment_id=(?P<id>\d+)",
                post_type(&["media"], api),
            )?);
        }
        self.push_handler(handler_entry(
            "post archive",
            ROOT_PRIORITY,
            "/",
            PostArchiveHandler::new(Arc::clone(api), per_page),
        )?);
        self.push_handler(handler_entry(
            "post type",
            FALLBACK_PRIORITY,
            "/(.*)?/:slug/",
            post_type(&["posts", "pages", "media"], api),
        )?);

        Ok(())
    }

    fn add_custom_handlers(&mut self, config: &SourceConfig, api: &Arc<dyn Api>) -> Result<(), ConfigError> {
        for custom in &config.post_types {
            let name = &custom.post_type;

            self.push_handler(handler_entry(
                name,
                DEFAULT_PRIORITY,
                &format!("/{}/:slug/", name),
                PostTypeHandler::new(vec![custom.endpoint.clone()], Arc::clone(api)),
            )?);
            self.push_handler(handler_entry(
                &format!("{} - query permalink", name),
                CUSTOM_QUERY_PRIORITY,
                &format!(r"RegExp:(\?|&)p=(?P<id>\d+)&post_type={}", regex::escape(name)),
                PostTypeHandler::new(vec![custom.endpoint.clone()], Arc::clone(api)),
            )?);
            if let Some(archive) = &custom.archive {
                self.push_handler(handler_entry(
                    &format!("{} archive", name),
                    DEFAULT_PRIORITY,
                    archive,
                    PostTypeArchiveHandler::new(name, &custom.endpoint, Arc::clone(api), config.per_page),
                )?);
            }
        }

        for custom in &config.taxonomies {
            let handler = TaxonomyHandler::new(&custom.taxonomy, &custom.endpoint, Arc::clone(api), config.per_page)
                .with_post_type_endpoint(&custom.post_type_endpoint)
                .with_params(custom.params.clone());

            self.push_handler(handler_entry(
                &custom.taxonomy,
                DEFAULT_PRIORITY,
                &format!("/{}/(.*)?/:slug/", custom.taxonomy),
                handler,
            )?);
        }

        Ok(())
    }

    fn add_redirections(&mut self, config: &SourceConfig) -> Result<(), ConfigError> {
        let subdirectory = config.subdirectory_prefix();

        if let Some(homepage) = &config.homepage {
            let target = concat_path(&[homepage.as_str()]);
            self.push_redirection(redirection_entry(
                "homepage",
                &concat_path(&[subdirectory]),
                move |_| target.clone(),
            )?);
        }

        if let Some(posts_page) = &config.posts_page {
            self.push_redirection(redirection_entry(
                "posts page",
                &concat_path(&[subdirectory, posts_page.as_str()]),
                |_| "/".to_string(),
            )?);
        }

        let bases = [
            ("category", &config.category_base),
            ("tag", &config.tag_base),
            ("author", &config.author_base),
        ];
        for (default, base) in bases {
            let Some(base) = base else { continue };

            let target = format!("/{}", default);
            self.push_redirection(redirection_entry(
                &format!("{} base", default),
                &format!("{}:subpath+", concat_path(&[subdirectory, base.as_str()])),
                move |params| concat_path(&[target.as_str(), param(params, "subpath").as_str()]),
            )?);
            self.push_redirection(redirection_entry(
                &format!("{} base (reverse)", default),
                &format!("{}:subpath+", concat_path(&[subdirectory, default])),
                |_| String::new(),
            )?);
        }

        if !subdirectory.is_empty() {
            self.push_redirection(redirection_entry(
                "subdirectory",
                &format!("{}:subpath*", concat_path(&[subdirectory])),
                |params| concat_path(&[param(params, "subpath").as_str()]),
            )?);
            self.push_redirection(redirection_entry(
                "subdirectory (reverse)",
                "/:subpath*",
                |_| String::new(),
            )?);
        }

        Ok(())
    }
}
