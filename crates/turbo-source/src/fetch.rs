//! The fetch action: link to settled data entry.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::Api;
use crate::config::SourceConfig;
use crate::entry::{DataEntry, ErrorStatus};
use crate::error::{ConfigError, SourceError};
use crate::handler::{HandlerContext, HandlerError};
use crate::link::{self, concat_path};
use crate::pattern::get_match;
use crate::redirect::redirect;
use crate::registry::Registry;
use crate::store::{DataStore, FetchTicket, SharedEntry};

/// Options for `Source::fetch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Run the handler even if the entry is already settled.
    pub force: bool,
}

impl FetchOptions {
    /// Options for a forced refetch.
    pub fn force() -> Self {
        Self { force: true }
    }
}

/// A configured data source.
///
/// Owns the registry and the store; every fetch goes through `fetch`.
#[derive(Debug)]
pub struct Source {
    config: SourceConfig,
    registry: Registry,
    store: DataStore,
    home_route: String,
}

impl Source {
    /// Validate the configuration and build the registry.
    pub fn new(config: SourceConfig, api: Arc<dyn Api>) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Registry::build(&config, api)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a source over an existing registry.
    pub fn with_registry(config: SourceConfig, registry: Registry) -> Self {
        let home_route = concat_path(&[config.subdirectory_prefix()]);
        Self {
            config,
            registry,
            store: DataStore::new(),
            home_route,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Copy of the entry for a link.
    pub fn get(&self, link: &str) -> Option<DataEntry> {
        self.store.snapshot(link)
    }

    /// Shared entry for a link.
    pub fn entry(&self, link: &str) -> Option<SharedEntry> {
        self.store.get(link)
    }

    /// Fetch the data for a link into the store.
    ///
    /// Returns immediately when the entry is already fetching or settled,
    /// unless `options.force` is set. Classified failures settle the entry
    /// as an error and return `Ok`; other handler failures are returned.
    pub async fn fetch(&self, link: &str, options: FetchOptions) -> Result<(), SourceError> {
        let params = link::parse(link);
        let link = params.link();

        let Some(ticket) = self.store.begin_fetch(&link, &params, options.force) else {
            debug!(%link, "fetch skipped");
            return Ok(());
        };
        debug!(%link, force = options.force, "fetch started");

        let outcome = redirect(&params.route, &link, self.registry.redirections());
        let Some(route) = outcome.resolve(&params.route) else {
            settle_error(ticket, &link, HandlerError::not_found());
            return Ok(());
        };

        let entity_link = link::stringify(&route, &params.query, params.page, "");
        let Some(matched) = get_match(&route, &entity_link, self.registry.handlers()) else {
            warn!(%link, %route, "No handler matched");
            settle_error(ticket, &link, HandlerError::not_found());
            return Ok(());
        };

        let handler = matched.entry.name.as_str();
        debug!(%link, %route, handler, "handler matched");

        let ctx = HandlerContext {
            link: &link,
            route: &route,
            params: &matched.params,
            page: params.page,
            query: &params.query,
            store: &self.store,
            force: options.force,
        };

        match matched.entry.func.handle(ctx).await {
            Ok(content) => {
                let is_home =
                    params.route == self.home_route && !matched.is_regexp() && !params.is_search();
                debug!(%link, handler, is_home, "fetch succeeded");
                ticket.succeed(content, is_home);
                Ok(())
            }
            Err(HandlerError::Other(source)) => {
                warn!(%link, handler, error = %source, "handler failed");
                ticket.abort();
                Err(SourceError::Handler { link, source })
            }
            Err(err) => {
                settle_error(ticket, &link, err);
                Ok(())
            }
        }
    }
}

fn settle_error(ticket: FetchTicket, link: &str, err: HandlerError) {
    if let HandlerError::Status {
        status,
        status_text,
    } = err
    {
        warn!(link, status, %status_text, "fetch settled with error");
        ticket.fail(ErrorStatus::new(status, status_text));
    } else {
        ticket.abort();
    }
}
