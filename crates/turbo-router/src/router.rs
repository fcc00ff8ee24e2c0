//! Current link state, kept in sync with the host history.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use turbo_source::{link, FetchOptions, Source, SourceError};

use crate::history::History;

/// Router errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The automatic fetch of the new link failed.
    #[error(transparent)]
    Fetch(#[from] SourceError),
}

/// How `Router::set` updates the host history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMethod {
    /// Add a history entry.
    #[default]
    Push,
    /// Replace the current history entry.
    Replace,
    /// The host already navigated (back/forward); history is left alone.
    Pop,
}

/// Options for `Router::set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    pub method: NavigationMethod,
    /// State payload for the history entry. Defaults to an empty object.
    pub state: Option<Value>,
}

impl SetOptions {
    /// Push a new history entry.
    pub fn push() -> Self {
        Self::default()
    }

    /// Replace the current history entry.
    pub fn replace() -> Self {
        Self {
            method: NavigationMethod::Replace,
            state: None,
        }
    }

    /// Follow a navigation the host already made.
    pub fn pop() -> Self {
        Self {
            method: NavigationMethod::Pop,
            state: None,
        }
    }

    /// Set the state payload.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Snapshot of the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterState {
    /// Current normalized link.
    pub link: String,
    /// State payload of the current history entry.
    pub state: Value,
    /// Whether `set` fetches the new link.
    pub auto_fetch: bool,
}

impl RouterState {
    fn new(link: String) -> Self {
        Self {
            link,
            state: json!({}),
            auto_fetch: true,
        }
    }
}

/// Tracks the current link and drives fetches on navigation.
pub struct Router {
    source: Arc<Source>,
    history: Option<Arc<dyn History>>,
    state: RwLock<RouterState>,
}

impl Router {
    /// Router for a server render: the link comes from the request and the
    /// history is never touched.
    pub fn init_server(source: Arc<Source>, initial_link: &str) -> Self {
        let link = link::normalize(initial_link);
        debug!(%link, "router initialized on server");
        Self {
            source,
            history: None,
            state: RwLock::new(RouterState::new(link)),
        }
    }

    /// Router for a client taking over a server render.
    ///
    /// The link is reconciled with the address the host reports and the
    /// current history entry is replaced with it. When the two differ, the
    /// host's link is aliased to the server's data entry.
    pub fn init_client(source: Arc<Source>, history: Arc<dyn History>, server_link: &str) -> Self {
        let server_link = link::normalize(server_link);
        let link = link::normalize(&history.location());
        let state = RouterState::new(link.clone());

        history.replace(&link, &state.state);
        if link != server_link && source.store().alias(&link, &server_link) {
            debug!(%link, %server_link, "client link differs from server link");
        }

        Self {
            source,
            history: Some(history),
            state: RwLock::new(state),
        }
    }

    /// Navigate to a link.
    ///
    /// Updates the host history (unless popping), then the current link and
    /// state, then fetches the link when auto-fetch is on.
    pub async fn set(&self, link: &str, options: SetOptions) -> Result<(), RouterError> {
        let link = link::normalize(link);
        let state = options.state.unwrap_or_else(|| json!({}));

        if let Some(history) = &self.history {
            match options.method {
                NavigationMethod::Push => history.push(&link, &state),
                NavigationMethod::Replace => history.replace(&link, &state),
                NavigationMethod::Pop => {}
            }
        }

        let auto_fetch = {
            let mut current = self.state.write();
            current.link = link.clone();
            current.state = state;
            current.auto_fetch
        };
        debug!(%link, method = ?options.method, auto_fetch, "router set");

        if auto_fetch {
            self.source.fetch(&link, FetchOptions::default()).await?;
        }
        Ok(())
    }

    /// Replace the state payload of the current entry without navigating.
    pub fn update_state(&self, state: Value) {
        let mut current = self.state.write();
        if let Some(history) = &self.history {
            history.replace(&current.link, &state);
        }
        current.state = state;
    }

    /// Follow back/forward navigations of the host.
    ///
    /// Returns `None` on the server, where there is no history to follow.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self.history.as_ref()?.subscribe();
        let router = Arc::clone(self);

        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let options = SetOptions::pop().with_state(event.state);
                if let Err(err) = router.set(&event.link, options).await {
                    warn!(link = %event.link, error = %err, "fetch after history pop failed");
                }
            }
        }))
    }

    /// Current link.
    pub fn link(&self) -> String {
        self.state.read().link.clone()
    }

    /// Current state payload.
    pub fn state(&self) -> Value {
        self.state.read().state.clone()
    }

    /// Copy of the router state.
    pub fn snapshot(&self) -> RouterState {
        self.state.read().clone()
    }

    /// Whether `set` fetches the new link.
    pub fn auto_fetch(&self) -> bool {
        self.state.read().auto_fetch
    }

    /// Turn fetching on `set` on or off.
    pub fn set_auto_fetch(&self, auto_fetch: bool) {
        self.state.write().auto_fetch = auto_fetch;
    }

    /// Whether this router follows a host history.
    pub fn is_client(&self) -> bool {
        self.history.is_some()
    }

    /// The data source this router fetches from.
    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }
}
