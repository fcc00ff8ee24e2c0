//! Shared store of data entries and fetched entities.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::entry::{Content, DataEntry, ErrorStatus};
use crate::link::{self, LinkParams};

/// A data entry shared between every key that observes it.
pub type SharedEntry = Arc<RwLock<DataEntry>>;

/// Key of a stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Entity kind (`post`, `page`, `category`, ...).
    pub kind: String,
    /// Entity id.
    pub id: u64,
}

impl EntityKey {
    /// Create a new entity key.
    pub fn new(kind: impl Into<String>, id: u64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

/// Data entries keyed by link, plus the entities handlers fetched.
#[derive(Debug, Default)]
pub struct DataStore {
    data: RwLock<HashMap<String, SharedEntry>>,
    entities: RwLock<HashMap<EntityKey, Value>>,
    slugs: RwLock<HashMap<(String, String), u64>>,
    routes: RwLock<HashMap<String, EntityKey>>,
}

impl DataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the shared entry for a link.
    pub fn get(&self, link: &str) -> Option<SharedEntry> {
        self.data.read().get(&link::normalize(link)).cloned()
    }

    /// Get a copy of the entry for a link.
    pub fn snapshot(&self, link: &str) -> Option<DataEntry> {
        self.get(link).map(|entry| entry.read().clone())
    }

    /// Whether an entry exists for a link.
    pub fn contains(&self, link: &str) -> bool {
        self.data.read().contains_key(&link::normalize(link))
    }

    /// All keys with an entry.
    pub fn links(&self) -> Vec<String> {
        let mut links: Vec<String> = self.data.read().keys().cloned().collect();
        links.sort();
        links
    }

    /// Make `alias` observe the same entry as `target`.
    ///
    /// Returns `false` when `target` has no entry.
    pub fn alias(&self, alias: &str, target: &str) -> bool {
        let alias = link::normalize(alias);
        let target = link::normalize(target);
        let mut data = self.data.write();

        let Some(entry) = data.get(&target).cloned() else {
            return false;
        };
        debug!(%alias, %target, "aliasing data entry");
        data.insert(alias, entry);
        true
    }

    /// Start a fetch for `link`, or return `None` when it must be skipped.
    ///
    /// Without `force`, an entry that is fetching or settled is left alone.
    /// The check and the transition happen under the map lock, so at most
    /// one unforced fetch per link is ever in flight.
    pub fn begin_fetch(&self, link: &str, params: &LinkParams, force: bool) -> Option<FetchTicket> {
        let mut data = self.data.write();

        let Some(shared) = data.get(link).cloned() else {
            let shared = Arc::new(RwLock::new(DataEntry::fetching(link, params)));
            data.insert(link.to_string(), Arc::clone(&shared));
            return Some(FetchTicket::new(shared, false));
        };

        let mut entry = shared.write();
        if !force && (entry.is_fetching || entry.is_ready) {
            return None;
        }

        // An error entry is reset, so there is no settled state to restore.
        let was_ready = entry.is_ready && !entry.is_error();
        if entry.is_error() {
            *entry = DataEntry::fetching(link, params);
        } else {
            entry.is_fetching = true;
            entry.is_ready = false;
        }
        drop(entry);

        Some(FetchTicket::new(shared, was_ready))
    }

    /// Store an entity fetched from the API.
    ///
    /// The entity must carry a numeric `id`; its `slug` and `link` are indexed
    /// when present. Returns the id.
    pub fn insert_entity(&self, kind: &str, value: Value) -> Option<u64> {
        let id = value.get("id")?.as_u64()?;
        let key = EntityKey::new(kind, id);

        if let Some(slug) = value.get("slug").and_then(Value::as_str) {
            self.slugs
                .write()
                .insert((kind.to_string(), slug.to_string()), id);
        }
        if let Some(entity_link) = value.get("link").and_then(Value::as_str) {
            self.routes
                .write()
                .insert(link::parse(entity_link).route, key.clone());
        }
        self.entities.write().insert(key, value);
        Some(id)
    }

    /// Get an entity by kind and id.
    pub fn entity(&self, kind: &str, id: u64) -> Option<Value> {
        self.entities.read().get(&EntityKey::new(kind, id)).cloned()
    }

    /// Get an entity by kind and slug.
    pub fn entity_by_slug(&self, kind: &str, slug: &str) -> Option<(u64, Value)> {
        let id = *self
            .slugs
            .read()
            .get(&(kind.to_string(), slug.to_string()))?;
        self.entity(kind, id).map(|value| (id, value))
    }

    /// Get the key of the entity whose link resolves to `route`.
    pub fn entity_by_route(&self, route: &str) -> Option<EntityKey> {
        self.routes.read().get(route).cloned()
    }
}

/// An in-flight fetch returned by `DataStore::begin_fetch`.
///
/// Dropping a ticket that was never settled aborts it, so a cancelled
/// fetch never leaves its entry fetching.
#[derive(Debug)]
pub struct FetchTicket {
    entry: SharedEntry,
    was_ready: bool,
    settled: bool,
}

impl FetchTicket {
    fn new(entry: SharedEntry, was_ready: bool) -> Self {
        Self {
            entry,
            was_ready,
            settled: false,
        }
    }

    /// The entry being fetched.
    pub fn entry(&self) -> &SharedEntry {
        &self.entry
    }

    /// Settle the entry with content.
    pub fn succeed(mut self, content: Content, is_home: bool) {
        self.entry.write().succeed(content, is_home);
        self.settled = true;
    }

    /// Settle the entry with a classified failure.
    pub fn fail(mut self, status: ErrorStatus) {
        self.entry.write().fail(status);
        self.settled = true;
    }

    /// Leave the fetching state without settling.
    ///
    /// An entry that held content is ready again; any other entry is left
    /// unready so the next fetch runs.
    pub fn abort(self) {
        // Restored on drop.
    }

    fn restore(&self) {
        let mut entry = self.entry.write();
        entry.is_fetching = false;
        entry.is_ready = self.was_ready;
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.restore();
        }
    }
}
