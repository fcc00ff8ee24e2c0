//! Host navigation interface.

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

/// A back/forward navigation reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PopEvent {
    /// Link the host navigated to.
    pub link: String,
    /// State payload stored with that history entry.
    pub state: Value,
}

/// Host history (the browser's, or an in-memory one).
pub trait History: Send + Sync {
    /// Add a history entry.
    fn push(&self, link: &str, state: &Value);

    /// Replace the current history entry.
    fn replace(&self, link: &str, state: &Value);

    /// Current address as seen by the host.
    fn location(&self) -> String;

    /// Receive back/forward navigations.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PopEvent>;
}

#[derive(Debug)]
struct Inner {
    entries: Vec<(String, Value)>,
    index: usize,
    subscribers: Vec<mpsc::UnboundedSender<PopEvent>>,
}

/// In-process history for servers, tests and non-browser hosts.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<Inner>,
}

impl MemoryHistory {
    /// Create a history with a single entry.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: vec![(location.into(), Value::Null)],
                index: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Go back one entry. Returns `false` at the first entry.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Go forward one entry. Returns `false` at the last entry.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the history is empty. Never true; a history has a location.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// State payload of the current entry.
    pub fn state(&self) -> Value {
        let inner = self.inner.lock();
        inner.entries[inner.index].1.clone()
    }

    /// Links of all entries, oldest first.
    pub fn links(&self) -> Vec<String> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(link, _)| link.clone())
            .collect()
    }

    fn go(&self, delta: isize) -> bool {
        let mut inner = self.inner.lock();
        let Some(index) = inner.index.checked_add_signed(delta) else {
            return false;
        };
        if index >= inner.entries.len() {
            return false;
        }
        inner.index = index;

        let (link, state) = inner.entries[index].clone();
        let event = PopEvent { link, state };
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        true
    }
}

impl History for MemoryHistory {
    fn push(&self, link: &str, state: &Value) {
        let mut inner = self.inner.lock();
        let next = inner.index + 1;
        inner.entries.truncate(next);
        inner.entries.push((link.to_string(), state.clone()));
        inner.index = next;
    }

    fn replace(&self, link: &str, state: &Value) {
        let mut inner = self.inner.lock();
        let index = inner.index;
        inner.entries[index] = (link.to_string(), state.clone());
    }

    fn location(&self) -> String {
        let inner = self.inner.lock();
        inner.entries[inner.index].0.clone()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<PopEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push("/a/", &json!({}));
        history.push("/b/", &json!({}));
        assert!(history.back());

        history.push("/c/", &json!({}));

        assert_eq!(history.links(), ["/", "/a/", "/c/"]);
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let history = MemoryHistory::new("/old/");
        history.replace("/new/", &json!({ "scroll": 10 }));

        assert_eq!(history.len(), 1);
        assert_eq!(history.location(), "/new/");
        assert_eq!(history.state(), json!({ "scroll": 10 }));
    }

    #[test]
    fn test_back_and_forward_emit_events() {
        let history = MemoryHistory::new("/");
        let mut events = history.subscribe();
        history.push("/a/", &json!({ "from": "push" }));

        assert!(history.back());
        assert_eq!(events.try_recv().unwrap().link, "/");

        assert!(history.forward());
        let event = events.try_recv().unwrap();
        assert_eq!(event.link, "/a/");
        assert_eq!(event.state, json!({ "from": "push" }));
    }

    #[test]
    fn test_bounds() {
        let history = MemoryHistory::new("/");
        let mut events = history.subscribe();

        assert!(!history.back());
        assert!(!history.forward());
        assert!(events.try_recv().is_err());
    }
}
