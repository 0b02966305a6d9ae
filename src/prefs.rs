//! Client preferences kept across page loads.

use std::collections::HashMap;

pub const PANE_COLLAPSED_KEY: &str = "erd:leftPane:collapsed";

/// String key-value storage, e.g. the browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore(HashMap<String, String>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }
}

/// Collapsed state of the side panel. Read once when created, written on
/// every change.
#[derive(Debug)]
pub struct PanePrefs<S> {
    store: S,
    collapsed: bool,
}

impl<S: KeyValueStore> PanePrefs<S> {
    pub fn load(store: S) -> Self {
        let collapsed = store.get(PANE_COLLAPSED_KEY).as_deref() == Some("true");
        Self { store, collapsed }
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
        self.store
            .set(PANE_COLLAPSED_KEY, if collapsed { "true" } else { "false" });
    }

    /// Flip the panel; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.set_collapsed(!self.collapsed);
        self.collapsed
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_expanded() {
        let p = PanePrefs::load(MemoryStore::default());
        assert!(!p.is_collapsed());
        let mut store = MemoryStore::default();
        store.set(PANE_COLLAPSED_KEY, "yes");
        assert!(!PanePrefs::load(store).is_collapsed());
    }

    #[test]
    fn test_toggle_persists() {
        let mut p = PanePrefs::load(MemoryStore::default());
        assert!(p.toggle());
        let store = p.into_store();
        assert_eq!(store.get(PANE_COLLAPSED_KEY).as_deref(), Some("true"));

        let mut p = PanePrefs::load(store);
        assert!(p.is_collapsed());
        assert!(!p.toggle());
        assert_eq!(p.into_store().get(PANE_COLLAPSED_KEY).as_deref(), Some("false"));
    }
}
