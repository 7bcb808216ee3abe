//! Building and loading a tree off the calling thread
//!
//! Parsing the document and reading the store are blocking work, so they
//! run on tokio's blocking pool. Each result comes back through a oneshot
//! channel. Starting a new load makes every earlier one stale, and a stale
//! result is dropped instead of returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::factory;
use crate::preference::PreferenceGroup;
use crate::resources::ResourceResolver;
use crate::store::PreferenceStore;

/// A loaded tree and the store it was loaded from
#[derive(Debug)]
pub struct LoadedPreferences<S> {
    pub group: PreferenceGroup,
    pub store: S,
}

pub struct PreferenceLoader {
    resolver: Arc<dyn ResourceResolver + Send + Sync>,
    generation: Arc<AtomicU64>,
}

impl PreferenceLoader {
    pub fn new(resolver: Arc<dyn ResourceResolver + Send + Sync>) -> Self {
        Self {
            resolver,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start building `definitions` against `store`. Must be called from
    /// within a tokio runtime.
    pub fn spawn<S>(&self, definitions: String, mut store: S) -> PendingLoad<S>
    where
        S: PreferenceStore + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let resolver = Arc::clone(&self.resolver);
        let (sender, receiver) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let result = factory::load_document(&definitions, resolver.as_ref(), &mut store)
                .map(|group| LoadedPreferences { group, store });
            // The receiver may already be gone
            let _ = sender.send(result);
        });

        debug!(generation, "Started preference load");
        PendingLoad {
            generation,
            current: Arc::clone(&self.generation),
            receiver,
        }
    }

    /// Make every outstanding load stale
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Cancelled outstanding preference loads");
    }
}

/// Result of a [`PreferenceLoader::spawn`] that has not been collected yet
pub struct PendingLoad<S> {
    generation: u64,
    current: Arc<AtomicU64>,
    receiver: oneshot::Receiver<Result<LoadedPreferences<S>, LoadError>>,
}

impl<S> PendingLoad<S> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }

    /// Wait for the worker. `Ok(None)` means a newer load superseded this one.
    pub async fn wait(self) -> Result<Option<LoadedPreferences<S>>, LoadError> {
        let result = self
            .receiver
            .await
            .map_err(|_| LoadError::Worker("load task ended without a result".to_string()))?;

        if self.current.load(Ordering::SeqCst) != self.generation {
            info!(generation = self.generation, "Discarding stale preference load");
            return Ok(None);
        }
        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::LiteralResources;
    use crate::store::{MemoryStore, StoreEditor};

    const DEFINITIONS: &str = r#"{"prefs": "bg", "items": [
        { "type": "boolean", "key": "enabled", "checked": false },
        { "key": "detail", "if": "enabled == true" }
    ]}"#;

    fn loader() -> PreferenceLoader {
        PreferenceLoader::new(Arc::new(LiteralResources))
    }

    #[tokio::test]
    async fn test_load_in_background() {
        let mut store = MemoryStore::new();
        let mut editor = StoreEditor::new();
        editor.put_bool("enabled", true);
        store.commit(editor).unwrap();

        let loaded = loader()
            .spawn(DEFINITIONS.to_string(), store)
            .wait()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.group.namespace, "bg");
        assert_eq!(loaded.group.displayable_len(), 2);
        assert!(loaded.store.get_bool("enabled", false));
    }

    #[tokio::test]
    async fn test_newer_load_discards_older() {
        let loader = loader();
        let first = loader.spawn(DEFINITIONS.to_string(), MemoryStore::new());
        let second = loader.spawn(DEFINITIONS.to_string(), MemoryStore::new());

        assert!(first.is_stale());
        assert!(!second.is_stale());
        assert!(first.wait().await.unwrap().is_none());
        assert!(second.wait().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_discards_outstanding() {
        let loader = loader();
        let pending = loader.spawn(DEFINITIONS.to_string(), MemoryStore::new());
        loader.cancel();
        assert!(pending.wait().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_errors_are_returned() {
        let result = loader()
            .spawn(r#"{"items": []}"#.to_string(), MemoryStore::new())
            .wait()
            .await;
        assert!(matches!(result, Err(LoadError::Empty { .. })));
    }
}
