//! Name → channel lookup, used to resolve `reply-channel` headers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sy_types::{DestinationResolver, MessageChannel};
use tracing::debug;

/// Thread-safe registry of named channels.
pub struct ChannelRegistry<T> {
    channels: RwLock<HashMap<String, Arc<dyn MessageChannel<T>>>>,
}

impl<T> Default for ChannelRegistry<T> {
    fn default() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> ChannelRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under its own name, replacing any previous one.
    pub fn register(&self, channel: Arc<dyn MessageChannel<T>>) -> Option<Arc<dyn MessageChannel<T>>> {
        let name = channel.name().to_string();
        debug!(channel = %name, "Channel registered");
        self.channels.write().insert(name, channel)
    }

    /// Remove a channel by name.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn MessageChannel<T>>> {
        self.channels.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MessageChannel<T>>> {
        self.channels.read().get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}

impl<T> DestinationResolver<T> for ChannelRegistry<T> {
    fn resolve(&self, name: &str) -> Option<Arc<dyn MessageChannel<T>>> {
        self.get(name)
    }
}
