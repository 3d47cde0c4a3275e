//! Process-wide API credential.
//!
//! The remote client never caches the key: it asks a [`CredentialSource`]
//! on every call, so a key selected mid-session takes effect on the very
//! next request without rebuilding the client.

use std::sync::{Arc, RwLock};

/// Anything that can hand out the current API key at call time.
pub trait CredentialSource: Send + Sync {
    /// The current key, or `None` when no usable key is configured.
    fn api_key(&self) -> Option<String>;
}

/// Shared, mutable holder for the API key.
///
/// Cloning shares the same slot. Blank keys are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    key: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from an environment variable, if it is set.
    pub fn from_env(var: &str) -> Self {
        let store = Self::new();
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => {
                store.set(value);
                tracing::debug!(var, "API key loaded from environment");
            }
            _ => tracing::debug!(var, "No API key in environment"),
        }
        store
    }

    /// Replace the current key.
    pub fn set(&self, key: impl Into<String>) {
        let key = key.into();
        let mut slot = self.key.write().expect("credential lock poisoned");
        *slot = if key.trim().is_empty() {
            None
        } else {
            Some(key.trim().to_string())
        };
    }

    /// Forget the current key.
    pub fn clear(&self) {
        *self.key.write().expect("credential lock poisoned") = None;
    }

    pub fn is_set(&self) -> bool {
        self.api_key().is_some()
    }
}

impl CredentialSource for CredentialStore {
    fn api_key(&self) -> Option<String> {
        self.key.read().expect("credential lock poisoned").clone()
    }
}
