//! Client authentication trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::ClientId;

/// Trait for resolving an API key to a client identity.
///
/// The orchestrator trusts the returned client id for ownership checks.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves an API key. Returns None for unknown keys.
    async fn authenticate(&self, api_key: &str) -> Option<ClientId>;
}

/// In-memory auth provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthProvider {
    keys: Arc<RwLock<HashMap<String, ClientId>>>,
}

impl InMemoryAuthProvider {
    /// Creates a new in-memory auth provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an API key for a client.
    pub fn add_key(&self, api_key: impl Into<String>, client_id: ClientId) {
        self.keys.write().unwrap().insert(api_key.into(), client_id);
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn authenticate(&self, api_key: &str) -> Option<ClientId> {
        self.keys.read().unwrap().get(api_key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_key_resolves() {
        let auth = InMemoryAuthProvider::new();
        let client_id = ClientId::new();
        auth.add_key("key-1", client_id);

        assert_eq!(auth.authenticate("key-1").await, Some(client_id));
        assert_eq!(auth.authenticate("key-2").await, None);
    }
}
