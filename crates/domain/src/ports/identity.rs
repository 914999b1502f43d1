use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Identity;
use tokio::sync::RwLock;

/// Resolves an opaque bearer token into the caller's canonical identity.
///
/// Resolution happens once per request; the resulting [`Identity`] is what
/// the services compare against, never the token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns `None` for unknown tokens.
    async fn resolve(&self, token: &str) -> Option<Identity>;
}

/// Token table kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    tokens: Arc<RwLock<HashMap<String, Identity>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a token with an identity, replacing any previous one.
    pub async fn register(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.write().await.insert(token.into(), identity);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn resolve(&self, token: &str) -> Option<Identity> {
        self.tokens.read().await.get(token).copied()
    }
}
