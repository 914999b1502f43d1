//! Startup seed data: catalog targets and bearer tokens.

use std::path::Path;

use common::{Identity, Role, TargetId, TargetKind, UserId};
use domain::ports::InMemoryIdentityProvider;
use domain::{InventoryService, ServiceError};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to register seed target: {0}")]
    Service(#[from] ServiceError),
}

#[derive(Debug, Deserialize)]
pub struct SeedTarget {
    pub target_id: TargetId,
    pub kind: TargetKind,
    pub max_capacity: u32,
}

#[derive(Debug, Deserialize)]
pub struct SeedIdentity {
    pub token: String,
    pub user_id: UserId,
    #[serde(default)]
    pub role: Role,
}

/// Contents of a `SEED_FILE`.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub targets: Vec<SeedTarget>,
    #[serde(default)]
    pub identities: Vec<SeedIdentity>,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Registers the tokens and any target that does not exist yet.
    pub async fn apply(
        &self,
        inventory: &InventoryService,
        identities: &InMemoryIdentityProvider,
    ) -> Result<(), SeedError> {
        for identity in &self.identities {
            identities
                .register(
                    identity.token.clone(),
                    Identity {
                        user_id: identity.user_id,
                        role: identity.role,
                    },
                )
                .await;
        }

        for target in &self.targets {
            match inventory
                .register(target.target_id, target.kind, target.max_capacity)
                .await
            {
                Ok(_) => {}
                // Restarting against a database keeps earlier registrations
                Err(ServiceError::Validation(_)) => {
                    tracing::debug!(target_id = %target.target_id, "seed target already registered");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            targets = self.targets.len(),
            identities = self.identities.len(),
            "seed data applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use domain::ServiceSettings;
    use domain::ports::{IdentityProvider, TracingAuditLog};
    use store::InMemoryInventoryStore;

    const SEED: &str = r#"{
        "targets": [
            {"target_id": "7b0d3a9e-2f41-4c56-9d0a-1e2b3c4d5e6f", "kind": "trip", "max_capacity": 12}
        ],
        "identities": [
            {"token": "alice", "user_id": "0f6c2a4e-8b1d-4e3f-a5c7-9d2e4f6a8b0c"},
            {"token": "root", "user_id": "5a7c9e1b-3d5f-4a6b-8c0d-2e4f6a8b0c1d", "role": "admin"}
        ]
    }"#;

    #[tokio::test]
    async fn applying_twice_is_harmless() {
        let seed: Seed = serde_json::from_str(SEED).unwrap();
        let inventory = InventoryService::new(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(TracingAuditLog),
            ServiceSettings::default(),
        );
        let identities = InMemoryIdentityProvider::new();

        seed.apply(&inventory, &identities).await.unwrap();
        seed.apply(&inventory, &identities).await.unwrap();

        let capacity = inventory
            .capacity(seed.targets[0].target_id)
            .await
            .unwrap();
        assert_eq!(capacity.max_capacity, 12);
        assert_eq!(identities.resolve("root").await.unwrap().role, Role::Admin);
        assert_eq!(identities.resolve("alice").await.unwrap().role, Role::User);
    }
}
