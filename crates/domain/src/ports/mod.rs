//! Collaborators the services consume but do not own.

pub mod audit;
pub mod catalog;
pub mod identity;

pub use audit::{AuditEvent, AuditLog, RecordingAuditLog, TracingAuditLog};
pub use catalog::{Catalog, CatalogEntry, InventoryCatalog};
pub use identity::{IdentityProvider, InMemoryIdentityProvider};
