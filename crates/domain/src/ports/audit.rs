use std::sync::{Arc, Mutex};

use common::{CancelledBy, Quantity, ReactionKind, ReservationId, TargetId, UserId};
use serde::Serialize;

/// A business fact worth keeping a side-channel record of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    ReservationCreated {
        reservation_id: ReservationId,
        target_id: TargetId,
        owner_id: UserId,
        quantity: Quantity,
    },
    ReservationCancelled {
        reservation_id: ReservationId,
        target_id: TargetId,
        actor_id: UserId,
        cancelled_by: CancelledBy,
    },
    ReactionToggled {
        target_id: TargetId,
        user_id: UserId,
        reaction: Option<ReactionKind>,
    },
    CapacityAdjusted {
        target_id: TargetId,
        actor_id: UserId,
        max_capacity: u32,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::ReservationCreated { .. } => "reservation_created",
            AuditEvent::ReservationCancelled { .. } => "reservation_cancelled",
            AuditEvent::ReactionToggled { .. } => "reaction_toggled",
            AuditEvent::CapacityAdjusted { .. } => "capacity_adjusted",
        }
    }
}

/// Fire-and-forget audit sink. Recording can never fail the operation.
pub trait AuditLog: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record(&self, event: AuditEvent) {
        tracing::info!(target: "audit", event = event.name(), details = ?event, "audit");
    }
}

/// Keeps audit events in memory so they can be inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditLog {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditLog for RecordingAuditLog {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
