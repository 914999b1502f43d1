//! Like/dislike toggling with aggregate counters.

mod service;
mod toggle;

pub use service::{ReactionService, ToggleOutcome};
pub use toggle::Transition;
