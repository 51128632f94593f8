//! Gathering engine: the two pure-ish units behind the gathering service.
//!
//! - Role drawing: slot validation, token pool expansion, Fisher–Yates shuffle,
//!   built-in presets, and the draw/reset service that commits to storage.
//! - Reputation: activity-scoped and free-scope vote casting, batch evaluations,
//!   and full-recompute score tallies.
//!
//! Storage, notification delivery and privilege lookups are collaborators behind
//! the traits in [`store`].

pub mod config;
pub mod error;
#[cfg(test)]
mod memory;
pub mod reputation;
pub mod roles;
pub mod store;

pub use config::EngineConfig;
pub use error::{AuthorizationError, ConflictError, EngineError, ValidationError};
pub use reputation::{
    Ballot, BatchOutcome, CastOutcome, FreeVoteState, ReputationAggregator, RowError, VoteTransition,
};
pub use roles::{RoleDrawService, assign, assign_with_rng, presets::Preset};
pub use store::{
    ActivityDirectory, AssignmentStore, Clock, EvaluationWrite, Notifier, PrivilegeCheck, SystemClock,
    VoteStore,
};
