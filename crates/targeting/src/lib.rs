//! Ad campaign targeting: geo matching, priority ranking, plan quota
//! enforcement, and the campaign lifecycle.
//!
//! Everything here is a pure function over a campaign snapshot. Persistence
//! and per-campaign write serialization belong to the store.

pub mod engine;
pub mod lifecycle;
pub mod matcher;
pub mod quota;
pub mod ranker;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{PlacementOutcome, TargetingEngine};
pub use lifecycle::{
    effective_status, is_eligible, next_status, EffectiveStatus, StatusTransition,
};
pub use matcher::{GeoMatcher, MatchOutcome, RejectedCampaign};
pub use quota::{
    apply_targeting_change, validate_targeting, TargetingChange, TargetingOp, TargetingSelection,
};
pub use ranker::rank;
