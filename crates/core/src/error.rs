use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CampaignStatus, LifecycleAction};

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Invalid viewer location: {0}")]
    InvalidViewer(String),

    #[error("Invalid schedule for campaign {campaign_id}: end {end} precedes start {start}")]
    InvalidSchedule {
        campaign_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("City `{slug}` targets country {country_code}, which is not selected")]
    OrphanedCity { country_code: String, slug: String },

    #[error("Invalid transition: cannot {action:?} from {from:?}")]
    InvalidTransition {
        from: CampaignStatus,
        action: LifecycleAction,
    },

    #[error("{resource} `{id}` not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("As-of date overrides are disabled")]
    SimulationDisabled,
}

impl CampaignError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidViewer(_) => "invalid_viewer",
            Self::InvalidSchedule { .. } => "invalid_schedule",
            Self::Quota(q) => q.kind.as_str(),
            Self::OrphanedCity { .. } => "orphaned_city",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NotFound { .. } => "not_found",
            Self::VersionConflict { .. } => "version_conflict",
            Self::SimulationDisabled => "simulation_disabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaErrorKind {
    TooManyCountries,
    TooManyCities,
}

impl QuotaErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooManyCountries => "too_many_countries",
            Self::TooManyCities => "too_many_cities",
        }
    }
}

/// A plan allowance was exceeded. Recoverable: the advertiser narrows the
/// selection and retries.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("plan `{plan_code}` allows {limit}, requested {requested} ({})", .kind.as_str())]
pub struct QuotaError {
    pub kind: QuotaErrorKind,
    pub plan_code: String,
    pub limit: u32,
    pub requested: usize,
}
