//! Campaign lifecycle state machine.
//!
//! Only four writes are explicit: payment confirmation, reviewer approval or
//! rejection, and the administrative pause/resume override. `active`,
//! `scheduled` and `completed` are derived from the stored status and the
//! date window at read time and are never written back.

use chrono::{DateTime, NaiveDate, Utc};
use listing_ads_core::types::{Campaign, CampaignId, CampaignStatus, LifecycleAction};
use listing_ads_core::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};

/// Status as observed at a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Draft,
    PendingReview,
    /// Approved, window not yet open.
    Scheduled,
    Active,
    Completed,
    Rejected,
    Paused,
}

/// A recorded lifecycle write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub campaign_id: CampaignId,
    pub from: CampaignStatus,
    pub to: CampaignStatus,
    pub action: LifecycleAction,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

/// Derive the status a campaign actually has on `as_of`.
///
/// A stored `active` is treated the same as `approved`, so a record whose
/// window has lapsed reads as completed even if nothing rewrote it.
pub fn effective_status(campaign: &Campaign, as_of: NaiveDate) -> EffectiveStatus {
    match campaign.status {
        CampaignStatus::Approved | CampaignStatus::Active => {
            if as_of < campaign.start_date {
                EffectiveStatus::Scheduled
            } else if as_of > campaign.end_date {
                EffectiveStatus::Completed
            } else {
                EffectiveStatus::Active
            }
        }
        CampaignStatus::Completed => EffectiveStatus::Completed,
        CampaignStatus::Draft => EffectiveStatus::Draft,
        CampaignStatus::PendingReview => EffectiveStatus::PendingReview,
        CampaignStatus::Rejected => EffectiveStatus::Rejected,
        CampaignStatus::Paused => EffectiveStatus::Paused,
    }
}

/// Only derived-active campaigns are eligible for display.
pub fn is_eligible(campaign: &Campaign, as_of: NaiveDate) -> bool {
    effective_status(campaign, as_of) == EffectiveStatus::Active
}

/// Validate `action` against the campaign's current state and return the
/// status to persist.
pub fn next_status(
    campaign: &Campaign,
    action: LifecycleAction,
    as_of: NaiveDate,
) -> CampaignResult<CampaignStatus> {
    let current = campaign.status;
    let next = match (current, action) {
        (CampaignStatus::Draft, LifecycleAction::ConfirmPayment) => {
            Some(CampaignStatus::PendingReview)
        }
        (CampaignStatus::PendingReview, LifecycleAction::Approve) => Some(CampaignStatus::Approved),
        (CampaignStatus::PendingReview, LifecycleAction::Reject) => Some(CampaignStatus::Rejected),
        (CampaignStatus::Approved | CampaignStatus::Active, LifecycleAction::Pause) => {
            match effective_status(campaign, as_of) {
                EffectiveStatus::Scheduled | EffectiveStatus::Active => {
                    Some(CampaignStatus::Paused)
                }
                _ => None,
            }
        }
        (CampaignStatus::Paused, LifecycleAction::Resume) => Some(CampaignStatus::Approved),
        _ => None,
    };

    next.ok_or(CampaignError::InvalidTransition {
        from: current,
        action,
    })
}
