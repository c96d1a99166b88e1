//! Management API types: requests, responses, audit log.

use chrono::{DateTime, NaiveDate, Utc};
use listing_ads_core::types::{
    AdLevel, Campaign, CampaignId, LifecycleAction, Placement, TargetCity, ViewerLocation,
};
use listing_ads_targeting::{EffectiveStatus, TargetingChange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub plan_code: String,
    pub ad_level: AdLevel,
    #[serde(default)]
    pub target_countries: BTreeSet<String>,
    #[serde(default)]
    pub target_cities: BTreeSet<TargetCity>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub budget: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTargetingRequest {
    pub expected_version: u64,
    pub change: TargetingChange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleRequest {
    pub action: LifecycleAction,
    pub expected_version: u64,
    /// QA override for date-gated checks.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// A stored campaign plus its status as derived today.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub effective_status: EffectiveStatus,
}

// ─── Placements ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PlacementQuery {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub city_slug: String,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Fail the request on the first invalid campaign record instead of
    /// skipping it.
    #[serde(default)]
    pub strict: bool,
}

impl PlacementQuery {
    pub fn viewer(&self) -> ViewerLocation {
        ViewerLocation::new(self.country_code.clone(), self.city_slug.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementResponse {
    pub as_of: NaiveDate,
    pub viewer: ViewerLocation,
    pub placements: Vec<Placement>,
    /// Campaigns skipped because their record could not be evaluated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<CampaignId>,
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    UpdateTargeting,
    Lifecycle,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
