use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::{CampaignError, CampaignResult};

pub type CampaignId = Uuid;

// ─── Campaign ──────────────────────────────────────────────────────────────

/// Stored lifecycle status. `Active` and `Completed` may appear on records
/// written by older tooling; eligibility is always re-derived from dates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    PendingReview,
    Approved,
    Active,
    Rejected,
    Paused,
    Completed,
}

/// Geographic scope the advertiser purchased.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdLevel {
    City,
    Country,
    Region,
    Global,
}

impl AdLevel {
    /// Broadest tier a campaign of this level may match at.
    pub fn widest_tier(self) -> u8 {
        match self {
            AdLevel::City => MatchedScope::City.tier(),
            AdLevel::Country => MatchedScope::Country.tier(),
            AdLevel::Region => MatchedScope::Region.tier(),
            AdLevel::Global => MatchedScope::Global.tier(),
        }
    }
}

/// A targeted city. The owning country is carried alongside the slug so the
/// country → city cascade can be enforced without a city directory lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetCity {
    pub country_code: String,
    pub slug: String,
}

impl TargetCity {
    pub fn new(country_code: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            slug: slug.into(),
        }
        .normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            country_code: normalize_country(&self.country_code),
            slug: normalize_slug(&self.slug),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
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
    /// Plan limits captured at purchase time.
    pub plan: Plan,
    /// Bumped on every write; used for optimistic concurrency.
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Campaign {
    /// Rejects records whose date window is inverted.
    pub fn validate_schedule(&self) -> CampaignResult<()> {
        if self.end_date < self.start_date {
            return Err(CampaignError::InvalidSchedule {
                campaign_id: self.id,
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Inclusive `[start_date, end_date]` check.
    pub fn in_window(&self, as_of: NaiveDate) -> bool {
        self.start_date <= as_of && as_of <= self.end_date
    }
}

// ─── Plans ─────────────────────────────────────────────────────────────────

/// Per-plan geographic allowance: a fixed count or unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuotaRepr", into = "QuotaRepr")]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    pub fn allows(self, requested: usize) -> bool {
        match self {
            Quota::Unlimited => true,
            Quota::Limited(limit) => requested <= limit as usize,
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Limited(n) => write!(f, "{n}"),
            Quota::Unlimited => f.write_str("unlimited"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QuotaRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<QuotaRepr> for Quota {
    type Error = String;

    fn try_from(repr: QuotaRepr) -> Result<Self, Self::Error> {
        match repr {
            QuotaRepr::Count(n) => Ok(Quota::Limited(n)),
            QuotaRepr::Keyword(s) if s.eq_ignore_ascii_case("unlimited") => Ok(Quota::Unlimited),
            QuotaRepr::Keyword(s) => Err(format!(
                "invalid quota `{s}`: expected integer or \"unlimited\""
            )),
        }
    }
}

impl From<Quota> for QuotaRepr {
    fn from(quota: Quota) -> Self {
        match quota {
            Quota::Limited(n) => QuotaRepr::Count(n),
            Quota::Unlimited => QuotaRepr::Keyword("unlimited".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub code: String,
    pub name: String,
    pub countries_included: Quota,
    pub cities_included: Quota,
    pub duration_months: u32,
}

// ─── Viewer & match results ────────────────────────────────────────────────

/// Request-scoped viewer location, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerLocation {
    pub country_code: String,
    #[serde(default)]
    pub city_slug: String,
}

impl ViewerLocation {
    pub fn new(country_code: impl Into<String>, city_slug: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            city_slug: city_slug.into(),
        }
    }

    /// Upper-cases the country code and lower-cases the city slug.
    /// A blank country code is rejected.
    pub fn normalized(&self) -> CampaignResult<Self> {
        let country_code = normalize_country(&self.country_code);
        if country_code.is_empty() {
            return Err(CampaignError::InvalidViewer(
                "country_code is required".to_string(),
            ));
        }
        Ok(Self {
            country_code,
            city_slug: normalize_slug(&self.city_slug),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchedScope {
    City,
    Country,
    /// Reserved. No campaign data populates region targets yet.
    Region,
    Global,
}

impl MatchedScope {
    pub fn tier(self) -> u8 {
        match self {
            MatchedScope::City => 1,
            MatchedScope::Country => 2,
            MatchedScope::Region => 3,
            MatchedScope::Global => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub campaign: Campaign,
    pub matched_scope: MatchedScope,
    pub tier: u8,
}

impl MatchResult {
    pub fn new(campaign: Campaign, matched_scope: MatchedScope) -> Self {
        Self {
            campaign,
            matched_scope,
            tier: matched_scope.tier(),
        }
    }
}

/// A ranked placement handed back to rendering callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    pub campaign_id: CampaignId,
    pub matched_scope: MatchedScope,
    pub tier: u8,
}

impl From<&MatchResult> for Placement {
    fn from(result: &MatchResult) -> Self {
        Self {
            campaign_id: result.campaign.id,
            matched_scope: result.matched_scope,
            tier: result.tier,
        }
    }
}

// ─── Lifecycle ─────────────────────────────────────────────────────────────

/// Explicit lifecycle writes. Everything else is derived at read time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// draft -> pending_review
    ConfirmPayment,
    /// pending_review -> approved
    Approve,
    /// pending_review -> rejected
    Reject,
    /// approved (scheduled or live) -> paused
    Pause,
    /// paused -> approved
    Resume,
}

pub fn normalize_country(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}
