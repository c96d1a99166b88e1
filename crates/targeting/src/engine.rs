//! Placement resolution: match then rank over a campaign snapshot.

use chrono::{NaiveDate, Utc};
use listing_ads_core::config::TargetingConfig;
use listing_ads_core::types::{Campaign, MatchResult, Placement, ViewerLocation};
use listing_ads_core::{CampaignError, CampaignResult};
use tracing::info;

use crate::matcher::{GeoMatcher, RejectedCampaign};
use crate::ranker;

/// Ranked placements plus the records that could not be evaluated.
#[derive(Debug, Default)]
pub struct PlacementOutcome {
    pub placements: Vec<Placement>,
    pub rejected: Vec<RejectedCampaign>,
}

impl PlacementOutcome {
    /// Hard-fail the batch on the first invalid record instead of skipping it.
    pub fn into_strict(mut self) -> CampaignResult<Vec<Placement>> {
        if self.rejected.is_empty() {
            Ok(self.placements)
        } else {
            Err(self.rejected.swap_remove(0).error)
        }
    }
}

#[derive(Debug, Clone)]
pub struct TargetingEngine {
    simulation_enabled: bool,
}

impl TargetingEngine {
    pub fn new(config: &TargetingConfig) -> Self {
        Self {
            simulation_enabled: config.simulation_enabled,
        }
    }

    /// The date to evaluate at: today (UTC) unless a QA override is given
    /// and simulation is enabled.
    pub fn resolve_as_of(&self, requested: Option<NaiveDate>) -> CampaignResult<NaiveDate> {
        match requested {
            None => Ok(Utc::now().date_naive()),
            Some(date) if self.simulation_enabled => Ok(date),
            Some(_) => Err(CampaignError::SimulationDisabled),
        }
    }

    /// Ranked match results for a viewer on `as_of`. Invalid records are
    /// skipped and logged by the matcher.
    pub fn ranked_matches(
        &self,
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: NaiveDate,
    ) -> CampaignResult<Vec<MatchResult>> {
        let matches = GeoMatcher::match_campaigns(campaigns, viewer, as_of)?;
        Ok(ranker::rank(matches))
    }

    /// Ordered `{campaign_id, matched_scope, tier}` list for rendering.
    pub fn resolve(
        &self,
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: Option<NaiveDate>,
    ) -> CampaignResult<Vec<Placement>> {
        let as_of = self.resolve_as_of(as_of)?;
        self.resolve_at(campaigns, viewer, as_of)
    }

    /// Skip-and-log: placements only.
    pub fn resolve_at(
        &self,
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: NaiveDate,
    ) -> CampaignResult<Vec<Placement>> {
        Ok(self.resolve_outcome(campaigns, viewer, as_of)?.placements)
    }

    /// Placements and rejected records, so the caller can choose between
    /// skipping invalid records and failing the batch.
    pub fn resolve_outcome(
        &self,
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: NaiveDate,
    ) -> CampaignResult<PlacementOutcome> {
        let outcome = GeoMatcher::match_batch(campaigns, viewer, as_of)?;
        let placements: Vec<Placement> = ranker::rank(outcome.matches)
            .iter()
            .map(Placement::from)
            .collect();

        metrics::counter!("targeting.placements.resolved").increment(placements.len() as u64);
        info!(
            country = %viewer.country_code,
            city = %viewer.city_slug,
            %as_of,
            placements = placements.len(),
            rejected = outcome.rejected.len(),
            "Resolved placements"
        );
        Ok(PlacementOutcome {
            placements,
            rejected: outcome.rejected,
        })
    }
}

impl Default for TargetingEngine {
    fn default() -> Self {
        Self::new(&TargetingConfig::default())
    }
}
