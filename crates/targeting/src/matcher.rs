//! Geo matcher: resolves which eligible campaigns reach a viewer, and at
//! which scope.

use chrono::NaiveDate;
use listing_ads_core::types::{
    AdLevel, Campaign, CampaignId, MatchResult, MatchedScope, TargetCity, ViewerLocation,
};
use listing_ads_core::{CampaignError, CampaignResult};
use tracing::{debug, warn};

use crate::lifecycle;

/// Scopes in precedence order. Evaluation stops at the first hit.
const SCOPE_PRECEDENCE: [MatchedScope; 4] = [
    MatchedScope::City,
    MatchedScope::Country,
    MatchedScope::Region,
    MatchedScope::Global,
];

/// A record that could not be evaluated. The rest of the batch still is.
#[derive(Debug)]
pub struct RejectedCampaign {
    pub campaign_id: CampaignId,
    pub error: CampaignError,
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub rejected: Vec<RejectedCampaign>,
}

pub struct GeoMatcher;

impl GeoMatcher {
    /// Match a campaign snapshot against a viewer.
    ///
    /// Fails only when the viewer itself is malformed. Campaigns with an
    /// inverted date window are logged and returned in `rejected`; inactive
    /// or out-of-window campaigns and non-matches are simply absent.
    pub fn match_batch(
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: NaiveDate,
    ) -> CampaignResult<MatchOutcome> {
        let viewer = viewer.normalized()?;
        let mut outcome = MatchOutcome::default();

        for campaign in campaigns {
            if let Err(error) = campaign.validate_schedule() {
                warn!(
                    campaign_id = %campaign.id,
                    error = %error,
                    "Skipping invalid campaign record"
                );
                metrics::counter!("targeting.campaigns.skipped_invalid").increment(1);
                outcome.rejected.push(RejectedCampaign {
                    campaign_id: campaign.id,
                    error,
                });
                continue;
            }

            if !lifecycle::is_eligible(campaign, as_of) {
                continue;
            }

            if let Some(scope) = Self::resolve_scope(campaign, &viewer) {
                outcome.matches.push(MatchResult::new(campaign.clone(), scope));
            }
        }

        debug!(
            country = %viewer.country_code,
            city = %viewer.city_slug,
            %as_of,
            candidates = campaigns.len(),
            matched = outcome.matches.len(),
            rejected = outcome.rejected.len(),
            "Geo match complete"
        );

        Ok(outcome)
    }

    /// `match(campaigns, viewer, as_of)`: only the matches.
    pub fn match_campaigns(
        campaigns: &[Campaign],
        viewer: &ViewerLocation,
        as_of: NaiveDate,
    ) -> CampaignResult<Vec<MatchResult>> {
        Ok(Self::match_batch(campaigns, viewer, as_of)?.matches)
    }

    /// First scope in precedence order that matches, limited to the scopes
    /// the campaign's `ad_level` covers. Expects a normalized viewer.
    pub fn resolve_scope(campaign: &Campaign, viewer: &ViewerLocation) -> Option<MatchedScope> {
        let widest = campaign.ad_level.widest_tier();
        SCOPE_PRECEDENCE
            .into_iter()
            .take_while(|scope| scope.tier() <= widest)
            .find(|scope| Self::scope_matches(*scope, campaign, viewer))
    }

    fn scope_matches(scope: MatchedScope, campaign: &Campaign, viewer: &ViewerLocation) -> bool {
        match scope {
            MatchedScope::City => city_matches(campaign.target_cities.iter(), &viewer.city_slug),
            MatchedScope::Country => campaign
                .target_countries
                .iter()
                .any(|code| code.eq_ignore_ascii_case(&viewer.country_code)),
            // Not yet populated: no campaign data carries region targets.
            MatchedScope::Region => false,
            MatchedScope::Global => campaign.ad_level == AdLevel::Global,
        }
    }
}

/// Bidirectional, case-insensitive substring match so slug variants such as
/// `mexico-city` and `mexico` still meet. Empty slugs never match.
fn city_matches<'a>(targets: impl IntoIterator<Item = &'a TargetCity>, viewer_city: &str) -> bool {
    let viewer_city = viewer_city.to_lowercase();
    if viewer_city.is_empty() {
        return false;
    }
    targets.into_iter().any(|target| {
        let slug = target.slug.to_lowercase();
        !slug.is_empty() && (slug.contains(&viewer_city) || viewer_city.contains(&slug))
    })
}
