//! Plan quota enforcement for campaign targeting.
//!
//! Every targeting write (creation, full replacement, incremental edits)
//! goes through [`apply_targeting_change`]. Edits are applied to a scratch
//! copy, the country → city cascade runs, and the quota is checked against
//! the final set. Nothing is returned for persistence unless all checks pass.

use listing_ads_core::types::{normalize_country, AdLevel, Campaign, Plan, Quota, TargetCity};
use listing_ads_core::{CampaignError, CampaignResult, QuotaError, QuotaErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingSelection {
    #[serde(default)]
    pub countries: BTreeSet<String>,
    #[serde(default)]
    pub cities: BTreeSet<TargetCity>,
}

impl TargetingSelection {
    pub fn new<S: AsRef<str>>(
        countries: impl IntoIterator<Item = S>,
        cities: impl IntoIterator<Item = TargetCity>,
    ) -> Self {
        Self {
            countries: countries.into_iter().map(|c| c.as_ref().to_string()).collect(),
            cities: cities.into_iter().collect(),
        }
        .normalized()
    }

    pub fn of(campaign: &Campaign) -> Self {
        Self {
            countries: campaign.target_countries.clone(),
            cities: campaign.target_cities.clone(),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            countries: self
                .countries
                .iter()
                .map(|c| normalize_country(c))
                .filter(|c| !c.is_empty())
                .collect(),
            cities: self
                .cities
                .into_iter()
                .map(TargetCity::normalized)
                .filter(|c| !c.slug.is_empty())
                .collect(),
        }
    }

    /// Remove a country and every city under it. Returns the number of
    /// cities dropped by the cascade.
    pub fn deselect_country(&mut self, country_code: &str) -> usize {
        let code = normalize_country(country_code);
        self.countries.remove(&code);
        let before = self.cities.len();
        self.cities.retain(|city| city.country_code != code);
        before - self.cities.len()
    }

    /// Cities whose country is not part of the selection.
    pub fn orphaned_cities(&self) -> impl Iterator<Item = &TargetCity> {
        self.cities
            .iter()
            .filter(|city| !self.countries.contains(&city.country_code))
    }
}

/// One incremental targeting edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TargetingOp {
    AddCountry { country_code: String },
    RemoveCountry { country_code: String },
    AddCity { country_code: String, slug: String },
    RemoveCity { country_code: String, slug: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingChange {
    /// The complete proposed selection.
    Replace(TargetingSelection),
    /// Edits applied in order; validation still runs on the final set only.
    Apply(Vec<TargetingOp>),
}

/// `validateTargeting(plan, countries, cities)`.
pub fn validate_targeting(
    plan: &Plan,
    countries: &BTreeSet<String>,
    cities: &BTreeSet<TargetCity>,
) -> Result<(), QuotaError> {
    check_allowance(
        plan,
        plan.countries_included,
        countries.len(),
        QuotaErrorKind::TooManyCountries,
    )?;
    check_allowance(
        plan,
        plan.cities_included,
        cities.len(),
        QuotaErrorKind::TooManyCities,
    )
}

fn check_allowance(
    plan: &Plan,
    quota: Quota,
    requested: usize,
    kind: QuotaErrorKind,
) -> Result<(), QuotaError> {
    match quota {
        Quota::Limited(limit) if !quota.allows(requested) => Err(QuotaError {
            kind,
            plan_code: plan.code.clone(),
            limit,
            requested,
        }),
        _ => Ok(()),
    }
}

/// Compute the selection that results from `change`, or fail without
/// touching `current`.
pub fn apply_targeting_change(
    current: &TargetingSelection,
    change: TargetingChange,
    plan: &Plan,
    ad_level: AdLevel,
) -> CampaignResult<TargetingSelection> {
    let next = match change {
        TargetingChange::Replace(proposed) => {
            let mut next = proposed.normalized();
            let dropped: Vec<String> = current
                .countries
                .difference(&next.countries)
                .cloned()
                .collect();
            for code in &dropped {
                next.deselect_country(code);
            }
            next
        }
        TargetingChange::Apply(ops) => {
            let mut next = current.clone();
            for op in ops {
                apply_op(&mut next, op);
            }
            next
        }
    };

    if ad_level != AdLevel::Global {
        if let Some(orphan) = next.orphaned_cities().next() {
            return Err(CampaignError::OrphanedCity {
                country_code: orphan.country_code.clone(),
                slug: orphan.slug.clone(),
            });
        }
    }

    validate_targeting(plan, &next.countries, &next.cities)?;
    Ok(next)
}

fn apply_op(selection: &mut TargetingSelection, op: TargetingOp) {
    match op {
        TargetingOp::AddCountry { country_code } => {
            let code = normalize_country(&country_code);
            if !code.is_empty() {
                selection.countries.insert(code);
            }
        }
        TargetingOp::RemoveCountry { country_code } => {
            selection.deselect_country(&country_code);
        }
        TargetingOp::AddCity { country_code, slug } => {
            let city = TargetCity::new(country_code, slug);
            if !city.slug.is_empty() {
                selection.cities.insert(city);
            }
        }
        TargetingOp::RemoveCity { country_code, slug } => {
            selection.cities.remove(&TargetCity::new(country_code, slug));
        }
    }
}
