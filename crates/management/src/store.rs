//! In-memory campaign store backed by DashMap.
//!
//! Production: replace with PostgreSQL or similar ACID store. Whatever
//! backs it must keep the per-campaign read-validate-write atomic; here the
//! DashMap entry guard is held for the whole targeting or lifecycle write.

use crate::models::*;
use crate::plans::PlanCatalog;
use chrono::{Duration, NaiveDate, Utc};
use dashmap::DashMap;
use listing_ads_core::types::{
    AdLevel, Campaign, CampaignId, CampaignStatus, LifecycleAction, TargetCity,
};
use listing_ads_core::{CampaignError, CampaignResult};
use listing_ads_targeting::{
    apply_targeting_change, next_status, StatusTransition, TargetingChange, TargetingSelection,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Thread-safe in-memory store for campaigns, lifecycle history, and audit log.
pub struct CampaignStore {
    campaigns: DashMap<CampaignId, Campaign>,
    history: DashMap<CampaignId, Vec<StatusTransition>>,
    audit_log: DashMap<Uuid, AuditLogEntry>,
    plans: PlanCatalog,
}

impl CampaignStore {
    pub fn new() -> Self {
        info!("Campaign store initialized (in-memory, development mode)");
        Self {
            campaigns: DashMap::new(),
            history: DashMap::new(),
            audit_log: DashMap::new(),
            plans: PlanCatalog::new(),
        }
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    /// Point-in-time snapshot ordered by creation time (oldest first), which
    /// is the same-tier order the ranker preserves.
    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        campaigns
    }

    pub fn get_campaign(&self, id: CampaignId) -> CampaignResult<Campaign> {
        self.campaigns
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CampaignError::not_found("campaign", id))
    }

    /// Create a draft under `plan_code`. Targeting is validated against the
    /// plan, and the plan is copied onto the campaign.
    pub fn create_campaign(
        &self,
        req: CreateCampaignRequest,
        user: &str,
    ) -> CampaignResult<Campaign> {
        let plan = self
            .plans
            .get(&req.plan_code)
            .ok_or_else(|| CampaignError::not_found("plan", &req.plan_code))?;

        let proposed = TargetingSelection {
            countries: req.target_countries,
            cities: req.target_cities,
        };
        let selection = apply_targeting_change(
            &TargetingSelection::default(),
            TargetingChange::Replace(proposed),
            &plan,
            req.ad_level,
        )
        .inspect_err(|e| record_rejection(e))?;

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: req.name,
            status: CampaignStatus::Draft,
            ad_level: req.ad_level,
            target_countries: selection.countries,
            target_cities: selection.cities,
            start_date: req.start_date,
            end_date: req.end_date,
            budget: req.budget,
            currency: req.currency,
            plan,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        campaign.validate_schedule()?;

        let id = campaign.id;
        // History first: once the campaign is visible a lifecycle write may
        // append to it.
        self.history.entry(id).or_default();
        self.campaigns.insert(id, campaign.clone());
        self.log_audit(
            user,
            AuditAction::Create,
            &id.to_string(),
            serde_json::json!({"name": &campaign.name, "plan": &campaign.plan.code}),
        );
        metrics::counter!("management.campaigns.created").increment(1);
        info!(campaign_id = %id, plan = %campaign.plan.code, "Campaign created");
        Ok(campaign)
    }

    /// Replace or edit a campaign's targeting. The new selection is computed
    /// and validated while the entry is locked; on any error nothing changes.
    pub fn update_targeting(
        &self,
        id: CampaignId,
        expected_version: u64,
        change: TargetingChange,
        user: &str,
    ) -> CampaignResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::not_found("campaign", id))?;
        let campaign = entry.value_mut();
        check_version(campaign, expected_version)?;

        let next = apply_targeting_change(
            &TargetingSelection::of(campaign),
            change,
            &campaign.plan,
            campaign.ad_level,
        )
        .inspect_err(|e| record_rejection(e))?;

        campaign.target_countries = next.countries;
        campaign.target_cities = next.cities;
        campaign.version += 1;
        campaign.updated_at = Utc::now();

        self.log_audit(
            user,
            AuditAction::UpdateTargeting,
            &id.to_string(),
            serde_json::json!({
                "countries": campaign.target_countries.len(),
                "cities": campaign.target_cities.len(),
                "version": campaign.version,
            }),
        );
        Ok(campaign.clone())
    }

    /// Apply an explicit lifecycle write.
    pub fn apply_lifecycle(
        &self,
        id: CampaignId,
        expected_version: u64,
        action: LifecycleAction,
        as_of: NaiveDate,
        actor: &str,
    ) -> CampaignResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::not_found("campaign", id))?;
        let campaign = entry.value_mut();
        check_version(campaign, expected_version)?;

        let from = campaign.status;
        let to = next_status(campaign, action, as_of)?;
        campaign.status = to;
        campaign.version += 1;
        campaign.updated_at = Utc::now();

        self.history.entry(id).or_default().push(StatusTransition {
            campaign_id: id,
            from,
            to,
            action,
            actor: actor.to_string(),
            timestamp: campaign.updated_at,
        });
        self.log_audit(
            actor,
            AuditAction::Lifecycle,
            &id.to_string(),
            serde_json::json!({"action": action, "from": from, "to": to}),
        );
        info!(campaign_id = %id, ?from, ?to, "Campaign status changed");
        Ok(campaign.clone())
    }

    pub fn history(&self, id: CampaignId) -> CampaignResult<Vec<StatusTransition>> {
        self.history
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CampaignError::not_found("campaign", id))
    }

    // ─── Audit Log ─────────────────────────────────────────────────────────

    pub fn get_audit_log(&self) -> Vec<AuditLogEntry> {
        let mut entries: Vec<AuditLogEntry> =
            self.audit_log.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    fn log_audit(
        &self,
        user: &str,
        action: AuditAction,
        resource_id: &str,
        details: serde_json::Value,
    ) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user: user.to_string(),
            action,
            resource_type: "campaign".to_string(),
            resource_id: resource_id.to_string(),
            details,
            timestamp: Utc::now(),
        };
        self.audit_log.insert(entry.id, entry);
    }

    #[cfg(test)]
    pub(crate) fn set_end_date(&self, id: CampaignId, end_date: NaiveDate) {
        if let Some(mut entry) = self.campaigns.get_mut(&id) {
            entry.end_date = end_date;
        }
    }

    // ─── Demo data ─────────────────────────────────────────────────────────

    /// Seed a handful of approved campaigns live around today's date.
    pub fn seed_demo_data(&self) -> CampaignResult<usize> {
        let today = Utc::now().date_naive();
        let demo = [
            (
                "Mexico City Tacos",
                "city_plus",
                AdLevel::City,
                vec!["MX"],
                vec![("MX", "mexico-city")],
            ),
            ("Miami Dental", "city_basic", AdLevel::City, vec!["US"], vec![("US", "miami")]),
            ("US Home Services", "country", AdLevel::Country, vec!["US"], vec![]),
            (
                "North America Movers",
                "multi_country",
                AdLevel::Country,
                vec!["US", "CA", "MX"],
                vec![],
            ),
            ("Directory Premium", "global", AdLevel::Global, vec![], vec![]),
        ];

        let mut seeded = 0;
        for (name, plan_code, ad_level, countries, cities) in demo {
            let campaign = self.create_campaign(
                CreateCampaignRequest {
                    name: name.to_string(),
                    plan_code: plan_code.to_string(),
                    ad_level,
                    target_countries: countries.into_iter().map(String::from).collect(),
                    target_cities: cities
                        .into_iter()
                        .map(|(country, slug)| TargetCity::new(country, slug))
                        .collect(),
                    start_date: today - Duration::days(30),
                    end_date: today + Duration::days(60),
                    budget: 500.0,
                    currency: "USD".to_string(),
                },
                "system",
            )?;
            let paid = self.apply_lifecycle(
                campaign.id,
                campaign.version,
                LifecycleAction::ConfirmPayment,
                today,
                "system",
            )?;
            self.apply_lifecycle(paid.id, paid.version, LifecycleAction::Approve, today, "system")?;
            seeded += 1;
        }

        info!(campaigns = seeded, "Seeded demo campaigns");
        Ok(seeded)
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_version(campaign: &Campaign, expected: u64) -> CampaignResult<()> {
    if campaign.version != expected {
        metrics::counter!("management.version_conflicts").increment(1);
        warn!(
            campaign_id = %campaign.id,
            expected,
            actual = campaign.version,
            "Stale campaign write rejected"
        );
        return Err(CampaignError::VersionConflict {
            expected,
            actual: campaign.version,
        });
    }
    Ok(())
}

fn record_rejection(err: &CampaignError) {
    if matches!(err, CampaignError::Quota(_) | CampaignError::OrphanedCity { .. }) {
        metrics::counter!("management.quota.rejected").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listing_ads_core::types::Quota;
    use listing_ads_core::QuotaErrorKind;
    use listing_ads_targeting::TargetingOp;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(
        plan_code: &str,
        ad_level: AdLevel,
        countries: &[&str],
        cities: &[(&str, &str)],
    ) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: "Test".to_string(),
            plan_code: plan_code.to_string(),
            ad_level,
            target_countries: countries.iter().map(|c| c.to_string()).collect(),
            target_cities: cities.iter().map(|(c, s)| TargetCity::new(*c, *s)).collect(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 12, 31),
            budget: 250.0,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_create_campaign_snapshots_plan() {
        let store = CampaignStore::new();
        let campaign = store
            .create_campaign(
                request("city_plus", AdLevel::City, &["mx"], &[("mx", "Mexico-City")]),
                "admin",
            )
            .unwrap();
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.plan.code, "city_plus");
        assert!(campaign.target_countries.contains("MX"));
        assert_eq!(campaign.version, 0);
        assert_eq!(store.get_audit_log().len(), 1);
    }

    #[test]
    fn test_create_rejects_over_quota() {
        let store = CampaignStore::new();
        let err = store
            .create_campaign(request("city_plus", AdLevel::Country, &["US", "CA"], &[]), "admin")
            .unwrap_err();
        assert!(matches!(
            err,
            CampaignError::Quota(ref q) if q.kind == QuotaErrorKind::TooManyCountries
        ));
        assert!(store.list_campaigns().is_empty());
    }

    #[test]
    fn test_create_rejects_inverted_window_and_unknown_plan() {
        let store = CampaignStore::new();
        let mut req = request("global", AdLevel::Global, &[], &[]);
        req.end_date = date(2025, 1, 1);
        assert!(matches!(
            store.create_campaign(req, "admin"),
            Err(CampaignError::InvalidSchedule { .. })
        ));

        let unknown = request("platinum", AdLevel::Global, &[], &[]);
        assert!(matches!(
            store.create_campaign(unknown, "admin"),
            Err(CampaignError::NotFound { resource: "plan", .. })
        ));
        assert!(store.list_campaigns().is_empty());
    }

    #[test]
    fn test_catalog_change_does_not_affect_existing_campaign() {
        let store = CampaignStore::new();
        let campaign = store
            .create_campaign(
                request("city_plus", AdLevel::City, &["US"], &[("US", "miami")]),
                "admin",
            )
            .unwrap();

        let mut plan = store.plans().get("city_plus").unwrap();
        plan.cities_included = Quota::Limited(1);
        store.plans().upsert(plan);

        let updated = store
            .update_targeting(
                campaign.id,
                campaign.version,
                TargetingChange::Apply(vec![TargetingOp::AddCity {
                    country_code: "US".to_string(),
                    slug: "austin".to_string(),
                }]),
                "admin",
            )
            .unwrap();
        assert_eq!(updated.target_cities.len(), 2);
        assert_eq!(updated.plan.cities_included, Quota::Limited(5));
    }

    #[test]
    fn test_rejected_targeting_update_writes_nothing() {
        let store = CampaignStore::new();
        let campaign = store
            .create_campaign(
                request("city_basic", AdLevel::City, &["US"], &[("US", "miami")]),
                "admin",
            )
            .unwrap();

        let err = store
            .update_targeting(
                campaign.id,
                0,
                TargetingChange::Apply(vec![TargetingOp::AddCity {
                    country_code: "US".to_string(),
                    slug: "austin".to_string(),
                }]),
                "admin",
            )
            .unwrap_err();
        assert!(matches!(err, CampaignError::Quota(_)));

        let stored = store.get_campaign(campaign.id).unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.target_cities, campaign.target_cities);
    }

    #[test]
    fn test_stale_version_rejected() {
        let store = CampaignStore::new();
        let campaign = store
            .create_campaign(request("global", AdLevel::Global, &[], &[]), "admin")
            .unwrap();
        store
            .apply_lifecycle(
                campaign.id,
                0,
                LifecycleAction::ConfirmPayment,
                date(2026, 1, 5),
                "billing",
            )
            .unwrap();

        let err = store
            .apply_lifecycle(campaign.id, 0, LifecycleAction::Approve, date(2026, 1, 5), "reviewer")
            .unwrap_err();
        assert!(matches!(err, CampaignError::VersionConflict { expected: 0, actual: 1 }));
    }

    #[test]
    fn test_lifecycle_history_recorded() {
        let store = CampaignStore::new();
        let c = store
            .create_campaign(request("global", AdLevel::Global, &[], &[]), "admin")
            .unwrap();
        let today = date(2026, 2, 1);
        let c = store
            .apply_lifecycle(c.id, c.version, LifecycleAction::ConfirmPayment, today, "billing")
            .unwrap();
        let c = store
            .apply_lifecycle(c.id, c.version, LifecycleAction::Approve, today, "reviewer")
            .unwrap();
        assert_eq!(c.status, CampaignStatus::Approved);

        let history = store.history(c.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, CampaignStatus::PendingReview);
        assert_eq!(history[1].actor, "reviewer");

        let err = store
            .apply_lifecycle(c.id, c.version, LifecycleAction::Reject, today, "reviewer")
            .unwrap_err();
        assert!(matches!(err, CampaignError::InvalidTransition { .. }));
        assert_eq!(store.history(c.id).unwrap().len(), 2);
    }

    #[test]
    fn test_seed_demo_data() {
        let store = CampaignStore::new();
        assert_eq!(store.seed_demo_data().unwrap(), 5);
        assert!(store
            .list_campaigns()
            .iter()
            .all(|c| c.status == CampaignStatus::Approved));
    }

    #[test]
    fn test_history_survives_lifecycle_write_racing_creation() {
        let store = CampaignStore::new();
        let today = date(2026, 2, 1);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    store
                        .create_campaign(request("global", AdLevel::Global, &[], &[]), "admin")
                        .unwrap();
                }
            });
            scope.spawn(|| {
                let mut paid = 0;
                while paid < 50 {
                    for c in store.list_campaigns().iter().filter(|c| c.version == 0) {
                        let action = LifecycleAction::ConfirmPayment;
                        if store.apply_lifecycle(c.id, 0, action, today, "billing").is_ok() {
                            paid += 1;
                        }
                    }
                }
            });
        });

        for c in store.list_campaigns() {
            assert_eq!(c.status, CampaignStatus::PendingReview);
            assert_eq!(store.history(c.id).unwrap().len(), 1);
        }
    }
}
