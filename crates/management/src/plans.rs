//! Plan catalog. Campaigns copy the plan at purchase time, so edits here
//! only affect campaigns created afterwards.

use dashmap::DashMap;
use listing_ads_core::types::{Plan, Quota};
use tracing::info;

pub struct PlanCatalog {
    plans: DashMap<String, Plan>,
}

impl PlanCatalog {
    pub fn new() -> Self {
        let catalog = Self {
            plans: DashMap::new(),
        };
        catalog.seed_default_plans();
        catalog
    }

    pub fn get(&self, code: &str) -> Option<Plan> {
        self.plans.get(code).map(|r| r.value().clone())
    }

    pub fn list(&self) -> Vec<Plan> {
        let mut plans: Vec<Plan> = self.plans.iter().map(|r| r.value().clone()).collect();
        plans.sort_by(|a, b| a.code.cmp(&b.code));
        plans
    }

    pub fn upsert(&self, plan: Plan) {
        info!(plan = %plan.code, "Plan catalog updated");
        self.plans.insert(plan.code.clone(), plan);
    }

    fn seed_default_plans(&self) {
        let defaults = [
            ("city_basic", "City Basic", Quota::Limited(1), Quota::Limited(1), 1),
            ("city_plus", "City Plus", Quota::Limited(1), Quota::Limited(5), 3),
            ("country", "Country", Quota::Limited(1), Quota::Unlimited, 6),
            ("multi_country", "Multi-Country", Quota::Limited(5), Quota::Unlimited, 12),
            ("global", "Global", Quota::Unlimited, Quota::Unlimited, 12),
        ];
        for (code, name, countries, cities, months) in defaults {
            self.plans.insert(
                code.to_string(),
                Plan {
                    code: code.to_string(),
                    name: name.to_string(),
                    countries_included: countries,
                    cities_included: cities,
                    duration_months: months,
                },
            );
        }
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new()
    }
}
