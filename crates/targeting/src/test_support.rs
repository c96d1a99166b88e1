use chrono::{NaiveDate, TimeZone, Utc};
use listing_ads_core::types::{AdLevel, Campaign, CampaignStatus, Plan, Quota, TargetCity};
use std::collections::BTreeSet;
use uuid::Uuid;

pub fn unlimited_plan() -> Plan {
    Plan {
        code: "global".to_string(),
        name: "Global".to_string(),
        countries_included: Quota::Unlimited,
        cities_included: Quota::Unlimited,
        duration_months: 12,
    }
}

/// A 2026 calendar-year campaign with no targets.
pub fn campaign(ad_level: AdLevel, status: CampaignStatus) -> Campaign {
    let created = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
    Campaign {
        id: Uuid::new_v4(),
        name: "Test campaign".to_string(),
        status,
        ad_level,
        target_countries: BTreeSet::new(),
        target_cities: BTreeSet::new(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        budget: 100.0,
        currency: "USD".to_string(),
        plan: unlimited_plan(),
        version: 0,
        created_at: created,
        updated_at: created,
    }
}

pub fn with_cities(mut c: Campaign, cities: &[(&str, &str)]) -> Campaign {
    c.target_cities = cities
        .iter()
        .map(|(country, slug)| TargetCity::new(*country, *slug))
        .collect();
    c
}

pub fn with_countries(mut c: Campaign, countries: &[&str]) -> Campaign {
    c.target_countries = countries.iter().map(|c| c.to_string()).collect();
    c
}
