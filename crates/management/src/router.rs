//! Ads management router: mounts all endpoints under /api/v1/ads.

use crate::handlers::{self, ManagementState};
use crate::store::CampaignStore;
use axum::routing::{get, post, put};
use axum::Router;
use listing_ads_core::config::TargetingConfig;
use listing_ads_targeting::TargetingEngine;
use std::sync::Arc;
use tracing::warn;

/// Build the management router with a fresh store.
/// Returns a Router that should be merged into the main app.
pub fn management_router(config: &TargetingConfig) -> Router {
    let store = Arc::new(CampaignStore::new());
    if config.seed_demo_data {
        if let Err(e) = store.seed_demo_data() {
            warn!(error = %e, "Failed to seed demo campaigns");
        }
    }

    router_with_state(ManagementState {
        store,
        engine: TargetingEngine::new(config),
    })
}

pub fn router_with_state(state: ManagementState) -> Router {
    Router::new()
        // Plans
        .route("/api/v1/ads/plans", get(handlers::list_plans))
        // Campaigns
        .route(
            "/api/v1/ads/campaigns",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route("/api/v1/ads/campaigns/:id", get(handlers::get_campaign))
        .route("/api/v1/ads/campaigns/:id/targeting", put(handlers::update_targeting))
        .route("/api/v1/ads/campaigns/:id/lifecycle", post(handlers::apply_lifecycle))
        .route("/api/v1/ads/campaigns/:id/history", get(handlers::campaign_history))
        // Placement resolution
        .route("/api/v1/ads/placements", get(handlers::placements))
        // Audit log
        .route("/api/v1/ads/audit-log", get(handlers::audit_log))
        .with_state(state)
}
