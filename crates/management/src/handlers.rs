//! Axum REST handlers for the ads management API.

use crate::models::*;
use crate::store::CampaignStore;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use listing_ads_core::types::{Campaign, Plan};
use listing_ads_core::CampaignError;
use listing_ads_targeting::{effective_status, StatusTransition, TargetingEngine};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<CampaignStore>,
    pub engine: TargetingEngine,
}

/// Maps domain errors onto HTTP responses with a machine-readable code.
#[derive(Debug)]
pub struct ApiError(pub CampaignError);

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CampaignError::Quota(_) | CampaignError::OrphanedCity { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CampaignError::InvalidViewer(_) | CampaignError::InvalidSchedule { .. } => {
                StatusCode::BAD_REQUEST
            }
            CampaignError::NotFound { .. } => StatusCode::NOT_FOUND,
            CampaignError::VersionConflict { .. } | CampaignError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            CampaignError::SimulationDisabled => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(error = %self.0, code = self.0.code(), "Management request declined");

        let details = match &self.0 {
            CampaignError::Quota(quota) => serde_json::to_value(quota).ok(),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

fn view(campaign: Campaign) -> CampaignView {
    let effective_status = effective_status(&campaign, Utc::now().date_naive());
    CampaignView {
        campaign,
        effective_status,
    }
}

// ─── Plans ─────────────────────────────────────────────────────────────────

pub async fn list_plans(State(state): State<ManagementState>) -> Json<Vec<Plan>> {
    Json(state.store.plans().list())
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> Json<Vec<CampaignView>> {
    Json(state.store.list_campaigns().into_iter().map(view).collect())
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignView>, ApiError> {
    Ok(Json(view(state.store.get_campaign(id)?)))
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let campaign = state.store.create_campaign(req, "advertiser")?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn update_targeting(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTargetingRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state
        .store
        .update_targeting(id, req.expected_version, req.change, "advertiser")?;
    Ok(Json(campaign))
}

pub async fn apply_lifecycle(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LifecycleRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let as_of = state.engine.resolve_as_of(req.as_of)?;
    let campaign = state
        .store
        .apply_lifecycle(id, req.expected_version, req.action, as_of, "admin")?;
    metrics::counter!("management.lifecycle.transitions").increment(1);
    Ok(Json(campaign))
}

pub async fn campaign_history(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusTransition>>, ApiError> {
    Ok(Json(state.store.history(id)?))
}

// ─── Placements ────────────────────────────────────────────────────────────

pub async fn placements(
    State(state): State<ManagementState>,
    Query(query): Query<PlacementQuery>,
) -> Result<Json<PlacementResponse>, ApiError> {
    let as_of = state.engine.resolve_as_of(query.as_of)?;
    let viewer = query.viewer();
    let snapshot = state.store.list_campaigns();
    let outcome = state.engine.resolve_outcome(&snapshot, &viewer, as_of)?;
    if query.strict {
        let placements = outcome.into_strict()?;
        return Ok(Json(PlacementResponse {
            as_of,
            viewer,
            placements,
            skipped: Vec::new(),
        }));
    }
    let skipped = outcome.rejected.iter().map(|r| r.campaign_id).collect();
    Ok(Json(PlacementResponse {
        as_of,
        viewer,
        placements: outcome.placements,
        skipped,
    }))
}

// ─── Audit Log ─────────────────────────────────────────────────────────────

pub async fn audit_log(State(state): State<ManagementState>) -> Json<Vec<AuditLogEntry>> {
    Json(state.store.get_audit_log())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use listing_ads_core::types::{AdLevel, LifecycleAction, MatchedScope, TargetCity};
    use listing_ads_core::config::TargetingConfig;
    use listing_ads_targeting::{TargetingChange, TargetingSelection};

    fn state() -> ManagementState {
        ManagementState {
            store: Arc::new(CampaignStore::new()),
            engine: TargetingEngine::new(&TargetingConfig::default()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mexico_city_request() -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: "Tacos".to_string(),
            plan_code: "city_plus".to_string(),
            ad_level: AdLevel::City,
            target_countries: ["MX".to_string()].into(),
            target_cities: [TargetCity::new("MX", "mexico-city")].into(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 12, 31),
            budget: 100.0,
            currency: "MXN".to_string(),
        }
    }

    async fn approve(state: &ManagementState, id: Uuid) {
        let steps = [
            (0, LifecycleAction::ConfirmPayment),
            (1, LifecycleAction::Approve),
        ];
        for (version, action) in steps {
            apply_lifecycle(
                State(state.clone()),
                Path(id),
                Json(LifecycleRequest {
                    action,
                    expected_version: version,
                    as_of: Some(date(2026, 1, 2)),
                }),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_then_resolve_placements() {
        let state = state();
        let (status, Json(campaign)) =
            create_campaign(State(state.clone()), Json(mexico_city_request()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        approve(&state, campaign.id).await;

        let Json(resp) = placements(
            State(state.clone()),
            Query(PlacementQuery {
                country_code: "mx".to_string(),
                city_slug: "mexico-city".to_string(),
                as_of: Some(date(2026, 6, 1)),
                strict: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.as_of, date(2026, 6, 1));
        assert_eq!(resp.placements.len(), 1);
        assert_eq!(resp.placements[0].campaign_id, campaign.id);
        assert_eq!(resp.placements[0].matched_scope, MatchedScope::City);

        let Json(other_city) = placements(
            State(state),
            Query(PlacementQuery {
                country_code: "MX".to_string(),
                city_slug: "guadalajara".to_string(),
                as_of: Some(date(2026, 6, 1)),
                strict: false,
            }),
        )
        .await
        .unwrap();
        assert!(other_city.placements.is_empty());
    }

    #[tokio::test]
    async fn test_placements_without_country_is_bad_request() {
        let err = placements(
            State(state()),
            Query(PlacementQuery {
                country_code: String::new(),
                city_slug: "miami".to_string(),
                as_of: None,
                strict: false,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_quota_violation_is_unprocessable() {
        let state = state();
        let (_, Json(campaign)) =
            create_campaign(State(state.clone()), Json(mexico_city_request()))
                .await
                .unwrap();

        let err = update_targeting(
            State(state.clone()),
            Path(campaign.id),
            Json(UpdateTargetingRequest {
                expected_version: 0,
                change: TargetingChange::Replace(TargetingSelection::new(["MX", "US"], Vec::new())),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.0.code(), "too_many_countries");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_not_found() {
        let err = get_campaign(State(state()), Path(Uuid::new_v4())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_simulation_disabled_rejects_as_of() {
        let state = ManagementState {
            store: Arc::new(CampaignStore::new()),
            engine: TargetingEngine::new(&TargetingConfig {
                simulation_enabled: false,
                seed_demo_data: false,
            }),
        };
        let err = placements(
            State(state),
            Query(PlacementQuery {
                country_code: "US".to_string(),
                city_slug: String::new(),
                as_of: Some(date(2026, 6, 1)),
                strict: false,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_strict_placements_fail_on_invalid_record() {
        let state = state();
        let mut req = mexico_city_request();
        req.ad_level = AdLevel::Global;
        req.plan_code = "global".to_string();
        let (_, Json(campaign)) = create_campaign(State(state.clone()), Json(req))
            .await
            .unwrap();
        approve(&state, campaign.id).await;
        state.store.set_end_date(campaign.id, date(2025, 1, 1));

        let query = |strict| PlacementQuery {
            country_code: "MX".to_string(),
            city_slug: "mexico-city".to_string(),
            as_of: Some(date(2026, 6, 1)),
            strict,
        };
        let Json(lenient) = placements(State(state.clone()), Query(query(false)))
            .await
            .unwrap();
        assert!(lenient.placements.is_empty());
        assert_eq!(lenient.skipped, vec![campaign.id]);

        let err = placements(State(state), Query(query(true))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.0.code(), "invalid_schedule");
    }

    #[tokio::test]
    async fn test_declined_actions_keep_their_message() {
        let state = state();
        let (_, Json(campaign)) =
            create_campaign(State(state.clone()), Json(mexico_city_request()))
                .await
                .unwrap();
        let err = apply_lifecycle(
            State(state),
            Path(campaign.id),
            Json(LifecycleRequest {
                action: LifecycleAction::Approve,
                expected_version: 7,
                as_of: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.0.to_string(), "Version conflict: expected 7, found 0");
    }
}
