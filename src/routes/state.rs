use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};

use crate::{
    dto::campaign::{ActionResponse, CampaignStateDto, ConfigPatch, PreviewResponse},
    error::AppError,
    services::campaign_service,
    state::SharedState,
};

/// Campaign record reads and phase control.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/state/preview", get(get_preview))
        .route("/api/state/config", put(update_config))
        .route("/api/state/start-countdown", post(start_countdown))
        .route("/api/state/start-now", post(start_now))
        .route("/api/state/show-winner", post(show_winner))
        .route("/api/state/stop", post(stop))
        .route("/api/state/load-template/{id}", post(load_template))
}

/// Current campaign record.
#[utoipa::path(
    get,
    path = "/api/state",
    tag = "state",
    responses((status = 200, description = "Current campaign record", body = CampaignStateDto))
)]
pub async fn get_state(State(state): State<SharedState>) -> Json<CampaignStateDto> {
    Json(campaign_service::current_state(&state).await)
}

/// Slots resolved against the catalogue, with prices and the big-win flag.
#[utoipa::path(
    get,
    path = "/api/state/preview",
    tag = "state",
    responses(
        (status = 200, description = "Resolved display preview", body = PreviewResponse),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn get_preview(
    State(state): State<SharedState>,
) -> Result<Json<PreviewResponse>, AppError> {
    Ok(Json(campaign_service::preview(&state).await?))
}

/// Merge the given fields into the record. Phase and timer are never changed.
#[utoipa::path(
    put,
    path = "/api/state/config",
    tag = "state",
    request_body = ConfigPatch,
    responses(
        (status = 200, description = "Configuration applied", body = ActionResponse),
        (status = 400, description = "Invalid configuration")
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<ActionResponse>, AppError> {
    let record = campaign_service::apply_config(&state, patch).await?;
    Ok(Json(ActionResponse::ok(record)))
}

/// Arm the teaser countdown.
#[utoipa::path(
    post,
    path = "/api/state/start-countdown",
    tag = "state",
    responses((status = 200, description = "Countdown armed", body = ActionResponse))
)]
pub async fn start_countdown(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(ActionResponse::ok(
        campaign_service::start_countdown(&state).await,
    ))
}

/// Spin the reels immediately.
#[utoipa::path(
    post,
    path = "/api/state/start-now",
    tag = "state",
    responses((status = 200, description = "Reels spinning", body = ActionResponse))
)]
pub async fn start_now(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(ActionResponse::ok(campaign_service::start_now(&state).await))
}

/// Show the winner. Without a campaign message the campaign returns to idle instead.
#[utoipa::path(
    post,
    path = "/api/state/show-winner",
    tag = "state",
    responses((status = 200, description = "Winner shown, or idle when no campaign message is set", body = ActionResponse))
)]
pub async fn show_winner(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(ActionResponse::ok(
        campaign_service::show_winner(&state).await,
    ))
}

/// Return to idle.
#[utoipa::path(
    post,
    path = "/api/state/stop",
    tag = "state",
    responses((status = 200, description = "Campaign idle", body = ActionResponse))
)]
pub async fn stop(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(ActionResponse::ok(campaign_service::stop(&state).await))
}

/// Copy a saved template into the campaign record.
#[utoipa::path(
    post,
    path = "/api/state/load-template/{id}",
    tag = "state",
    params(("id" = i64, Path, description = "Identifier of the template to load")),
    responses(
        (status = 200, description = "Template applied", body = ActionResponse),
        (status = 404, description = "Unknown template"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn load_template(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, AppError> {
    let record = campaign_service::load_template(&state, id).await?;
    Ok(Json(ActionResponse::ok(record)))
}
