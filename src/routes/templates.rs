use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use axum_valid::Valid;

use crate::{
    dto::template::{TemplateDto, TemplateInput},
    error::AppError,
    services::template_service,
    state::SharedState,
};

/// Slot template endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route("/api/templates/{id}", delete(delete_template))
}

/// Saved slot templates.
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "templates",
    responses((status = 200, description = "Templates, newest first", body = [TemplateDto]))
)]
pub async fn list_templates(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TemplateDto>>, AppError> {
    Ok(Json(template_service::list_templates(&state).await?))
}

/// Save the given slots and texts under a name for later loading.
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "templates",
    request_body = TemplateInput,
    responses(
        (status = 201, description = "Template saved", body = TemplateDto),
        (status = 400, description = "Invalid template")
    )
)]
pub async fn create_template(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TemplateInput>>,
) -> Result<(StatusCode, Json<TemplateDto>), AppError> {
    let template = template_service::create_template(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Remove a saved template.
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "templates",
    params(("id" = i64, Path, description = "Identifier of the template to delete")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Unknown template")
    )
)]
pub async fn delete_template(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    template_service::delete_template(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
