use tracing::info;

use crate::{
    dto::template::{TemplateDto, TemplateInput},
    error::ServiceError,
    state::{SharedState, campaign::SlotTemplate},
};

/// Saved templates, newest first.
pub async fn list_templates(state: &SharedState) -> Result<Vec<TemplateDto>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_templates()
        .await?
        .into_iter()
        .map(|entity| TemplateDto::from(SlotTemplate::from(entity)))
        .collect())
}

/// Insert a validated template.
pub async fn create_template(
    state: &SharedState,
    input: TemplateInput,
) -> Result<TemplateDto, ServiceError> {
    let store = state.require_store().await?;
    let entity = store.create_template(input.into()).await?;
    info!(id = entity.id, name = %entity.name, "slot template saved");
    Ok(TemplateDto::from(SlotTemplate::from(entity)))
}

/// Remove a template; unknown ids are `NotFound`.
pub async fn delete_template(state: &SharedState, id: i64) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_template(id).await? {
        return Err(ServiceError::NotFound(format!("template {id}")));
    }
    info!(id, "slot template deleted");
    Ok(())
}
