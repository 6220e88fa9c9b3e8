use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{TemplateConfigEntity, TemplateFields},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_slot_config},
    },
    state::campaign::{SlotEntry, SlotTemplate, SlotType},
};

/// Structured template content, using the client's field names.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateConfigDto {
    pub slots: Vec<SlotEntry>,
    pub active_slot: u8,
    pub banner_text: String,
    pub campaign_message: String,
}

/// Saved template as exposed over HTTP.
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateDto {
    pub id: i64,
    pub name: String,
    pub slot_type: SlotType,
    pub config: TemplateConfigDto,
    /// Derived: all three slots show the same product.
    pub big_win: bool,
    pub created_at: String,
}

impl From<SlotTemplate> for TemplateDto {
    fn from(template: SlotTemplate) -> Self {
        let big_win = template.is_big_win();
        Self {
            id: template.id,
            name: template.name,
            slot_type: template.slot_type,
            config: TemplateConfigDto {
                slots: template.slots,
                active_slot: template.active_slot,
                banner_text: template.banner_text,
                campaign_message: template.campaign_message,
            },
            big_win,
            created_at: format_system_time(template.created_at),
        }
    }
}

/// Body of the template create request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub slot_type: SlotType,
    #[serde(default)]
    pub config: TemplateConfigDto,
}

impl Validate for TemplateInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.name) {
            errors.add("name", e);
        }
        if let Err(e) = validate_slot_config(&self.config.slots) {
            errors.add("config", e);
        }
        if self.config.active_slot > 2 {
            let mut err = validator::ValidationError::new("range");
            err.message = Some("activeSlot must be 0, 1 or 2".into());
            errors.add("config", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<TemplateInput> for TemplateFields {
    fn from(input: TemplateInput) -> Self {
        let config = TemplateConfigEntity {
            slots: input.config.slots,
            active_slot: input.config.active_slot,
            banner_text: input.config.banner_text,
            campaign_message: input.config.campaign_message,
        };
        Self {
            name: input.name.trim().to_owned(),
            slot_type: input.slot_type.as_str().to_owned(),
            config: config.encode(),
        }
    }
}
