//! DTOs describing the campaign record, its configuration patch and the
//! resolved preview used by the display.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{format_system_time, product::ProductDto, validation::validate_slot_config},
    state::{
        campaign::{CampaignState, DiscountType, Phase, Product, SlotEntry, SlotType},
        state_machine::ConfigUpdate,
    },
};

/// Longest phase duration an operator may configure, in seconds.
pub const MAX_DURATION_SECONDS: u32 = 3_600;

/// Full campaign record as broadcast to clients and returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignStateDto {
    pub phase: Phase,
    pub timer_remaining: u32,
    /// RFC 3339 timestamp of the last phase transition.
    pub phase_started_at: String,
    pub slot_type: SlotType,
    pub active_slot: u8,
    pub slot_config: Vec<SlotEntry>,
    pub banner_text: String,
    pub campaign_message: String,
    pub marquee_text: String,
    pub marquee_speed: String,
    pub countdown_seconds: u32,
    pub active_duration: u32,
    pub winner_duration: u32,
    pub updated_at: String,
}

impl From<&CampaignState> for CampaignStateDto {
    fn from(state: &CampaignState) -> Self {
        Self {
            phase: state.phase,
            timer_remaining: state.timer_remaining,
            phase_started_at: format_system_time(state.phase_started_at),
            slot_type: state.slot_type,
            active_slot: state.active_slot,
            slot_config: state.slot_config.clone(),
            banner_text: state.banner_text.clone(),
            campaign_message: state.campaign_message.clone(),
            marquee_text: state.marquee_text.clone(),
            marquee_speed: state.marquee_speed.clone(),
            countdown_seconds: state.countdown_seconds,
            active_duration: state.active_duration,
            winner_duration: state.winner_duration,
            updated_at: format_system_time(state.updated_at),
        }
    }
}

/// Merge patch for the non-phase fields. Absent fields are left untouched;
/// `phase` and `timer_remaining` are not part of the schema and are ignored
/// if a client sends them.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ConfigPatch {
    #[serde(default)]
    pub slot_type: Option<SlotType>,
    #[serde(default)]
    pub slot_config: Option<Vec<SlotEntry>>,
    #[serde(default)]
    pub active_slot: Option<u8>,
    #[serde(default)]
    pub countdown_seconds: Option<u32>,
    #[serde(default)]
    pub active_duration: Option<u32>,
    #[serde(default)]
    pub winner_duration: Option<u32>,
    #[serde(default)]
    pub banner_text: Option<String>,
    #[serde(default)]
    pub campaign_message: Option<String>,
    #[serde(default)]
    pub marquee_text: Option<String>,
    #[serde(default)]
    pub marquee_speed: Option<String>,
}

impl Validate for ConfigPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(slots) = &self.slot_config {
            if let Err(e) = validate_slot_config(slots) {
                errors.add("slot_config", e);
            }
        }

        if let Some(active_slot) = self.active_slot {
            if active_slot > 2 {
                let mut err = ValidationError::new("range");
                err.message = Some("active_slot must be 0, 1 or 2".into());
                errors.add("active_slot", err);
            }
        }

        for (field, value) in [
            ("countdown_seconds", self.countdown_seconds),
            ("active_duration", self.active_duration),
            ("winner_duration", self.winner_duration),
        ] {
            if let Some(seconds) = value {
                if !(1..=MAX_DURATION_SECONDS).contains(&seconds) {
                    let mut err = ValidationError::new("range");
                    err.message = Some(
                        format!("{field} must be between 1 and {MAX_DURATION_SECONDS} seconds")
                            .into(),
                    );
                    errors.add(field, err);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<ConfigPatch> for ConfigUpdate {
    fn from(patch: ConfigPatch) -> Self {
        Self {
            slot_type: patch.slot_type,
            slot_config: patch.slot_config,
            active_slot: patch.active_slot,
            countdown_seconds: patch.countdown_seconds,
            active_duration: patch.active_duration,
            winner_duration: patch.winner_duration,
            banner_text: patch.banner_text,
            campaign_message: patch.campaign_message,
            marquee_text: patch.marquee_text,
            marquee_speed: patch.marquee_speed,
        }
    }
}

/// Reply of every control endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub state: CampaignStateDto,
}

impl ActionResponse {
    pub fn ok(state: CampaignStateDto) -> Self {
        Self {
            success: true,
            state,
        }
    }
}

/// One display window with its product and prices resolved.
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewSlot {
    pub index: usize,
    /// `None` when the slot is empty or references a deleted product.
    pub product: Option<ProductDto>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub old_price: Option<f64>,
    pub new_price: Option<f64>,
    /// Whether the window takes part in the current layout.
    pub highlighted: bool,
}

/// What the display would render for the current record.
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    pub phase: Phase,
    pub timer_remaining: u32,
    pub slot_type: SlotType,
    pub active_slot: u8,
    pub big_win: bool,
    pub slots: Vec<PreviewSlot>,
}

impl PreviewResponse {
    /// Resolve every slot of `state` against the product catalogue.
    pub fn resolve(state: &CampaignState, products: &[Product]) -> Self {
        let slots = state
            .slot_config
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let product = entry
                    .product_id
                    .and_then(|id| products.iter().find(|product| product.id == id));
                let highlighted = match state.slot_type {
                    SlotType::Triple => true,
                    SlotType::Single => index == usize::from(state.active_slot),
                };
                PreviewSlot {
                    index,
                    product: product.cloned().map(ProductDto::from),
                    discount_type: entry.discount_type,
                    discount_value: entry.discount_value,
                    old_price: product.map(|p| p.base_price),
                    new_price: product.map(|p| entry.discounted_price(p.base_price)),
                    highlighted,
                }
            })
            .collect();

        Self {
            phase: state.phase,
            timer_remaining: state.timer_remaining,
            slot_type: state.slot_type,
            active_slot: state.active_slot,
            big_win: state.is_big_win(),
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampaignDefaults;

    #[test]
    fn patch_ignores_phase_fields() {
        let patch: ConfigPatch = serde_json::from_str(
            r#"{"phase":"winner","timer_remaining":99,"banner_text":"Hello"}"#,
        )
        .unwrap();
        let update = ConfigUpdate::from(patch);
        assert_eq!(update.banner_text.as_deref(), Some("Hello"));
        assert_eq!(
            update,
            ConfigUpdate {
                banner_text: Some("Hello".into()),
                ..ConfigUpdate::default()
            }
        );
    }

    #[test]
    fn patch_validation_rejects_out_of_range_values() {
        let patch = ConfigPatch {
            active_slot: Some(3),
            countdown_seconds: Some(0),
            winner_duration: Some(3_601),
            ..ConfigPatch::default()
        };
        let errors = patch.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("active_slot"));
        assert!(fields.contains_key("countdown_seconds"));
        assert!(fields.contains_key("winner_duration"));
        assert!(!fields.contains_key("active_duration"));
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(ConfigPatch::default().validate().is_ok());
    }

    #[test]
    fn preview_resolves_prices_and_dangling_products() {
        let mut state = CampaignState::initial(&CampaignDefaults::default());
        state.slot_type = SlotType::Single;
        state.active_slot = 1;
        state.slot_config = vec![
            SlotEntry {
                product_id: Some(1),
                discount_type: DiscountType::Percentage,
                discount_value: 50.0,
            },
            SlotEntry {
                product_id: Some(42),
                ..SlotEntry::default()
            },
        ];
        let products = vec![Product {
            id: 1,
            name: "Ale".into(),
            icon_url: "🍺".into(),
            base_price: 300.0,
            category: "drinks".into(),
        }];

        let preview = PreviewResponse::resolve(&state, &products);
        assert!(!preview.big_win);
        assert_eq!(preview.slots[0].old_price, Some(300.0));
        assert_eq!(preview.slots[0].new_price, Some(150.0));
        assert!(!preview.slots[0].highlighted);
        assert!(preview.slots[1].product.is_none());
        assert!(preview.slots[1].highlighted);
    }
}
