use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::warn;

use crate::{
    config::CampaignDefaults,
    state::campaign::{CampaignState, Phase, Product, SlotEntry, SlotTemplate, SlotType},
};

/// Product row as stored in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductEntity {
    /// Integer identifier referenced by slot configurations.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Image URL or glyph.
    pub icon_url: String,
    /// Price before any slot discount.
    pub base_price: f64,
    /// Ordering key, before the name.
    pub category: String,
}

/// Writable product columns (everything but the identifier).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductFields {
    /// Display name.
    pub name: String,
    /// Image URL or glyph.
    pub icon_url: String,
    /// Price before any slot discount.
    pub base_price: f64,
    /// Ordering key, before the name.
    pub category: String,
}

impl ProductFields {
    /// Attach an identifier, producing the stored row.
    pub fn with_id(self, id: i64) -> ProductEntity {
        ProductEntity {
            id,
            name: self.name,
            icon_url: self.icon_url,
            base_price: self.base_price,
            category: self.category,
        }
    }
}

impl From<ProductEntity> for Product {
    fn from(value: ProductEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            icon_url: value.icon_url,
            base_price: value.base_price,
            category: value.category,
        }
    }
}

/// Slot template row; `config` holds the serialized [`TemplateConfigEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateEntity {
    /// Store-assigned identifier.
    pub id: i64,
    /// Operator-facing label.
    pub name: String,
    /// `single` or `triple`.
    pub slot_type: String,
    /// Serialized [`TemplateConfigEntity`].
    pub config: String,
    /// Insertion time.
    pub created_at: SystemTime,
}

/// Writable template columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateFields {
    /// Operator-facing label.
    pub name: String,
    /// `single` or `triple`.
    pub slot_type: String,
    /// Serialized [`TemplateConfigEntity`].
    pub config: String,
}

impl TemplateFields {
    /// Attach an identifier and creation time, producing the stored row.
    pub fn with_id(self, id: i64, created_at: SystemTime) -> TemplateEntity {
        TemplateEntity {
            id,
            name: self.name,
            slot_type: self.slot_type,
            config: self.config,
            created_at,
        }
    }
}

/// Structured content of a template's `config` blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateConfigEntity {
    /// Window configurations.
    pub slots: Vec<SlotEntry>,
    /// Highlighted window for single mode.
    pub active_slot: u8,
    /// Banner copied on load.
    pub banner_text: String,
    /// Winner message copied on load.
    pub campaign_message: String,
}

impl TemplateConfigEntity {
    /// Serialize into the stored blob form.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            warn!(error = %err, "failed to encode template config; storing empty object");
            "{}".into()
        })
    }
}

impl From<TemplateEntity> for SlotTemplate {
    fn from(value: TemplateEntity) -> Self {
        let config = decode_template_config(&value.config);
        Self {
            id: value.id,
            name: value.name,
            slot_type: SlotType::parse(&value.slot_type).unwrap_or_default(),
            slots: config.slots,
            active_slot: config.active_slot,
            banner_text: config.banner_text,
            campaign_message: config.campaign_message,
            created_at: value.created_at,
        }
    }
}

/// The single persisted campaign row; `slot_config` is a serialized JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveStateEntity {
    /// Textual [`Phase`].
    pub phase: String,
    /// Seconds left in the phase.
    pub timer_remaining: u32,
    /// Entry time of the phase.
    pub phase_started_at: SystemTime,
    /// Textual [`SlotType`].
    pub slot_type: String,
    /// Highlighted window.
    pub active_slot: u8,
    /// Serialized slot list.
    pub slot_config: String,
    /// Banner line.
    pub banner_text: String,
    /// Winner message.
    pub campaign_message: String,
    /// Scrolling text.
    pub marquee_text: String,
    /// Marquee speed keyword.
    pub marquee_speed: String,
    /// Countdown length; 0 falls back to the default.
    pub countdown_seconds: u32,
    /// Spin length; 0 falls back to the default.
    pub active_duration: u32,
    /// Winner screen length; 0 falls back to the default.
    pub winner_duration: u32,
    /// Last mutation time.
    pub updated_at: SystemTime,
}

impl From<&CampaignState> for LiveStateEntity {
    fn from(value: &CampaignState) -> Self {
        Self {
            phase: value.phase.as_str().to_owned(),
            timer_remaining: value.timer_remaining,
            phase_started_at: value.phase_started_at,
            slot_type: value.slot_type.as_str().to_owned(),
            active_slot: value.active_slot,
            slot_config: encode_slot_config(&value.slot_config),
            banner_text: value.banner_text.clone(),
            campaign_message: value.campaign_message.clone(),
            marquee_text: value.marquee_text.clone(),
            marquee_speed: value.marquee_speed.clone(),
            countdown_seconds: value.countdown_seconds,
            active_duration: value.active_duration,
            winner_duration: value.winner_duration,
            updated_at: value.updated_at,
        }
    }
}

impl LiveStateEntity {
    /// Rebuild the runtime record, tolerating unknown enum values and a
    /// malformed `slot_config` blob.
    pub fn into_state(self, defaults: &CampaignDefaults) -> CampaignState {
        let phase = Phase::parse(&self.phase).unwrap_or_else(|| {
            warn!(phase = %self.phase, "unknown persisted phase; treating as idle");
            Phase::Idle
        });
        CampaignState {
            phase,
            timer_remaining: self.timer_remaining,
            phase_started_at: self.phase_started_at,
            slot_type: SlotType::parse(&self.slot_type).unwrap_or_default(),
            active_slot: self.active_slot,
            slot_config: decode_slot_config(&self.slot_config),
            banner_text: self.banner_text,
            campaign_message: self.campaign_message,
            marquee_text: self.marquee_text,
            marquee_speed: self.marquee_speed,
            countdown_seconds: defaults.or_default_countdown(self.countdown_seconds),
            active_duration: defaults.or_default_active(self.active_duration),
            winner_duration: defaults.or_default_winner(self.winner_duration),
            updated_at: self.updated_at,
        }
    }
}

/// Serialize a slot list into its stored blob form.
pub fn encode_slot_config(slots: &[SlotEntry]) -> String {
    serde_json::to_string(slots).unwrap_or_else(|err| {
        warn!(error = %err, "failed to encode slot config; storing empty list");
        "[]".into()
    })
}

/// Parse a stored slot list, degrading to an empty list when malformed.
pub fn decode_slot_config(raw: &str) -> Vec<SlotEntry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Option<Vec<SlotEntry>>>(raw) {
        Ok(slots) => slots.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "malformed stored slot config; using empty configuration");
            Vec::new()
        }
    }
}

/// Parse a stored template config, degrading to an empty config when malformed.
pub fn decode_template_config(raw: &str) -> TemplateConfigEntity {
    match serde_json::from_str::<TemplateConfigEntity>(raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "malformed stored template config; using empty configuration");
            TemplateConfigEntity::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::campaign::DiscountType;

    #[test]
    fn malformed_slot_config_degrades_to_empty() {
        assert!(decode_slot_config("not json").is_empty());
        assert!(decode_slot_config("").is_empty());
        assert!(decode_slot_config("null").is_empty());
        assert!(decode_slot_config(r#"{"productId":1}"#).is_empty());
    }

    #[test]
    fn slot_config_survives_storage() {
        let slots = vec![
            SlotEntry {
                product_id: Some(4),
                discount_type: DiscountType::Fixed,
                discount_value: 5.0,
            },
            SlotEntry::default(),
        ];
        assert_eq!(decode_slot_config(&encode_slot_config(&slots)), slots);
    }

    #[test]
    fn malformed_template_config_degrades_to_empty() {
        assert_eq!(
            decode_template_config("{oops"),
            TemplateConfigEntity::default()
        );
    }

    #[test]
    fn template_config_reads_client_field_names() {
        let config = decode_template_config(
            r#"{"slots":[{"productId":1},{"productId":2},{"productId":3}],"activeSlot":1,"bannerText":"Hi","campaignMessage":"Win"}"#,
        );
        assert_eq!(config.slots.len(), 3);
        assert_eq!(config.slots[2].product_id, Some(3));
        assert_eq!(config.active_slot, 1);
        assert_eq!(config.banner_text, "Hi");
        assert_eq!(config.campaign_message, "Win");
    }

    #[test]
    fn live_state_with_unknown_values_is_tolerated() {
        let defaults = CampaignDefaults::default();
        let mut entity = LiveStateEntity::from(&CampaignState::initial(&defaults));
        entity.phase = "exploded".into();
        entity.slot_type = "quad".into();
        entity.slot_config = "[[[".into();
        entity.countdown_seconds = 0;

        let state = entity.into_state(&defaults);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.slot_type, SlotType::Triple);
        assert!(state.slot_config.is_empty());
        assert_eq!(state.countdown_seconds, defaults.countdown_seconds);
    }
}
