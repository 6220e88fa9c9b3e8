//! Runtime representation of the singleton campaign record and the pure
//! helpers derived from it (big-win detection, discounted prices).

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::CampaignDefaults;

/// Maximum number of display windows on the LED screen.
pub const SLOT_COUNT: usize = 3;

/// Display mode of the campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing is running; the screen shows the resting layout.
    #[default]
    Idle,
    /// Teaser countdown before the reels start spinning.
    Countdown,
    /// Reels are spinning.
    Active,
    /// Reels stopped and the campaign message is shown.
    Winner,
}

impl Phase {
    /// Parse the persisted textual form, returning `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "idle" => Some(Self::Idle),
            "countdown" => Some(Self::Countdown),
            "active" => Some(Self::Active),
            "winner" => Some(Self::Winner),
            _ => None,
        }
    }

    /// Persisted textual form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown => "countdown",
            Self::Active => "active",
            Self::Winner => "winner",
        }
    }
}

/// Whether one or all three display windows participate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    /// Only `active_slot` is highlighted.
    Single,
    /// All three windows participate uniformly.
    #[default]
    Triple,
}

impl SlotType {
    /// Parse the persisted textual form, returning `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Self::Single),
            "triple" => Some(Self::Triple),
            _ => None,
        }
    }

    /// Persisted textual form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Triple => "triple",
        }
    }
}

/// Discount rule applied to the product shown in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage off the base price.
    Percentage,
    /// `discount_value` is subtracted from the base price.
    Fixed,
    /// `discount_value` replaces the base price.
    Manual,
    /// Base price is shown unchanged. Unknown rules decode to this variant.
    #[default]
    #[serde(other)]
    None,
}

/// Configuration of one display window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    /// Product shown in the window; `None` leaves the window empty.
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Rule applied to the product's base price.
    #[serde(default)]
    pub discount_type: DiscountType,
    /// Percentage, amount or replacement price depending on the rule.
    #[serde(default)]
    pub discount_value: f64,
}

impl SlotEntry {
    /// Price displayed after applying the slot's discount rule to `base_price`.
    pub fn discounted_price(&self, base_price: f64) -> f64 {
        match self.discount_type {
            DiscountType::None => base_price,
            DiscountType::Percentage => base_price * (1.0 - self.discount_value / 100.0),
            DiscountType::Fixed => base_price - self.discount_value,
            DiscountType::Manual => self.discount_value,
        }
    }
}

/// True when all three slots reference the same, non-null product.
pub fn is_big_win(slots: &[SlotEntry]) -> bool {
    let [first, second, third] = slots else {
        return false;
    };
    match first.product_id {
        Some(id) => second.product_id == Some(id) && third.product_id == Some(id),
        None => false,
    }
}

/// The single campaign record shared by every client.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignState {
    /// Current display mode.
    pub phase: Phase,
    /// Seconds until the next automatic transition; 0 while idle.
    pub timer_remaining: u32,
    /// Informational only; `timer_remaining` is authoritative.
    pub phase_started_at: SystemTime,
    /// One or three participating windows.
    pub slot_type: SlotType,
    /// Highlighted window, meaningful only for [`SlotType::Single`].
    pub active_slot: u8,
    /// Up to three window configurations.
    pub slot_config: Vec<SlotEntry>,
    /// Static banner line.
    pub banner_text: String,
    /// Text of the winner screen; blank means no winner can be shown.
    pub campaign_message: String,
    /// Scrolling text.
    pub marquee_text: String,
    /// Marquee speed keyword.
    pub marquee_speed: String,
    /// Seconds armed by start-countdown.
    pub countdown_seconds: u32,
    /// Seconds armed by start-now.
    pub active_duration: u32,
    /// Seconds armed by show-winner.
    pub winner_duration: u32,
    /// Last mutation time.
    pub updated_at: SystemTime,
}

impl CampaignState {
    /// Record created at first boot: idle, no timer, configured defaults.
    pub fn initial(defaults: &CampaignDefaults) -> Self {
        let now = SystemTime::now();
        Self {
            phase: Phase::Idle,
            timer_remaining: 0,
            phase_started_at: now,
            slot_type: SlotType::default(),
            active_slot: 0,
            slot_config: Vec::new(),
            banner_text: defaults.banner_text.clone(),
            campaign_message: String::new(),
            marquee_text: defaults.marquee_text.clone(),
            marquee_speed: defaults.marquee_speed.clone(),
            countdown_seconds: defaults.countdown_seconds,
            active_duration: defaults.active_duration,
            winner_duration: defaults.winner_duration,
            updated_at: now,
        }
    }

    /// Whether the current slot configuration is a big win.
    pub fn is_big_win(&self) -> bool {
        is_big_win(&self.slot_config)
    }

    /// Whether a winner can be shown, i.e. the campaign message is not blank.
    pub fn has_campaign_message(&self) -> bool {
        !self.campaign_message.trim().is_empty()
    }
}

/// Named snapshot of slot configuration and text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTemplate {
    /// Store-assigned identifier.
    pub id: i64,
    /// Operator-facing label.
    pub name: String,
    /// Copied into the record on load.
    pub slot_type: SlotType,
    /// Copied into `slot_config` on load.
    pub slots: Vec<SlotEntry>,
    /// Copied into the record on load.
    pub active_slot: u8,
    /// Copied into the record on load.
    pub banner_text: String,
    /// Copied into the record on load.
    pub campaign_message: String,
    /// Insertion time; listings are newest first.
    pub created_at: SystemTime,
}

impl SlotTemplate {
    /// Whether the template's slots form a big win.
    pub fn is_big_win(&self) -> bool {
        is_big_win(&self.slots)
    }
}

/// Catalogue entry that slots refer to by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Identifier referenced by [`SlotEntry::product_id`].
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Image URL or a glyph (emoji) rendered in place of an image.
    pub icon_url: String,
    /// Price before any slot discount.
    pub base_price: f64,
    /// Grouping used for catalogue ordering.
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(product_id: Option<i64>) -> SlotEntry {
        SlotEntry {
            product_id,
            ..SlotEntry::default()
        }
    }

    #[test]
    fn big_win_requires_three_identical_products() {
        assert!(is_big_win(&[slot(Some(5)), slot(Some(5)), slot(Some(5))]));
        assert!(!is_big_win(&[slot(Some(5)), slot(Some(5)), slot(Some(6))]));
        assert!(!is_big_win(&[slot(Some(5)), slot(None), slot(Some(5))]));
        assert!(!is_big_win(&[slot(None), slot(None), slot(None)]));
    }

    #[test]
    fn big_win_requires_exactly_three_slots() {
        assert!(!is_big_win(&[]));
        assert!(!is_big_win(&[slot(Some(1)), slot(Some(1))]));
    }

    #[test]
    fn discount_rules() {
        let mut entry = SlotEntry {
            product_id: Some(1),
            discount_type: DiscountType::Percentage,
            discount_value: 25.0,
        };
        assert_eq!(entry.discounted_price(200.0), 150.0);

        entry.discount_type = DiscountType::Fixed;
        assert_eq!(entry.discounted_price(200.0), 175.0);

        entry.discount_type = DiscountType::Manual;
        assert_eq!(entry.discounted_price(200.0), 25.0);

        entry.discount_type = DiscountType::None;
        assert_eq!(entry.discounted_price(200.0), 200.0);
    }

    #[test]
    fn slot_entry_uses_client_field_names() {
        let entry: SlotEntry = serde_json::from_str(
            r#"{"productId":3,"discountType":"percentage","discountValue":10}"#,
        )
        .unwrap();
        assert_eq!(entry.product_id, Some(3));
        assert_eq!(entry.discount_type, DiscountType::Percentage);
        assert_eq!(entry.discount_value, 10.0);
    }

    #[test]
    fn unknown_discount_type_decodes_as_none() {
        let entry: SlotEntry =
            serde_json::from_str(r#"{"productId":null,"discountType":"bogus"}"#).unwrap();
        assert_eq!(entry.product_id, None);
        assert_eq!(entry.discount_type, DiscountType::None);
    }

    #[test]
    fn blank_message_does_not_count() {
        let mut state = CampaignState::initial(&CampaignDefaults::default());
        assert!(!state.has_campaign_message());
        state.campaign_message = "   ".into();
        assert!(!state.has_campaign_message());
        state.campaign_message = "WIN".into();
        assert!(state.has_campaign_message());
    }
}
