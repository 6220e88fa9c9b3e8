use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{LiveStateEntity, ProductEntity, TemplateEntity};

/// `_id` of the single document in the live state collection.
pub const LIVE_STATE_ID: &str = "live";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProductDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    #[serde(default)]
    icon_url: String,
    base_price: f64,
    #[serde(default)]
    category: String,
}

impl From<ProductEntity> for MongoProductDocument {
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

impl From<MongoProductDocument> for ProductEntity {
    fn from(value: MongoProductDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            icon_url: value.icon_url,
            base_price: value.base_price,
            category: value.category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTemplateDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    slot_type: String,
    #[serde(default)]
    config: String,
    created_at: DateTime,
}

impl From<TemplateEntity> for MongoTemplateDocument {
    fn from(value: TemplateEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            slot_type: value.slot_type,
            config: value.config,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoTemplateDocument> for TemplateEntity {
    fn from(value: MongoTemplateDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            slot_type: value.slot_type,
            config: value.config,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLiveStateDocument {
    #[serde(rename = "_id")]
    id: String,
    phase: String,
    timer_remaining: u32,
    phase_started_at: DateTime,
    slot_type: String,
    active_slot: u8,
    #[serde(default)]
    slot_config: String,
    #[serde(default)]
    banner_text: String,
    #[serde(default)]
    campaign_message: String,
    #[serde(default)]
    marquee_text: String,
    #[serde(default)]
    marquee_speed: String,
    #[serde(default)]
    countdown_seconds: u32,
    #[serde(default)]
    active_duration: u32,
    #[serde(default)]
    winner_duration: u32,
    updated_at: DateTime,
}

impl From<LiveStateEntity> for MongoLiveStateDocument {
    fn from(value: LiveStateEntity) -> Self {
        Self {
            id: LIVE_STATE_ID.to_owned(),
            phase: value.phase,
            timer_remaining: value.timer_remaining,
            phase_started_at: DateTime::from_system_time(value.phase_started_at),
            slot_type: value.slot_type,
            active_slot: value.active_slot,
            slot_config: value.slot_config,
            banner_text: value.banner_text,
            campaign_message: value.campaign_message,
            marquee_text: value.marquee_text,
            marquee_speed: value.marquee_speed,
            countdown_seconds: value.countdown_seconds,
            active_duration: value.active_duration,
            winner_duration: value.winner_duration,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoLiveStateDocument> for LiveStateEntity {
    fn from(value: MongoLiveStateDocument) -> Self {
        Self {
            phase: value.phase,
            timer_remaining: value.timer_remaining,
            phase_started_at: value.phase_started_at.to_system_time(),
            slot_type: value.slot_type,
            active_slot: value.active_slot,
            slot_config: value.slot_config,
            banner_text: value.banner_text,
            campaign_message: value.campaign_message,
            marquee_text: value.marquee_text,
            marquee_speed: value.marquee_speed,
            countdown_seconds: value.countdown_seconds,
            active_duration: value.active_duration,
            winner_duration: value.winner_duration,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Monotonic id sequence, one document per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}
