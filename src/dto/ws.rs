use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::campaign::{CampaignStateDto, ConfigPatch};

#[derive(Debug, Deserialize)]
/// Messages accepted from channel clients.
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "admin_action")]
    AdminAction(AdminAction),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
/// Control operation carried by an `admin_action` message.
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    StartCountdown,
    StartNow,
    ShowWinner,
    Stop,
    UpdateConfig {
        #[serde(default)]
        config: ConfigPatch,
    },
    LoadTemplate {
        template_id: i64,
    },
}

impl AdminAction {
    /// Wire name of the action, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartCountdown => "start_countdown",
            Self::StartNow => "start_now",
            Self::ShowWinner => "show_winner",
            Self::Stop => "stop",
            Self::UpdateConfig { .. } => "update_config",
            Self::LoadTemplate { .. } => "load_template",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to channel clients. `timestamp` is in milliseconds since the Unix epoch.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    StateUpdate {
        data: CampaignStateDto,
        timestamp: u64,
    },
    TimerTick {
        remaining: u32,
        timestamp: u64,
    },
    Error {
        message: String,
        timestamp: u64,
    },
}

impl OutboundMessage {
    /// Value of the `type` tag, reused as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateUpdate { .. } => "state_update",
            Self::TimerTick { .. } => "timer_tick",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_actions() {
        let message: InboundMessage =
            serde_json::from_str(r#"{"type":"admin_action","action":"start_countdown"}"#).unwrap();
        assert!(matches!(
            message,
            InboundMessage::AdminAction(AdminAction::StartCountdown)
        ));

        let message: InboundMessage = serde_json::from_str(
            r#"{"type":"admin_action","action":"update_config","config":{"banner_text":"Hi","phase":"winner"}}"#,
        )
        .unwrap();
        let InboundMessage::AdminAction(AdminAction::UpdateConfig { config }) = message else {
            panic!("expected update_config");
        };
        assert_eq!(config.banner_text.as_deref(), Some("Hi"));

        let message: InboundMessage = serde_json::from_str(
            r#"{"type":"admin_action","action":"load_template","template_id":7}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            InboundMessage::AdminAction(AdminAction::LoadTemplate { template_id: 7 })
        ));
    }

    #[test]
    fn unknown_message_types_are_tolerated() {
        let message: InboundMessage = serde_json::from_str(r#"{"type":"hello"}"#).unwrap();
        assert!(matches!(message, InboundMessage::Unknown));
    }

    #[test]
    fn unknown_actions_fail_to_parse() {
        assert!(
            serde_json::from_str::<InboundMessage>(r#"{"type":"admin_action","action":"explode"}"#)
                .is_err()
        );
    }

    #[test]
    fn tick_wire_format() {
        let json = serde_json::to_value(OutboundMessage::TimerTick {
            remaining: 2,
            timestamp: 1_700_000_000_000,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "timer_tick", "remaining": 2, "timestamp": 1_700_000_000_000_u64})
        );
    }
}
