//! Outbound messages pushed through the client hub.

use std::time::SystemTime;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::{campaign::CampaignStateDto, unix_millis, ws::OutboundMessage},
    state::{AppState, ClientKind, ServerEvent, campaign::CampaignState},
};

fn now_millis() -> u64 {
    unix_millis(SystemTime::now())
}

fn encode(message: &OutboundMessage) -> Option<ServerEvent> {
    match ServerEvent::json(message.kind(), message) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, kind = message.kind(), "failed to serialize outbound message");
            None
        }
    }
}

/// Full `state_update` message for `record`.
pub fn state_update(record: &CampaignState) -> OutboundMessage {
    OutboundMessage::StateUpdate {
        data: CampaignStateDto::from(record),
        timestamp: now_millis(),
    }
}

/// Broadcast the full record to every client.
pub fn broadcast_state(state: &AppState, record: &CampaignState) {
    if let Some(event) = encode(&state_update(record)) {
        let delivered = state.hub().broadcast(event);
        debug!(phase = record.phase.as_str(), delivered, "state_update broadcast");
    }
}

/// Broadcast a lightweight `timer_tick`.
pub fn broadcast_tick(state: &AppState, remaining: u32) {
    let message = OutboundMessage::TimerTick {
        remaining,
        timestamp: now_millis(),
    };
    if let Some(event) = encode(&message) {
        state.hub().broadcast(event);
    }
}

/// Send the full record to one client, typically right after it connects.
pub fn send_state_to(state: &AppState, client: &Uuid, record: &CampaignState) -> bool {
    encode(&state_update(record))
        .map(|event| state.hub().send_to(client, event))
        .unwrap_or(false)
}

/// Register a new client and queue the current record as its first message.
///
/// Registration and the snapshot happen under the machine lock, so no
/// broadcast can slip in ahead of the snapshot.
pub async fn connect_client(
    state: &AppState,
    kind: ClientKind,
) -> (Uuid, UnboundedReceiver<ServerEvent>) {
    let machine = state.machine().lock().await;
    let (client_id, events) = state.hub().register(kind);
    send_state_to(state, &client_id, machine.record());
    (client_id, events)
}

/// Report a failed inbound action back to the client that sent it.
pub fn send_error_to(state: &AppState, client: &Uuid, message: impl Into<String>) -> bool {
    let message = OutboundMessage::Error {
        message: message.into(),
        timestamp: now_millis(),
    };
    encode(&message)
        .map(|event| state.hub().send_to(client, event))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, state_machine::CampaignCommand, transitions::run_command},
    };

    fn parse(event: &ServerEvent) -> Value {
        serde_json::from_str(&event.data).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn new_client_gets_the_current_record_first() {
        let state = AppState::new(AppConfig::default());
        run_command(&state, CampaignCommand::StartNow).await;

        let (client_id, mut events) = connect_client(&state, ClientKind::Sse).await;
        assert_eq!(state.hub().len(), 1);

        let first = events.try_recv().expect("snapshot queued on connect");
        assert_eq!(first.event, "state_update");
        let message = parse(&first);
        assert_eq!(message["type"], "state_update");
        assert_eq!(message["data"]["phase"], "active");
        assert_eq!(message["data"]["timer_remaining"], 30);
        assert!(events.try_recv().is_err());

        state.hub().unregister(&client_id);
        assert!(state.hub().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_precedes_later_broadcasts() {
        let state = AppState::new(AppConfig::default());
        let (_client_id, mut events) = connect_client(&state, ClientKind::WebSocket).await;

        run_command(&state, CampaignCommand::Stop).await;
        broadcast_tick(&state, 4);

        let phases: Vec<Value> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| parse(&event))
            .collect();
        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0]["data"]["phase"], "idle");
        assert_eq!(phases[1]["type"], "state_update");
        assert_eq!(phases[2]["type"], "timer_tick");
        assert_eq!(phases[2]["remaining"], 4);
    }

    #[test]
    fn error_reaches_only_the_target_client() {
        let state = AppState::new(AppConfig::default());
        let (target, mut target_rx) = state.hub().register(ClientKind::WebSocket);
        let (_other, mut other_rx) = state.hub().register(ClientKind::WebSocket);

        assert!(send_error_to(&state, &target, "not found: template 9"));

        let message = parse(&target_rx.try_recv().unwrap());
        assert_eq!(message["type"], "error");
        assert_eq!(message["message"], "not found: template 9");
        assert!(other_rx.try_recv().is_err());
    }
}
