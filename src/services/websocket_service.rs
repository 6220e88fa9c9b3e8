use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::InboundMessage,
    services::{campaign_service, hub_events},
    state::{ClientKind, ServerEvent, SharedState},
};

/// Handle the full lifecycle of one channel client: register it, send the
/// current record, then serve inbound actions until the socket closes.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (client_id, mut events) =
        hub_events::connect_client(&state, ClientKind::WebSocket).await;
    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps broadcasts flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(event) = events.recv() => to_ws_message(&event),
                Some(frame) = control_rx.recv() => frame,
                else => break,
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(client = %client_id, clients = state.hub().len(), "channel client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_text(&state, &client_id, text.as_str()).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = control_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(client = %client_id, "channel client closed");
                let _ = control_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(client = %client_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.hub().unregister(&client_id);
    info!(client = %client_id, clients = state.hub().len(), "channel client disconnected");

    finalize(writer_task, control_tx).await;
}

async fn handle_text(state: &SharedState, client_id: &Uuid, text: &str) {
    match serde_json::from_str::<InboundMessage>(text) {
        Ok(InboundMessage::AdminAction(action)) => {
            let name = action.name();
            info!(client = %client_id, action = name, "admin action received");
            if let Err(err) = campaign_service::execute_action(state, action).await {
                warn!(client = %client_id, action = name, error = %err, "admin action failed");
                hub_events::send_error_to(state, client_id, err.to_string());
            }
        }
        Ok(InboundMessage::Unknown) => {
            debug!(client = %client_id, payload = %text, "ignoring unknown message type");
        }
        Err(err) => {
            warn!(client = %client_id, error = %err, "failed to parse channel message");
        }
    }
}

fn to_ws_message(event: &ServerEvent) -> Message {
    Message::Text(event.data.to_string().into())
}

async fn finalize(writer_task: JoinHandle<()>, control_tx: mpsc::UnboundedSender<Message>) {
    drop(control_tx);
    let _ = writer_task.await;
}
