use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    services::hub_events,
    state::{ClientKind, SharedState},
};

/// Register a read-only subscriber in the client hub and expose it as an SSE
/// response. The current record is queued first.
pub async fn subscribe(state: SharedState) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (client_id, mut events) = hub_events::connect_client(&state, ClientKind::Sse).await;
    info!(client = %client_id, clients = state.hub().len(), "SSE client connected");

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = events.recv() => {
                    let Some(payload) = received else {
                        break;
                    };
                    let event = Event::default().event(payload.event).data(&*payload.data);
                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        state.hub().unregister(&client_id);
        info!(client = %client_id, "SSE client disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
