use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::session::{NotificationVariant, SessionCommand, SessionEvent, SessionView};
use crate::AppState;

/// Upgrade `/ws/t/:author` into a session. The author segment is used verbatim.
pub async fn session_socket(
    ws: WebSocketUpgrade,
    Path(author): Path<String>,
    State(state): State<AppState>,
) -> Response {
    tracing::info!("WebSocket session opening for author: {}", author);
    ws.on_upgrade(move |socket| run_session(socket, state, author))
}

async fn run_session(socket: WebSocket, state: AppState, author: String) {
    let (mut sender, mut receiver) = socket.split();

    // Hub deliveries run on the subscriber's worker; forward them to this task so the
    // view is only ever touched here.
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<String>();
    let subscription = state.hub.register(move |message: &str| {
        notify_tx
            .send(message.to_owned())
            .map_err(|_| anyhow::anyhow!("session closed"))
    });

    let mut view = SessionView::new(author, state.clone(), subscription);
    let mut open = send_events(&mut sender, view.open().await).await;

    while open {
        let events = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<SessionCommand>(&text) {
                    Ok(command) => view.handle_command(command).await,
                    Err(e) => {
                        tracing::debug!("Unrecognised session command from {}: {}", view.author(), e);
                        vec![SessionEvent::notification("Unrecognised command", NotificationVariant::Error)]
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!("WebSocket error for {}: {}", view.author(), e);
                    break;
                }
            },
            Some(message) = notify_rx.recv() => view.on_broadcast(&message).await,
        };
        open = send_events(&mut sender, events).await;
    }

    state.hub.unregister(subscription);
    tracing::info!("WebSocket session closed for author: {}", view.author());
}

/// Returns false once the client is gone.
async fn send_events(sender: &mut SplitSink<WebSocket, Message>, events: Vec<SessionEvent>) -> bool {
    for event in events {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialize session event: {:?}", e);
                continue;
            }
        };
        if sender.send(Message::Text(text)).await.is_err() {
            return false;
        }
    }
    true
}
