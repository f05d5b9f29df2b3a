// Session view and live websocket session tests

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use todo_app::models::NewTodo;
use todo_app::routes::router;
use todo_app::session::{NotificationVariant, SessionCommand, SessionEvent, SessionView};
use todo_app::AppState;

mod test_helpers;
use test_helpers::*;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(200);

fn open_view(
    state: &AppState,
    author: &str,
) -> (SessionView, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = state.hub.register(forward_to(tx));
    (SessionView::new(author, state.clone(), subscription), rx)
}

fn notification(message: &str, variant: NotificationVariant) -> SessionEvent {
    SessionEvent::notification(message, variant)
}

fn snapshot_titles(event: &SessionEvent) -> Vec<String> {
    match event {
        SessionEvent::Snapshot { todos, .. } => todos.iter().map(|t| t.title.clone()).collect(),
        other => panic!("expected snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn test_open_shows_current_todos() {
    let state = test_state();
    state
        .todos
        .create(NewTodo::new("Running", "Get Going", "Admin"))
        .await
        .unwrap();
    let (mut view, _rx) = open_view(&state, "alice");

    let events = view.open().await;

    assert_eq!(events.len(), 1);
    assert_eq!(snapshot_titles(&events[0]), vec!["Running"]);
    assert_eq!(view.author(), "alice");
    assert_eq!(view.todos().len(), 1);
}

#[tokio::test]
async fn test_create_in_one_session_refreshes_the_other() {
    let state = test_state();
    let (mut a, mut a_rx) = open_view(&state, "A");
    let (mut b, mut b_rx) = open_view(&state, "B");
    a.open().await;
    b.open().await;

    let events = a
        .handle_command(SessionCommand::Create {
            title: "Running".to_string(),
            body: "Get Going".to_string(),
        })
        .await;
    assert_eq!(snapshot_titles(&events[0]), vec!["Running"]);
    assert_eq!(
        events[1],
        notification("Todo item added successfully", NotificationVariant::Success)
    );

    let message = recv_within(&mut b_rx, WAIT).await.expect("broadcast for B");
    assert_eq!(message, "Todo Item added by: A");
    // The originating session already shows the change
    assert_eq!(recv_within(&mut a_rx, QUIET).await, None);

    let events = b.on_broadcast(&message).await;
    assert_eq!(snapshot_titles(&events[0]), vec!["Running"]);
    assert_eq!(
        events[1],
        notification("Todo Item added by: A", NotificationVariant::Success)
    );
    assert_eq!(b.todos(), a.todos());
}

#[tokio::test]
async fn test_create_without_title_is_rejected_locally() {
    let state = test_state();
    let (mut a, _a_rx) = open_view(&state, "A");
    let (_b, mut b_rx) = open_view(&state, "B");

    let events = a
        .handle_command(SessionCommand::Create {
            title: "  ".to_string(),
            body: "ignored".to_string(),
        })
        .await;

    assert_eq!(
        events,
        vec![notification("Please enter a title", NotificationVariant::Error)]
    );
    assert!(state.todos.find_all().await.unwrap().is_empty());
    assert_eq!(recv_within(&mut b_rx, QUIET).await, None);
}

#[tokio::test]
async fn test_remove_with_empty_selection_prompts() {
    let state = test_state();
    let (mut a, _rx) = open_view(&state, "A");

    let events = a.handle_command(SessionCommand::Remove { ids: vec![] }).await;

    assert_eq!(
        events,
        vec![notification(
            "Please select at least one item to remove",
            NotificationVariant::Contrast
        )]
    );
}

#[tokio::test]
async fn test_remove_selected_broadcasts_count() {
    let state = test_state();
    let mut ids = Vec::new();
    for title in ["Running", "Learning", "Walking"] {
        let todo = state.todos.create(NewTodo::new(title, "", "Admin")).await.unwrap();
        ids.push(todo.id);
    }
    let (mut a, _a_rx) = open_view(&state, "A");
    let (_b, mut b_rx) = open_view(&state, "B");

    let events = a
        .handle_command(SessionCommand::Remove {
            ids: ids[..2].to_vec(),
        })
        .await;

    assert_eq!(snapshot_titles(&events[0]), vec!["Walking"]);
    assert_eq!(
        events[1],
        notification("2 item(s) removed successfully", NotificationVariant::Success)
    );
    assert_eq!(
        recv_within(&mut b_rx, WAIT).await.as_deref(),
        Some("Removed 2 Todo item(s) by: A")
    );
}

#[tokio::test]
async fn test_clear_files_empties_the_store() {
    let state = test_state();
    state
        .files
        .store(b"%PDF-1.4".to_vec(), "notes.pdf", "application/pdf")
        .await
        .unwrap();
    let (mut a, _a_rx) = open_view(&state, "A");
    let (_b, mut b_rx) = open_view(&state, "B");
    a.open().await;
    assert_eq!(a.files().len(), 1);

    let events = a.handle_command(SessionCommand::ClearFiles).await;

    assert!(a.files().is_empty());
    assert_eq!(
        events[1],
        notification("All files cleared", NotificationVariant::Success)
    );
    assert_eq!(
        recv_within(&mut b_rx, WAIT).await.as_deref(),
        Some("All files cleared by: A")
    );
}

#[test]
fn test_commands_parse_from_json() {
    let create: SessionCommand =
        serde_json::from_value(json!({ "type": "create", "title": "Running" })).unwrap();
    assert_eq!(
        create,
        SessionCommand::Create {
            title: "Running".to_string(),
            body: String::new()
        }
    );

    let clear: SessionCommand = serde_json::from_value(json!({ "type": "clear_files" })).unwrap();
    assert_eq!(clear, SessionCommand::ClearFiles);

    assert!(serde_json::from_value::<SessionCommand>(json!({ "type": "explode" })).is_err());
}

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn next_event(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("event within timeout")
            .expect("socket open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("json event");
        }
    }
}

async fn connect(addr: std::net::SocketAddr, author: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws/t/{}", addr, author))
        .await
        .expect("websocket connect");
    client
}

#[tokio::test]
async fn test_live_sessions_over_websocket() {
    let state = test_state();
    let hub = state.hub.clone();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    let mut alice = connect(addr, "alice").await;
    let mut bob = connect(addr, "bob").await;

    let first = next_event(&mut alice).await;
    assert_eq!(first["type"], "snapshot");
    assert_eq!(first["author"], "alice");
    assert_eq!(next_event(&mut bob).await["type"], "snapshot");
    assert_eq!(hub.subscriber_count(), 2);

    alice
        .send(Message::Text(
            json!({ "type": "create", "title": "Running", "body": "Get Going" }).to_string(),
        ))
        .await
        .unwrap();

    let snapshot = next_event(&mut alice).await;
    assert_eq!(snapshot["todos"][0]["title"], "Running");
    let toast = next_event(&mut alice).await;
    assert_eq!(toast["message"], "Todo item added successfully");
    assert_eq!(toast["variant"], "success");

    let refreshed = next_event(&mut bob).await;
    assert_eq!(refreshed["type"], "snapshot");
    assert_eq!(refreshed["todos"][0]["author"], "alice");
    let toast = next_event(&mut bob).await;
    assert_eq!(toast["message"], "Todo Item added by: alice");

    alice.send(Message::Text("not json".to_string())).await.unwrap();
    let rejected = next_event(&mut alice).await;
    assert_eq!(rejected["variant"], "error");

    alice.close(None).await.unwrap();
    let deadline = tokio::time::Instant::now() + WAIT;
    while hub.subscriber_count() > 1 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.subscriber_count(), 1);
}
