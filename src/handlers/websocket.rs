use std::collections::HashMap;

use axum::{
    extract::State,
    extract::ws::{WebSocket, WebSocketUpgrade},
    extract::Query,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{app_state::AppState, protocol::WebSocketConnection, service::handle_terminal_session};

/// `GET /terminal?host&port&username&password`
pub async fn terminal_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

pub async fn handle_socket(socket: WebSocket, query: HashMap<String, String>, state: AppState) {
    let connection = WebSocketConnection::new(socket, Uuid::new_v4().to_string());

    // The relay authenticates on its own and never touches the registry
    handle_terminal_session(
        connection,
        query,
        state.shell_connector.clone(),
        state.config.terminal.clone(),
    )
    .await;
}
