//! `GET /connect`: hub sessions over WebSocket.
//!
//! Each socket is split: a forwarding task drains the connection's outbound
//! channel into the sink while the handler reads inbound frames and feeds
//! them to the gateway. The session ends when the hub closes the socket or
//! when the gateway closes the connection, e.g. because the same hub
//! reconnected.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use hubgate_app::gateway::Gateway;
use hubgate_app::ports::TokenIntrospector;

use crate::state::AppState;

/// `GET /connect`
pub async fn connect<TI>(ws: WebSocketUpgrade, State(state): State<AppState<TI>>) -> Response
where
    TI: TokenIntrospector + 'static,
{
    ws.on_upgrade(move |socket| serve(socket, state.gateway))
}

async fn serve<TI>(socket: WebSocket, gateway: Arc<Gateway<TI>>)
where
    TI: TokenIntrospector + 'static,
{
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection = gateway.connect(tx);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        let message = tokio::select! {
            message = stream.next() => message,
            () = connection.closed() => {
                tracing::debug!(connection_id = %connection.id(), "hub session closed by gateway");
                break;
            }
        };
        let Some(message) = message else { break };
        match message {
            Ok(Message::Text(text)) => gateway.handle_hub_frame(&connection, text.as_str()).await,
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => gateway.handle_hub_frame(&connection, text).await,
                Err(err) => tracing::warn!(error = %err, "dropping non-utf8 hub frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(err) => {
                tracing::debug!(error = %err, connection_id = %connection.id(), "hub socket error");
                break;
            }
        }
    }

    gateway.disconnect(&connection).await;
    send_task.abort();
}
