//! WebSocket endpoint relaying live edits between viewers of one paste.

use crate::{broadcast::Broadcaster, error::HttpError, AppError, AppState};
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use pastectl_core::ids::is_well_formed_id;
use std::sync::Arc;

/// Upgrade to a WebSocket joined to `id`'s viewer set.
///
/// # Errors
/// 404 for ids that cannot name a paste. Requests that are not valid
/// upgrades get the upgrade rejection response.
pub async fn live_updates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, HttpError> {
    if !is_well_formed_id(&id) {
        return Err(AppError::NotFound.into());
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let live = state.live.clone();
    Ok(ws.on_upgrade(move |socket| relay_socket(socket, live, id)))
}

async fn relay_socket(mut socket: WebSocket, live: Arc<Broadcaster<Message>>, paste_id: String) {
    let mut viewer = match live.join(&paste_id) {
        Ok(viewer) => viewer,
        Err(err) => {
            tracing::warn!("Rejecting live viewer for paste {}: {}", paste_id, err);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    tracing::info!("{} connected to paste {}", viewer.id(), paste_id);

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => {
                    if let Err(err) = live.relay(&paste_id, viewer.id(), message) {
                        tracing::warn!("Stopping relay for {}: {}", viewer.id(), err);
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::info!("WebSocket receive error for {}: {}", viewer.id(), err);
                    break;
                }
            },
            outgoing = viewer.recv() => match outgoing {
                Some(message) => {
                    if let Err(err) = socket.send(message).await {
                        tracing::info!("WebSocket send error for {}: {}", viewer.id(), err);
                        break;
                    }
                }
                None => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    if let Err(err) = live.leave(&paste_id, viewer.id()) {
        tracing::error!("Failed to unregister {}: {}", viewer.id(), err);
    }
    tracing::info!("{} disconnected from paste {}", viewer.id(), paste_id);
}
