//! `/ws`: pushes `NotesEvent`s to the frontend so list entries refresh after
//! an autosave flush without polling.
//!
//! The socket is one-way. Incoming text is ignored; pings are answered.

use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures_util::StreamExt;
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

pub async fn ws_handler(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let mut event_rx = state.notes.subscribe();

    log::info!(
        "[WS] Client connected from {}",
        req.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Ok(event) => {
                            let json = match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(e) => {
                                    log::error!("[WS] Failed to encode event: {}", e);
                                    continue;
                                }
                            };
                            log::debug!("[WS] >>> {}", json);
                            if session.text(json).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("[WS] Client lagged, dropped {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                msg = msg_stream.next() => {
                    match msg {
                        Some(Ok(Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(reason))) => {
                            log::debug!("[WS] Client closed: {:?}", reason);
                            let _ = session.close(reason).await;
                            return;
                        }
                        Some(Ok(Message::Text(text))) => {
                            log::debug!("[WS] <<< ignored: {}", text);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            log::error!("[WS] Protocol error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        let _ = session.close(None).await;
        log::info!("[WS] Client disconnected");
    });

    Ok(response)
}
