//! WebSocket ingress.
//!
//! One task per connection reads client frames; a writer task owns the
//! sink so that command responses and the periodic outbox push cannot
//! interleave mid-frame. Handler failures become error frames; the
//! connection only drops when the peer goes away.

pub mod handlers;
pub mod protocol;

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::server::protocol::{Inbound, error_frame, parse_frame, request_frame, response};
use crate::state::SharedApp;

/// Binds the listener and accepts connections until the stop signal flips.
/// A failed bind propagates: the process must not come up half-deaf.
pub async fn run_server(app: SharedApp, stop: watch::Receiver<bool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&app.config.ws_bind).await?;
    info!(bind = %app.config.ws_bind, "server listening");

    let mut accept_stop = stop.clone();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                tokio::spawn(handle_connection(app.clone(), stream, peer, stop.clone()));
            }
            _ = accept_stop.changed() => {
                info!("server stopping");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    app: SharedApp,
    stream: TcpStream,
    peer: SocketAddr,
    stop: watch::Receiver<bool>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    info!(%peer, "client connected");

    let (mut sink, mut read) = ws.split();

    // single writer: responses and pushes funnel through one channel
    let (tx, mut rx) = mpsc::channel::<Message>(32);
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    let push = tokio::spawn(push_outbox(app.clone(), tx.clone(), stop));

    while let Some(incoming) = read.next().await {
        let msg = match incoming {
            Ok(m) => m,
            Err(e) => {
                warn!(%peer, error = %e, "read failed; closing connection");
                break;
            }
        };
        if !msg.is_text() {
            continue;
        }
        let raw = match msg.to_text() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let reply = handle_frame(&app, raw).await;
        if tx.send(Message::Text(reply.to_string().into())).await.is_err() {
            break;
        }
    }

    push.abort();
    drop(tx);
    let _ = writer.await;
    info!(%peer, "client disconnected");
}

/// Parses and executes one raw frame. Always produces a response frame;
/// the server never goes silent on a malformed message.
async fn handle_frame(app: &SharedApp, raw: &str) -> Value {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "unparseable frame");
            return error_frame(&AppError::Validation("invalid JSON".into()));
        }
    };

    let authorized = value
        .get("auth")
        .and_then(Value::as_str)
        .map(|secret| secret == app.config.ws_auth)
        .unwrap_or(false);
    if !authorized {
        return error_frame(&AppError::Auth);
    }

    match parse_frame(&value) {
        Inbound::NoType => response(100, "ok", ""),
        Inbound::Unknown => error_frame(&AppError::UnknownCommand),
        Inbound::Invalid(detail) => error_frame(&AppError::Validation(detail)),
        Inbound::Command(cmd) => match handlers::execute(app, cmd).await {
            Ok(frame) => frame,
            Err(err) => {
                if err.code() >= 500 {
                    error!(error = ?err, "handler failure");
                }
                error_frame(&err)
            }
        },
    }
}

/// Delivers computed routes to this connection as server-initiated
/// `request` frames.
async fn push_outbox(app: SharedApp, tx: mpsc::Sender<Message>, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(app.config.push_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(ready) = app.outbox.pop() else { continue };
                let frame = request_frame(&ready);
                if tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                    return;
                }
                debug!(trigger = ?ready.trigger, "route pushed to client");
            }
            _ = stop.changed() => return,
        }
    }
}
