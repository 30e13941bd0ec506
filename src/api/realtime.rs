/// WebSocket endpoint for realtime presentation results
///
/// # Protocol
///
/// Frames are JSON text messages.
///
/// Server to client:
/// - `{"type":"connected","channel":"anonymous"}` right after the upgrade
/// - `{"type":"joined","channel":..}` after a login or logout
/// - `{"type":"event","channel":..,"event":..,"data":..}` for published events
/// - `{"type":"error","message":..}` for rejected client messages
///
/// Client to server:
/// - `{"action":"login","userUuid":..}` moves the socket to the user's channel
/// - `{"action":"logout"}` moves it back to the anonymous channel
///
/// The server pings idle connections every 30 seconds.

use crate::{
    channels::{ChannelEvent, ANONYMOUS},
    context::AppContext,
    error::RelayError,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    sync::broadcast::error::RecvError,
    time::{interval, timeout, Duration, Instant},
};

const SEND_TIMEOUT_MS: u64 = 5000;
const PING_INTERVAL_SECS: u64 = 30;

/// Frames sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RealtimeFrame {
    Connected { channel: String },
    Joined { channel: String },
    Event {
        channel: String,
        event: String,
        data: Value,
    },
    Error { message: String },
}

impl From<ChannelEvent> for RealtimeFrame {
    fn from(event: ChannelEvent) -> Self {
        RealtimeFrame::Event {
            channel: event.channel,
            event: event.event,
            data: event.data,
        }
    }
}

/// Messages accepted from the client
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientAction {
    Login {
        #[serde(rename = "userUuid")]
        user_uuid: String,
    },
    Logout,
}

pub fn routes() -> Router<AppContext> {
    Router::new().route("/realtime", get(realtime_upgrade))
}

async fn realtime_upgrade(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, ctx))
}

async fn handle_connection(socket: WebSocket, ctx: AppContext) {
    let _guard = ctx.channels.connect();
    let (mut sender, mut receiver) = socket.split();

    let mut channel = ANONYMOUS.to_string();
    let mut events = ctx.channels.join(&channel).await;
    tracing::debug!(
        connections = ctx.channels.connection_count(),
        "Realtime connection opened"
    );

    let hello = RealtimeFrame::Connected {
        channel: channel.clone(),
    };
    if send_frame(&mut sender, &hello).await.is_err() {
        drop(events);
        ctx.channels.leave(&channel).await;
        return;
    }

    let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if send_frame(&mut sender, &RealtimeFrame::from(event)).await.is_err() {
                            tracing::debug!("Client disconnected during send");
                            break;
                        }
                        last_activity = Instant::now();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %channel, skipped, "Realtime client lagging, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        events = ctx.channels.join(&channel).await;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if last_activity.elapsed() > Duration::from_secs(PING_INTERVAL_SECS)
                    && sender.send(Message::Ping(vec![])).await.is_err()
                {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        let reply = match handle_action(&ctx, &text).await {
                            Ok(next) => {
                                if next != channel {
                                    events = ctx.channels.join(&next).await;
                                    let previous = std::mem::replace(&mut channel, next);
                                    ctx.channels.leave(&previous).await;
                                }
                                RealtimeFrame::Joined { channel: channel.clone() }
                            }
                            Err(e) => RealtimeFrame::Error { message: e.to_string() },
                        };
                        if send_frame(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("Client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        tracing::debug!("Client disconnected");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    drop(events);
    ctx.channels.leave(&channel).await;
}

/// Resolve the channel a client message asks for
async fn handle_action(ctx: &AppContext, text: &str) -> Result<String, RelayError> {
    let action: ClientAction = serde_json::from_str(text)
        .map_err(|e| RelayError::Validation(format!("Unrecognized message: {}", e)))?;

    match action {
        ClientAction::Login { user_uuid } => {
            let user = ctx.users.get(&user_uuid).await?;
            tracing::debug!(user = %user.uuid, "Realtime login");
            Ok(user.uuid)
        }
        ClientAction::Logout => Ok(ANONYMOUS.to_string()),
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &RealtimeFrame,
) -> Result<(), ()> {
    let json = serde_json::to_string(frame).map_err(|_| ())?;
    match timeout(
        Duration::from_millis(SEND_TIMEOUT_MS),
        sender.send(Message::Text(json)),
    )
    .await
    {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(()),
        Err(_) => {
            tracing::warn!("Send timeout, client may be slow");
            Err(())
        }
    }
}
