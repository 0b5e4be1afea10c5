//! # Interview WebSocket
//!
//! Each connection to `/ws` is one actor owning one interview session.
//!
//! ## Flow:
//! 1. **Upgrade**: refused with 503 once `max_concurrent_sessions` are open
//! 2. **Inbound**: every text frame is handed to the [`ConnectionHandler`]
//!    with `ctx.wait`, so frames are handled one at a time in arrival order.
//!    Pongs are not processed while a frame is handled, so finishing one
//!    counts as a heartbeat
//! 3. **Outbound**: replies and interview questions go through one queue that
//!    the actor drains as a stream and writes as JSON text frames
//! 4. **Close**: the session is shut down, which stops a running interview
//!
//! ## Message Format:
//! - **Client → Server**: JSON text frames ([`ClientMessage`](crate::protocol::ClientMessage))
//! - **Server → Client**: JSON text frames ([`ServerMessage`])

use crate::config::AppConfig;
use crate::dispatch::ConnectionHandler;
use crate::error::AppError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

pub struct InterviewSocket {
    handler: ConnectionHandler,
    state: AppState,
    /// Taken when the actor starts and turned into a stream
    outbound_rx: Option<UnboundedReceiver<ServerMessage>>,
    last_heartbeat: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl InterviewSocket {
    pub fn new(state: AppState, config: &AppConfig) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        Self {
            handler: ConnectionHandler::new(state.clone(), outbound),
            state,
            outbound_rx: Some(outbound_rx),
            last_heartbeat: Instant::now(),
            heartbeat_interval: Duration::from_secs(config.interview.heartbeat_interval_secs),
            client_timeout: Duration::from_secs(config.interview.client_timeout_secs),
        }
    }

    fn heartbeat_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_heartbeat) > self.client_timeout
    }

    /// Runs when `ctx.wait` releases the actor after a text frame.
    fn frame_handled(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    fn send_json(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(json) => ctx.text(json),
            Err(e) => error!(session_id = %self.handler.session().id(), error = %e, "Failed to encode reply"),
        }
    }
}

impl Actor for InterviewSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(session_id = %self.handler.session().id(), "WebSocket connection started");

        if let Some(rx) = self.outbound_rx.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }

        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if act.heartbeat_expired(Instant::now()) {
                warn!(session_id = %act.handler.session().id(), "WebSocket heartbeat timeout, closing connection");
                ctx.stop();
            } else {
                ctx.ping(b"");
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(session_id = %self.handler.session().id(), "WebSocket connection stopped");
        self.handler.session().shutdown();
        self.state.close_session();
    }
}

/// Frames from the client.
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for InterviewSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                let handler = self.handler.clone();
                let text = text.to_string();
                ctx.wait(
                    async move { handler.handle_text(&text).await }
                        .into_actor(self)
                        .map(|_, act, _| act.frame_handled()),
                );
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_json(
                    ctx,
                    &ServerMessage::Error {
                        message: "Binary frames are not supported; send audio as base64 in an `audio` message"
                            .to_string(),
                    },
                );
            }
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                info!(session_id = %self.handler.session().id(), ?reason, "WebSocket closed by client");
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                warn!("Received unexpected continuation frame");
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                error!(session_id = %self.handler.session().id(), error = %err, "WebSocket protocol error");
                ctx.stop();
            }
        }
    }
}

/// Messages queued for the client by the handler or the interview task.
impl StreamHandler<ServerMessage> for InterviewSocket {
    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) {
        self.send_json(ctx, &msg);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The handler keeps a sender for the actor's whole life.
        debug!(session_id = %self.handler.session().id(), "Outbound queue closed");
    }
}

/// `GET /ws`: upgrade to an interview connection.
pub async fn interview_websocket(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let config = app_state.get_config();
    let limit = config.performance.max_concurrent_sessions;

    if !app_state.try_open_session(limit) {
        warn!(limit, "Session limit reached, refusing WebSocket connection");
        return Err(AppError::ServiceUnavailable(format!(
            "Maximum of {} concurrent interview sessions reached",
            limit
        ))
        .into());
    }

    debug!(peer = ?req.connection_info().peer_addr(), "WebSocket connection request");

    let state = app_state.get_ref().clone();
    let socket = InterviewSocket::new(state.clone(), &config);
    ws::start(socket, &req, stream).inspect_err(|_| state.close_session())
}
