//! Streaming transport: the single WebSocket connection per page session.
//!
//! The connection task runs for the life of the session: connect, pump
//! frames, and on any close reconnect after a fixed delay. There is no
//! backoff growth and no retry cap; the channel is assumed essential.
//!
//! Outbound sends are refused while the connection is not open. There is
//! no outbound queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ParlorError, Result};
use crate::types::{InboundFrame, OutboundFrame, Role};
use crate::view::Notifier;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
}

/// What the session driver receives from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A parsed inbound frame.
    Frame(InboundFrame),
    /// The connection dropped; any open streaming session must terminate.
    /// Reconnection is already scheduled.
    Disconnected,
}

struct Shared {
    // The published connection handle; None whenever the socket is down.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    state: Mutex<TransportState>,
}

impl Shared {
    fn set_state(&self, state: TransportState) {
        if let Ok(mut slot) = self.state.lock() {
            *slot = state;
        }
    }

    fn publish(&self, sender: Option<mpsc::UnboundedSender<String>>) {
        if let Ok(mut slot) = self.outbound.lock() {
            *slot = sender;
        }
    }
}

/// Handle to the streaming channel.
pub struct Transport {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl Transport {
    /// Open the channel and start the reconnect loop. Returns the
    /// transport handle and the stream of demultiplexed inbound frames.
    pub fn connect(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let shared = Arc::new(Shared {
            outbound: Mutex::new(None),
            state: Mutex::new(TransportState::Connecting),
        });
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_loop(
            config.ws_url.clone(),
            config.reconnect_delay,
            Arc::clone(&shared),
            events_tx,
            notifier,
        ));

        (
            Self {
                shared,
                task: Some(task),
            },
            events_rx,
        )
    }

    /// Create a transport that never connects. Sends always fail with an
    /// invalid-state error; useful as the pre-`init` default and in tests.
    pub fn disconnected() -> Self {
        Self {
            shared: Arc::new(Shared {
                outbound: Mutex::new(None),
                state: Mutex::new(TransportState::Closed),
            }),
            task: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.shared
            .state
            .lock()
            .map(|s| *s)
            .unwrap_or(TransportState::Closed)
    }

    /// Push an outbound chat frame. Fails immediately when the channel is
    /// not open; nothing is queued.
    pub fn send(&self, conversation_id: &str, role: Role, content: &str) -> Result<()> {
        let frame = OutboundFrame {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role,
        };
        let text = serde_json::to_string(&frame)?;

        let guard = self
            .shared
            .outbound
            .lock()
            .map_err(|_| ParlorError::InvalidState("streaming channel unavailable".into()))?;
        let Some(sender) = guard.as_ref() else {
            return Err(ParlorError::InvalidState(
                "streaming channel is not open".into(),
            ));
        };
        sender
            .send(text)
            .map_err(|_| ParlorError::InvalidState("streaming channel is not open".into()))
    }

    /// Tear the channel down. Ends the reconnect loop; only meaningful at
    /// the end of the page session.
    pub fn dispose(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.publish(None);
        self.shared.set_state(TransportState::Closed);
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run_loop(
    ws_url: String,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<TransportEvent>,
    notifier: Arc<dyn Notifier>,
) {
    loop {
        shared.set_state(TransportState::Connecting);
        match connect_async(ws_url.as_str()).await {
            Ok((socket, _)) => {
                info!(url = %ws_url, "streaming channel open");
                let (mut sink, mut stream) = socket.split();
                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
                shared.publish(Some(outbound_tx));
                shared.set_state(TransportState::Open);

                loop {
                    tokio::select! {
                        queued = outbound_rx.recv() => {
                            let Some(text) = queued else { break };
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                warn!(error = %e, "outbound send failed");
                                break;
                            }
                        }
                        frame = stream.next() => {
                            match frame {
                                Some(Ok(Message::Text(text))) => {
                                    match InboundFrame::parse(&text) {
                                        Ok(parsed) => {
                                            if events.send(TransportEvent::Frame(parsed)).is_err() {
                                                // Session gone; stop entirely.
                                                shared.publish(None);
                                                shared.set_state(TransportState::Closed);
                                                return;
                                            }
                                        }
                                        Err(e) => {
                                            // Parse failures are logged and
                                            // dropped, never surfaced.
                                            warn!(error = %e, "dropping unparseable frame");
                                        }
                                    }
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {} // ping/pong/binary
                                Some(Err(e)) => {
                                    warn!(error = %e, "streaming channel error");
                                    notifier.error("Streaming connection error");
                                    break;
                                }
                            }
                        }
                    }
                }

                shared.publish(None);
                shared.set_state(TransportState::Closed);
                let _ = events.send(TransportEvent::Disconnected);
                debug!("streaming channel closed, reconnect pending");
            }
            Err(e) => {
                shared.set_state(TransportState::Closed);
                warn!(error = %e, "streaming channel connect failed");
                notifier.error("Streaming connection error");
            }
        }

        tokio::time::sleep(reconnect_delay).await;
    }
}
