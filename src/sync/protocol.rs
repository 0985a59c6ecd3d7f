//! Per-connection message protocol
//!
//! A [`Session`] is opened once the stream handshake has succeeded. From then
//! on it is `Connected` until a disconnect or transport failure moves it to
//! `Terminal`. Inbound messages are JSON objects dispatched on their `type`:
//!
//! - `telemetry` stores `device_id`/`value` and broadcasts a `data_update`
//!   to everyone, the sender included
//! - `ping` gets a `pong` back, nothing else happens
//! - `control` is relayed to everyone as-is
//! - anything else is echoed back to the sender

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};

use super::hub::{encode, BroadcastHub};
use super::registry::{ConnectionHandle, ConnectionId, Registration};
use crate::error::{HubError, HubResult};
use crate::event::{Event, Source};

/// A decoded client message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Telemetry {
        /// Raw field, checked at dispatch so a wrong type gets its own error
        device_id: Option<Value>,
        value: Option<Value>,
    },
    Ping,
    Control {
        target: Option<String>,
        command: Option<String>,
        args: Map<String, Value>,
    },
    /// Unknown or missing `type`; kept whole so it can be echoed
    Other(Value),
}

impl InboundMessage {
    pub fn from_value(message: Value) -> Self {
        match message.get("type").and_then(Value::as_str) {
            Some("telemetry") => InboundMessage::Telemetry {
                device_id: message.get("device_id").cloned(),
                value: message.get("value").cloned(),
            },
            Some("ping") => InboundMessage::Ping,
            Some("control") => InboundMessage::Control {
                target: text_field(&message, "target"),
                command: text_field(&message, "command"),
                args: message
                    .get("args")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
            },
            _ => InboundMessage::Other(message),
        }
    }
}

fn text_field(message: &Value, key: &str) -> Option<String> {
    message.get(key).and_then(Value::as_str).map(str::to_string)
}

fn telemetry_device_id(device_id: Option<Value>) -> HubResult<String> {
    match device_id {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(HubError::protocol("telemetry missing device_id"))
        }
        Some(_) => Err(HubError::protocol("telemetry device_id must be a string")),
    }
}

/// What the stream transport reports to a session
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Message(Value),
    /// A frame arrived that was not JSON
    Malformed(String),
    Disconnect,
    TransportError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Terminal,
}

pub struct Session {
    hub: Arc<BroadcastHub>,
    handle: ConnectionHandle,
    registration: Option<Registration>,
    state: SessionState,
}

impl Session {
    /// Register `handle` and greet it with the current state.
    pub fn open(hub: Arc<BroadcastHub>, handle: ConnectionHandle) -> HubResult<Self> {
        let registration = hub
            .registry()
            .register(handle.clone())
            .ok_or(HubError::AlreadyRegistered(handle.id()))?;
        let mut session = Self {
            hub,
            handle,
            registration: Some(registration),
            state: SessionState::Connected,
        };

        tracing::info!(connection = %session.id(), "subscriber connected");

        let hello = session.hub.hello();
        if let Err(err) = session.reply(&hello) {
            session.close();
            return Err(err);
        }
        Ok(session)
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle one client message.
    ///
    /// Bad input comes back as a protocol or validation error for the caller
    /// to report; [`run`](Self::run) does that and keeps the connection.
    pub fn dispatch(&mut self, message: InboundMessage) -> HubResult<()> {
        if self.state == SessionState::Terminal {
            return Err(HubError::Disconnected);
        }

        match message {
            InboundMessage::Telemetry { device_id, value } => {
                let device_id = telemetry_device_id(device_id)?;
                let value = value.ok_or_else(|| HubError::protocol("telemetry missing value"))?;
                self.hub.submit_data(&device_id, value, Source::Stream)?;
                Ok(())
            }
            InboundMessage::Ping => self.reply(&Event::pong()),
            InboundMessage::Control {
                target,
                command,
                args,
            } => {
                self.hub.submit_control(target, command, args, Source::Stream);
                Ok(())
            }
            InboundMessage::Other(received) => self.reply(&Event::echo(received)),
        }
    }

    /// Drive the session until the stream ends.
    ///
    /// Errors that leave the connection usable are sent back to the client as
    /// an `error` event. Registration is released before this returns, and
    /// only terminations other than a normal disconnect come back as errors.
    pub async fn run<S>(mut self, mut signals: S) -> HubResult<()>
    where
        S: Stream<Item = Signal> + Unpin,
    {
        let outcome = loop {
            let Some(signal) = signals.next().await else {
                break Ok(());
            };
            let step = match signal {
                Signal::Message(value) => self.dispatch(InboundMessage::from_value(value)),
                Signal::Malformed(reason) => {
                    Err(HubError::protocol(format!("malformed message: {reason}")))
                }
                Signal::Disconnect => break Ok(()),
                Signal::TransportError(reason) => break Err(HubError::Transport(reason)),
            };
            match step {
                Ok(()) => {}
                Err(err) if err.category().keeps_connection_open() => {
                    if let Err(err) = self.report(&err) {
                        break Err(err);
                    }
                }
                Err(err) => break Err(err),
            }
        };

        self.close();
        match outcome {
            Err(err) if !err.is_disconnect() => Err(err),
            _ => {
                tracing::info!(connection = %self.id(), "subscriber disconnected");
                Ok(())
            }
        }
    }

    /// Move to `Terminal` and leave the registry. Idempotent.
    pub fn close(&mut self) {
        self.state = SessionState::Terminal;
        self.registration.take();
    }

    fn report(&self, err: &HubError) -> HubResult<()> {
        tracing::debug!(connection = %self.id(), error = %err, "rejected client message");
        self.reply(&Event::error(err.client_message()))
    }

    fn reply(&self, event: &Event) -> HubResult<()> {
        let frame = encode(event)?;
        self.handle.deliver(frame).map_err(|_| HubError::Disconnected)
    }
}
