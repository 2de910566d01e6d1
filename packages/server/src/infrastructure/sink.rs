//! Channel-backed message sink.
//!
//! The WebSocket writer task owns the receiving half and forwards every
//! payload to the socket.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::{MessageSink, SinkError};

/// MessageSink that enqueues payloads on an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, payload: String) -> Result<(), SinkError> {
        self.sender.send(payload).map_err(|_| SinkError::Closed)
    }
}

/// Create a sink and the receiver its writer task drains.
pub fn channel() -> (ChannelSink, UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx), rx)
}
