//! # Summary
//!
//! This module defines the transport contract between nodes, and an
//! in-process channel-backed implementation used by the test harness and
//! demos.
//!
//! The core never opens sockets itself: a node hands every remote-bound
//! message to its `Transport` and pulls inbound messages from it. A
//! production deployment plugs in a network transport (the `Message`
//! wire helpers in `message.rs` cover the encoding side); everything in
//! the protocol engine stays unchanged.

use std::collections::HashMap as Map;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::message::Message;

/// Per-endpoint buffer for in-flight messages.
const WIRE_CAPACITY: usize = 1024;

/// Pluggable message transport between nodes.
///
/// Both methods must be safe under concurrent calls from different tasks.
/// `recv` must be cancel-safe: the router drops the in-flight future when
/// its node shuts down, and no message may be lost or duplicated by that.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a message to the node it is addressed to. May block for
    /// backpressure; must either deliver or return an error.
    async fn send(&self, message: Message) -> Result<(), Error>;

    /// Blocks until a message addressed to this endpoint arrives.
    async fn recv(&self) -> Result<Message, Error>;
}

/// In-process transport backed by bounded channels.
///
/// Every endpoint in a group can reach every other; per-sender FIFO order
/// holds because each recipient owns a single ordered queue.
pub struct ChannelTransport {
    inbound: Mutex<mpsc::Receiver<Message>>,
    peers: Map<usize, mpsc::Sender<Message>>,
}

impl ChannelTransport {
    /// Creates a fully connected group of in-process transports, one per
    /// node ID.
    pub fn group(ids: &[usize]) -> Map<usize, ChannelTransport> {
        let mut senders = Map::new();
        let mut receivers = Map::new();
        for &id in ids {
            let (tx, rx) = mpsc::channel(WIRE_CAPACITY);
            senders.insert(id, tx);
            receivers.insert(id, rx);
        }

        let mut group = Map::new();
        for &id in ids {
            if let Some(inbound) = receivers.remove(&id) {
                group.insert(
                    id,
                    ChannelTransport {
                        inbound: Mutex::new(inbound),
                        peers: senders.clone(),
                    },
                );
            }
        }
        group
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: Message) -> Result<(), Error> {
        let peer = self
            .peers
            .get(&message.to)
            .ok_or(Error::UnknownRecipient(message.to))?;
        peer.send(message).await.map_err(|_| Error::Closed)
    }

    async fn recv(&self) -> Result<Message, Error> {
        self.inbound.lock().await.recv().await.ok_or(Error::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_between_group_members() {
        let mut group = ChannelTransport::group(&[1, 2]);
        let one = group.remove(&1).unwrap();
        let two = group.remove(&2).unwrap();

        one.send(Message::heartbeat(1, 2)).await.unwrap();
        let message = two.recv().await.unwrap();
        assert_eq!(message.from, 1);
        assert_eq!(message.to, 2);
    }

    #[tokio::test]
    async fn rejects_unknown_recipient() {
        let mut group = ChannelTransport::group(&[1]);
        let one = group.remove(&1).unwrap();

        let result = one.send(Message::heartbeat(1, 9)).await;
        assert!(matches!(result, Err(Error::UnknownRecipient(9))));
    }
}
