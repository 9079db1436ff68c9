//! # Summary
//!
//! This module implements the per-node message router: the hub that pulls
//! inbound messages off the transport and demultiplexes them by category
//! into one bounded inbox per role.
//!
//! | Category          | Inbox    |
//! |-------------------|----------|
//! | Prepare, Propose  | acceptor |
//! | Ack, Heartbeat    | proposer |
//! | Accept            | learner  |
//!
//! The clonable `Handle` is the outbound half given to each role. It
//! short-circuits messages a node addresses to itself into the local
//! inboxes, so a proposer preparing against its co-located acceptor never
//! touches the transport.

use std::sync::Arc;

use log::warn;
use tokio_util::sync::CancellationToken;

use crate::internal;
use crate::message::{Category, Message};
use crate::transport::Transport;

/// Bound on each role inbox.
const INBOX_CAPACITY: usize = 1024;

/// Receiving ends of the three role inboxes.
pub struct Inboxes {
    pub proposer: internal::Rx<Message>,
    pub acceptor: internal::Rx<Message>,
    pub learner: internal::Rx<Message>,
}

/// Outbound message path shared by the roles of one node.
#[derive(Clone)]
pub struct Handle {
    id: usize,
    transport: Arc<dyn Transport>,
    proposer_tx: internal::Tx<Message>,
    acceptor_tx: internal::Tx<Message>,
    learner_tx: internal::Tx<Message>,
    cancel: CancellationToken,
}

impl Handle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Sends a message, short-circuiting self-addressed ones past the
    /// transport. Remote sends that fail are dropped: delivery is
    /// best-effort and the protocol's retries absorb the loss.
    pub async fn send(&self, message: Message) {
        if message.to == self.id {
            self.deliver(message).await;
            return;
        }
        if let Err(error) = self.transport.send(message).await {
            warn!("node {}: dropping outbound message: {}", self.id, error);
        }
    }

    /// Queues a message on the inbox matching its category, waiting for a
    /// slot until cancelled.
    async fn deliver(&self, message: Message) {
        let inbox = match message.category {
        | Category::Prepare | Category::Propose => &self.acceptor_tx,
        | Category::Ack | Category::Heartbeat => &self.proposer_tx,
        | Category::Accept => &self.learner_tx,
        };
        tokio::select! {
            () = self.cancel.cancelled() => (),
            _ = inbox.send(message) => (),
        }
    }
}

/// Inbound pump: reads from the transport and fans out to the inboxes.
pub struct Router {
    handle: Handle,
}

impl Router {
    /// Wires a router for one node, returning the outbound handle and the
    /// role inboxes alongside it.
    pub fn new(
        id: usize,
        transport: Arc<dyn Transport>,
        cancel: CancellationToken,
    ) -> (Router, Handle, Inboxes) {
        let (proposer_tx, proposer) = internal::channel(INBOX_CAPACITY);
        let (acceptor_tx, acceptor) = internal::channel(INBOX_CAPACITY);
        let (learner_tx, learner) = internal::channel(INBOX_CAPACITY);
        let handle = Handle {
            id,
            transport,
            proposer_tx,
            acceptor_tx,
            learner_tx,
            cancel,
        };
        let router = Router {
            handle: handle.clone(),
        };
        let inboxes = Inboxes {
            proposer,
            acceptor,
            learner,
        };
        (router, handle, inboxes)
    }

    /// Runs until cancelled or the transport closes.
    pub async fn run(self) {
        loop {
            let inbound = tokio::select! {
                () = self.handle.cancel.cancelled() => return,
                inbound = self.handle.transport.recv() => inbound,
            };
            match inbound {
            | Ok(message) => self.handle.deliver(message).await,
            | Err(_) => return,
            }
        }
    }
}
