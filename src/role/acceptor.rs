//! # Summary
//!
//! This module implements the `Acceptor`, the role responsible for Paxos
//! safety. For each slot independently it upholds two invariants: never
//! promise a proposal number at or below one it already promised (Phase
//! 1b), and never accept a proposal numbered below its promise (Phase
//! 2b).

use std::collections::HashMap as Map;

use log::{debug, trace, warn};
use tokio_util::sync::CancellationToken;

use crate::internal;
use crate::message::{Category, Message, Prior};
use crate::router::Handle;

/// Per-slot promise and accept state machine.
pub struct Acceptor {
    /// Unique node ID
    id: usize,

    /// Learners notified whenever a proposal is accepted
    learners: Vec<usize>,

    /// Highest-numbered prepare promised so far, per slot
    promised: Map<usize, Message>,

    /// Highest-numbered proposal accepted so far, per slot
    accepted: Map<usize, Message>,

    /// Outbound message path
    handle: Handle,

    /// Inbound prepare/propose messages
    rx: internal::Rx<Message>,

    cancel: CancellationToken,
}

impl Acceptor {
    pub fn new(
        id: usize,
        handle: Handle,
        rx: internal::Rx<Message>,
        learners: Vec<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Acceptor {
            id,
            learners,
            promised: Map::default(),
            accepted: Map::default(),
            handle,
            rx,
            cancel,
        }
    }

    /// Runs until cancelled or the router shuts down.
    pub async fn run(mut self) {
        let cancel = self.cancel.clone();
        loop {
            let message = tokio::select! {
                () = cancel.cancelled() => return,
                message = self.rx.recv() => message,
            };
            let Some(message) = message else { return };
            trace!("acceptor {}: received {:?}", self.id, message);
            match message.category {
            | Category::Prepare => self.respond_prepare(message).await,
            | Category::Propose => self.respond_propose(message).await,
            | category => warn!("acceptor {}: dropping {:?} message", self.id, category),
            }
        }
    }

    fn promised_number(&self, slot: usize) -> usize {
        self.promised.get(&slot).map_or(0, |message| message.number)
    }

    /// Phase 1b. A prepare numbered above the slot's promise is promised
    /// and acknowledged; anything else is dropped without a reply, and
    /// the proposer's timeout drives its retry.
    ///
    /// The ack's `number` is the number being promised; if this slot
    /// already accepted a proposal, its number and value ride along in
    /// `prior` so the proposer can adopt them.
    async fn respond_prepare(&mut self, message: Message) {
        let slot = message.slot;
        if message.number <= self.promised_number(slot) {
            debug!(
                "acceptor {}: ignoring prepare {} at or below promise {} for slot {}",
                self.id,
                message.number,
                self.promised_number(slot),
                slot,
            );
            return;
        }

        let prior = self
            .accepted
            .get(&slot)
            .filter(|accepted| accepted.number > 0)
            .map(|accepted| Prior {
                number: accepted.number,
                value: accepted.value.clone(),
            });
        let ack = Message::ack(
            self.id,
            message.from,
            message.number,
            message.value.clone(),
            slot,
            prior,
        );
        self.promised.insert(slot, message);
        self.handle.send(ack).await;
    }

    /// Phase 2b. A proposal numbered below the slot's promise is
    /// rejected; an equal number is the common path after a successful
    /// prepare and is accepted. Every accepted proposal is fanned out to
    /// the configured learners.
    async fn respond_propose(&mut self, message: Message) {
        let slot = message.slot;
        if self.promised_number(slot) > message.number {
            debug!(
                "acceptor {}: rejecting proposal {} below promise {} for slot {}",
                self.id,
                message.number,
                self.promised_number(slot),
                slot,
            );
            return;
        }

        debug!(
            "acceptor {}: accepted proposal {} for slot {}",
            self.id, message.number, slot,
        );
        self.accepted.insert(slot, message.clone());
        for &learner in &self.learners {
            let accept =
                Message::accept(self.id, learner, message.number, message.value.clone(), slot);
            self.handle.send(accept).await;
        }
    }
}
