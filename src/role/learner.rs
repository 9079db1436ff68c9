//! # Summary
//!
//! This module implements the `Learner`, which observes Accept messages
//! from the acceptors and detects, per slot, when a quorum has converged
//! on one proposal number.
//!
//! The learner never sends protocol messages; its only output is the
//! stream of decided entries.

use std::collections::HashMap as Map;
use std::collections::HashSet as Set;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::internal;
use crate::message::{Category, Entry, Message};
use crate::role::majority;

/// Quorum detector over the accept messages of a fixed acceptor set.
pub struct Learner {
    /// Unique node ID
    id: usize,

    /// Number of configured acceptors, fixing the quorum size
    acceptors: usize,

    /// Highest-numbered accept seen from each acceptor, per slot
    accepted: Map<usize, Map<usize, Message>>,

    /// Inbound accept messages
    rx: internal::Rx<Message>,

    cancel: CancellationToken,
}

impl Learner {
    pub fn new(
        id: usize,
        rx: internal::Rx<Message>,
        acceptors: &[usize],
        cancel: CancellationToken,
    ) -> Self {
        Learner {
            id,
            acceptors: acceptors.len(),
            accepted: Map::default(),
            rx,
            cancel,
        }
    }

    /// Drains the inbox, emitting each decided slot on `committed` at
    /// most once. Returns when cancelled; the committed stream closes
    /// with it.
    pub async fn run(mut self, committed: internal::Tx<Entry>) {
        let cancel = self.cancel.clone();
        let mut decided: Set<usize> = Set::default();
        loop {
            let message = tokio::select! {
                () = cancel.cancelled() => return,
                message = self.rx.recv() => message,
            };
            let Some(message) = message else { return };
            if message.category != Category::Accept {
                warn!(
                    "learner {}: dropping {:?} message",
                    self.id, message.category,
                );
                continue;
            }

            let slot = message.slot;
            self.observe(message);
            if decided.contains(&slot) {
                continue;
            }
            if let Some(chosen) = self.chosen(slot) {
                info!("learner {}: slot {} decided", self.id, slot);
                let entry = Entry {
                    slot,
                    value: chosen.value.clone(),
                };
                decided.insert(slot);
                if !committed.send(entry).await {
                    return;
                }
            } else {
                debug!("learner {}: slot {} still undecided", self.id, slot);
            }
        }
    }

    /// Records an accept, keeping only the highest-numbered one from each
    /// acceptor. Older accepts are dropped: once an acceptor's accept at
    /// the decision number exists, any later accept it makes carries the
    /// same value.
    fn observe(&mut self, message: Message) {
        let slot = self.accepted.entry(message.slot).or_default();
        let current = slot
            .get(&message.from)
            .map_or(0, |accepted| accepted.number);
        if current < message.number {
            slot.insert(message.from, message);
        }
    }

    /// Returns the accept decided for this slot, if some proposal number
    /// is reported by a majority of distinct acceptors. Zero-numbered
    /// entries never count toward a quorum.
    fn chosen(&self, slot: usize) -> Option<&Message> {
        let accepted = self.accepted.get(&slot)?;

        let mut counts: Map<usize, usize> = Map::default();
        for message in accepted.values() {
            if message.number == 0 {
                continue;
            }
            *counts.entry(message.number).or_default() += 1;
        }

        for (&number, &count) in &counts {
            if count >= majority(self.acceptors) {
                return accepted.values().find(|message| message.number == number);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn learner() -> Learner {
        let (_tx, rx) = internal::channel(16);
        Learner::new(200, rx, &[1, 2, 3], CancellationToken::new())
    }

    fn accept(from: usize, number: usize, value: &[u8], slot: usize) -> Message {
        Message::accept(from, 200, number, value.to_vec(), slot)
    }

    #[test]
    fn single_accept_is_not_a_quorum() {
        let mut learner = learner();
        learner.observe(accept(1, 10100, b"hello", 0));
        assert!(learner.chosen(0).is_none());
    }

    #[test]
    fn two_of_three_accepts_decide() {
        let mut learner = learner();
        learner.observe(accept(1, 10100, b"hello", 0));
        learner.observe(accept(2, 10100, b"hello", 0));

        let chosen = learner.chosen(0).unwrap();
        assert_eq!(chosen.number, 10100);
        assert_eq!(chosen.value, b"hello".to_vec());
    }

    #[test]
    fn split_numbers_do_not_decide() {
        let mut learner = learner();
        learner.observe(accept(1, 10100, b"hello", 0));
        learner.observe(accept(2, 10101, b"world", 0));
        assert!(learner.chosen(0).is_none());

        learner.observe(accept(3, 10101, b"world", 0));
        assert_eq!(learner.chosen(0).unwrap().value, b"world".to_vec());
    }

    #[test]
    fn stale_accept_from_same_acceptor_is_ignored() {
        let mut learner = learner();
        learner.observe(accept(1, 20100, b"new", 0));
        learner.observe(accept(1, 10100, b"old", 0));

        assert_eq!(learner.accepted[&0][&1].number, 20100);
        assert_eq!(learner.accepted[&0][&1].value, b"new".to_vec());
    }

    #[test]
    fn repeated_accepts_from_one_acceptor_count_once() {
        let mut learner = learner();
        learner.observe(accept(1, 10100, b"hello", 0));
        learner.observe(accept(1, 10100, b"hello", 0));
        assert!(learner.chosen(0).is_none());
    }

    #[test]
    fn zero_numbered_accepts_never_form_a_quorum() {
        let mut learner = learner();
        learner.observe(accept(1, 0, b"", 0));
        learner.observe(accept(2, 0, b"", 0));
        assert!(learner.chosen(0).is_none());
    }

    #[test]
    fn quorum_uses_configured_count_not_observed_count() {
        // Only one acceptor has reported on this slot so far; a quorum of
        // the configured three still needs a second voice.
        let mut learner = learner();
        learner.observe(accept(3, 30100, b"late", 5));
        assert!(learner.chosen(5).is_none());
    }
}
