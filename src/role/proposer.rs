//! # Summary
//!
//! This module implements the `Proposer`, which drives submitted values
//! to decision slot by slot: Phase 1a/2a, round numbering, the P2c value
//! adoption rule, and retry with randomized backoff.
//!
//! A lightweight leader election gates all of it: on startup every
//! proposer broadcasts a heartbeat to its peers and listens out the
//! election window; whoever holds the highest ID keeps leadership and
//! everyone else returns without proposing. Losing a heartbeat can at
//! worst produce a second active proposer for a while, which costs
//! liveness, never safety: the acceptors' promise discipline still holds.

use std::collections::HashMap as Map;
use std::time::Duration;
use std::time::Instant;

use log::{debug, info, trace, warn};
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::internal;
use crate::message::{Category, Message};
use crate::role::majority;
use crate::router::Handle;

/// Proposal numbers are `seq * MAX_NODES + id`, so they are unique across
/// proposers with distinct IDs below this bound and strictly increasing
/// within one proposer.
const MAX_NODES: usize = 10_000;

/// Bounded wait for a single promise during Phase 1b collection.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Length of the leader-election listening window.
const ELECTION_TIMEOUT: Duration = Duration::from_millis(500);

/// Phase 1a/2a driver for a submit queue of values.
pub struct Proposer {
    /// Unique node ID
    id: usize,

    /// Round counter feeding the proposal number
    seq: usize,

    /// Current proposal number
    number: usize,

    /// Promise recorded from each acceptor for the current round only
    promises: Map<usize, Message>,

    /// All configured acceptor IDs
    acceptors: Vec<usize>,

    /// Peer proposer IDs participating in leader election
    peers: Vec<usize>,

    /// Won the last election
    leader: bool,

    /// Outbound message path
    handle: Handle,

    /// Inbound ack/heartbeat messages
    rx: internal::Rx<Message>,

    /// Submit queue of values awaiting a slot
    values: internal::Rx<Vec<u8>>,

    cancel: CancellationToken,
}

impl Proposer {
    pub fn new(
        id: usize,
        handle: Handle,
        rx: internal::Rx<Message>,
        values: internal::Rx<Vec<u8>>,
        acceptors: Vec<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Proposer {
            id,
            seq: 0,
            number: 0,
            promises: Map::default(),
            acceptors,
            peers: Vec::new(),
            leader: false,
            handle,
            rx,
            values,
            cancel,
        }
    }

    /// Sets the peer proposers to run leader election against. Without
    /// peers, election is skipped and this proposer leads unconditionally.
    pub fn with_peers(mut self, peers: Vec<usize>) -> Self {
        self.peers = peers;
        self
    }

    /// Runs leader election, then drains the submit queue slot by slot.
    /// Followers only wait out shutdown after the election window.
    pub async fn run(mut self) {
        let cancel = self.cancel.clone();

        self.elect().await;
        if !self.leader {
            // Followers never drive a slot, but they hold the submit
            // queue open so values keep queueing until shutdown.
            cancel.cancelled().await;
            return;
        }

        let mut slot = 0;
        loop {
            let value = tokio::select! {
                () = cancel.cancelled() => return,
                value = self.values.recv() => value,
            };
            let Some(value) = value else { return };
            self.run_slot(slot, value).await;
            slot += 1;
        }
    }

    /// Highest-alive-ID election. Broadcasts a heartbeat to every peer,
    /// tentatively claims leadership, then listens out the election
    /// window; a heartbeat from any strictly-higher ID yields it. The
    /// window ends on its deadline, not on the first message.
    async fn elect(&mut self) {
        if self.peers.is_empty() {
            self.leader = true;
            return;
        }

        for &peer in &self.peers {
            self.handle.send(Message::heartbeat(self.id, peer)).await;
        }

        self.leader = true;
        let deadline = Instant::now() + ELECTION_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(message) = self.rx.recv_timeout(remaining).await else {
                break;
            };
            if message.category == Category::Heartbeat && message.from > self.id {
                self.leader = false;
            }
        }

        if self.leader {
            info!("proposer {}: elected leader", self.id);
        } else {
            info!("proposer {}: deferring to a higher-id peer", self.id);
        }
    }

    /// Drives one slot to the propose phase: prepare, collect promises
    /// until a majority or a receive timeout, and retry with a fresh
    /// round after a randomized backoff for as long as the majority is
    /// missed. Decision is the learners' business; no confirmation is
    /// awaited here.
    async fn run_slot(&mut self, slot: usize, value: Vec<u8>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            for message in self.prepare(&value, slot) {
                self.handle.send(message).await;
            }

            while !self.reached_majority() {
                if self.cancel.is_cancelled() {
                    return;
                }
                let Some(message) = self.rx.recv_timeout(RECEIVE_TIMEOUT).await else {
                    break;
                };
                trace!("proposer {}: received {:?}", self.id, message);
                match message.category {
                | Category::Ack => self.record_promise(message),
                | Category::Heartbeat => (),
                | category => warn!("proposer {}: dropping {:?} message", self.id, category),
                }
            }

            if self.reached_majority() {
                break;
            }

            debug!(
                "proposer {}: no majority for round {}, retrying",
                self.id, self.number,
            );
            let backoff = Duration::from_millis(rand::thread_rng().gen_range(50..200));
            tokio::time::sleep(backoff).await;
        }

        let value = self.adopt(value);
        for message in self.propose(&value, slot) {
            self.handle.send(message).await;
        }
    }

    /// Phase 1a: starts a fresh round. Bumps the sequence number, clears
    /// every recorded promise, and builds a prepare for each acceptor.
    fn prepare(&mut self, value: &[u8], slot: usize) -> Vec<Message> {
        self.seq += 1;
        self.number = self.seq * MAX_NODES + self.id;
        self.promises.clear();
        self.acceptors
            .iter()
            .map(|&to| Message::prepare(self.id, to, self.number, value.to_vec(), slot))
            .collect()
    }

    /// Records a promise for the current round. Promises from unknown
    /// acceptors or for any other round are ignored.
    fn record_promise(&mut self, promise: Message) {
        if !self.acceptors.contains(&promise.from) {
            return;
        }
        if promise.number != self.number {
            debug!(
                "proposer {}: ignoring promise for round {} (current {})",
                self.id, promise.number, self.number,
            );
            return;
        }
        self.promises.insert(promise.from, promise);
    }

    fn reached_majority(&self) -> bool {
        self.promises.len() >= majority(self.acceptors.len())
    }

    /// P2c: adopts the value of the highest-numbered previously accepted
    /// proposal reported by any promise of this round; without one, the
    /// caller's value stands.
    fn adopt(&self, value: Vec<u8>) -> Vec<u8> {
        self.promises
            .values()
            .filter_map(|promise| promise.prior.as_ref())
            .filter(|prior| !prior.value.is_empty())
            .max_by_key(|prior| prior.number)
            .map_or(value, |prior| prior.value.clone())
    }

    /// Phase 2a: builds a proposal for exactly the acceptors that
    /// promised this round.
    fn propose(&self, value: &[u8], slot: usize) -> Vec<Message> {
        self.promises
            .keys()
            .map(|&to| Message::propose(self.id, to, self.number, value.to_vec(), slot))
            .collect()
    }
}
