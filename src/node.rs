//! # Summary
//!
//! This module implements the `Node` facade: one deployable replica that
//! wires a proposer, an acceptor, and a learner behind a single transport
//! so users never assemble the pieces by hand.
//!
//! `start` launches four tasks — the router, the acceptor, the learner
//! driver feeding the committed stream, and the proposer driver that runs
//! leader election and then drains the submit queue slot by slot.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::internal;
use crate::message::Entry;
use crate::role::{Acceptor, Learner, Proposer};
use crate::router::Router;
use crate::transport::Transport;

/// Bound on values queued for proposal.
const SUBMIT_CAPACITY: usize = 64;

/// Bound on decided entries awaiting the consumer.
const COMMITTED_CAPACITY: usize = 64;

/// Stream of decided entries, in the order their quorums were observed.
/// At most one entry is emitted per slot; consumers that need slot order
/// must reorder.
pub struct Committed(internal::Rx<Entry>);

impl Committed {
    /// Next decided entry; `None` once the node has stopped.
    pub async fn recv(&mut self) -> Option<Entry> {
        self.0.recv().await
    }
}

/// Role tasks built at construction and consumed by `start`.
struct Parts {
    router: Router,
    acceptor: Acceptor,
    learner: Learner,
    proposer: Proposer,
    committed_tx: internal::Tx<Entry>,
}

/// One replica of the cluster, hosting all three protocol roles.
pub struct Node {
    id: usize,
    values: internal::Tx<Vec<u8>>,
    committed: Mutex<Option<Committed>>,
    parts: Mutex<Option<Parts>>,
    cancel: CancellationToken,
}

impl Node {
    /// Builds a node with the given unique `id`; `peers` are the other
    /// nodes of the cluster. Call `start` to launch it.
    pub fn new(id: usize, peers: &[usize], transport: Arc<dyn Transport>) -> Node {
        let mut cluster = Vec::with_capacity(1 + peers.len());
        cluster.push(id);
        cluster.extend_from_slice(peers);

        let cancel = CancellationToken::new();
        let (router, handle, inboxes) = Router::new(id, transport, cancel.clone());
        let (values_tx, values_rx) = internal::channel(SUBMIT_CAPACITY);
        let (committed_tx, committed_rx) = internal::channel(COMMITTED_CAPACITY);

        let proposer = Proposer::new(
            id,
            handle.clone(),
            inboxes.proposer,
            values_rx,
            cluster.clone(),
            cancel.clone(),
        )
        .with_peers(peers.to_vec());
        let acceptor = Acceptor::new(
            id,
            handle,
            inboxes.acceptor,
            cluster.clone(),
            cancel.clone(),
        );
        let learner = Learner::new(id, inboxes.learner, &cluster, cancel.clone());

        Node {
            id,
            values: values_tx,
            committed: Mutex::new(Some(Committed(committed_rx))),
            parts: Mutex::new(Some(Parts {
                router,
                acceptor,
                learner,
                proposer,
                committed_tx,
            })),
            cancel,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Launches the node's tasks. Must be called from within a tokio
    /// runtime. Later calls are no-ops.
    pub fn start(&self) {
        let Some(parts) = self.parts.lock().take() else {
            return;
        };
        tokio::spawn(parts.router.run());
        tokio::spawn(parts.acceptor.run());
        tokio::spawn(parts.learner.run(parts.committed_tx));
        tokio::spawn(parts.proposer.run());
    }

    /// Submits a value for consensus. The value is queued; the proposer
    /// assigns it the next free slot once it holds leadership. Returns
    /// `Error::Stopped` after `stop`.
    pub async fn propose(&self, value: Vec<u8>) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Stopped);
        }
        tokio::select! {
            () = self.cancel.cancelled() => Err(Error::Stopped),
            sent = self.values.send(value) => {
                if sent { Ok(()) } else { Err(Error::Stopped) }
            }
        }
    }

    /// Returns the stream of decided entries. The stream can be taken
    /// once; later calls yield an exhausted stream.
    pub fn committed(&self) -> Committed {
        match self.committed.lock().take() {
        | Some(stream) => stream,
        | None => {
            let (_, rx) = internal::channel(1);
            Committed(rx)
        }
        }
    }

    /// Stops every task of this node and closes the committed stream.
    /// Idempotent; tasks exit within one receive-timeout tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
