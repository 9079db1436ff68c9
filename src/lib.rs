//! # Summary
//!
//! This crate implements the Paxos distributed consensus protocol in both
//! its single-decree and multi-decree forms. A cluster of nodes agrees on
//! a totally ordered sequence of opaque values, one per *slot*, tolerating
//! the failure of any minority of nodes.
//!
//! Every node hosts the three protocol roles — proposer, acceptor, and
//! learner — each running as its own task, wired together by a per-node
//! router behind a pluggable [`Transport`]. A simple highest-ID leader
//! election keeps duelling proposers from livelocking each other; it
//! gates liveness only, and the acceptors' promise discipline guarantees
//! safety regardless of how many proposers end up active.
//!
//! # Usage
//!
//! Implement [`Transport`] for your network of choice, or use the
//! in-process [`ChannelTransport`] for tests and single-process clusters.
//! Then build one [`Node`] per cluster member, `start` them, and submit
//! values with `propose`; decided entries arrive on the `committed`
//! stream, at most once per slot.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use decree::{ChannelTransport, Entry, Node, Transport};
//!
//! #[tokio::main]
//! async fn main() {
//!     let ids = [1, 2, 3];
//!     let mut transports = ChannelTransport::group(&ids);
//!
//!     let nodes: Vec<Node> = ids
//!         .iter()
//!         .map(|&id| {
//!             let peers: Vec<usize> = ids.iter().copied().filter(|&peer| peer != id).collect();
//!             let transport: Arc<dyn Transport> = Arc::new(transports.remove(&id).unwrap());
//!             Node::new(id, &peers, transport)
//!         })
//!         .collect();
//!
//!     for node in &nodes {
//!         node.start();
//!     }
//!
//!     // Give leader election time to settle, then propose on the leader.
//!     tokio::time::sleep(std::time::Duration::from_millis(700)).await;
//!     nodes[2].propose(b"hello".to_vec()).await.unwrap();
//!
//!     let mut committed = nodes[2].committed();
//!     let Entry { slot, value } = committed.recv().await.unwrap();
//!     assert_eq!((slot, value), (0, b"hello".to_vec()));
//!
//!     for node in &nodes {
//!         node.stop();
//!     }
//! }
//! ```
//!
//! # Implementation Details
//!
//! - Acceptor and learner state are keyed by slot; every slot is an
//!   independent Paxos instance.
//! - Proposal numbers are `seq * 10_000 + id`, unique across proposers
//!   with distinct IDs and strictly increasing within one proposer.
//! - A promise carries the promised number and any previously accepted
//!   proposal in separate fields, so promise counting and value adoption
//!   never read the same overloaded field.
//! - Nothing is persisted: a restarted node rejoins with empty state, so
//!   crash-recovery durability is out of scope here.

mod config;
mod error;
pub mod internal;
mod message;
mod node;
mod role;
mod router;
mod transport;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::message::{Category, Entry, Message, Prior};
pub use crate::node::{Committed, Node};
pub use crate::role::{majority, Acceptor, Learner, Proposer};
pub use crate::router::{Handle, Inboxes, Router};
pub use crate::transport::{ChannelTransport, Transport};
