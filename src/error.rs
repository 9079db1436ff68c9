use thiserror::Error;

/// Errors surfaced across the crate's public API.
///
/// Transient protocol failures (a prepare that times out, a round that
/// misses its majority) never appear here; they are absorbed by the
/// proposer's retry loop.
#[derive(Debug, Error)]
pub enum Error {
    /// The node has been stopped; no further values can be submitted.
    #[error("node stopped")]
    Stopped,

    /// The transport has no route to the addressed node.
    #[error("unknown recipient {0}")]
    UnknownRecipient(usize),

    /// The transport endpoint has shut down.
    #[error("transport closed")]
    Closed,

    #[error("wire encoding: {0}")]
    Wire(#[from] bincode::Error),

    /// A wire message carried a category tag outside the fixed
    /// assignment.
    #[error("unknown category tag {0}")]
    UnknownCategory(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}
