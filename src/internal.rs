//! # Summary
//!
//! This module abstracts over internal channels between the role tasks of
//! a single node.
//!
//! Currently backed by bounded `tokio::sync::mpsc` channels. The bound is
//! what gives the router its backpressure: a role that falls behind causes
//! senders to wait rather than letting the inbox grow without limit. A
//! send can only fail once the receiving task has shut down, which the
//! caller observes as a `false` return and treats as a signal to exit.

use std::time::Duration;

use tokio::sync::mpsc;

/// Intra-node receiving channel.
#[derive(Debug)]
pub struct Rx<T>(mpsc::Receiver<T>);

/// Intra-node transmitting channel. All clones send to the same receiver.
#[derive(Debug)]
pub struct Tx<T>(mpsc::Sender<T>);

impl<T> Clone for Tx<T> {
    fn clone(&self) -> Self {
        Tx(self.0.clone())
    }
}

/// Creates a linked pair of transmitting and receiving channels.
pub fn channel<T>(capacity: usize) -> (Tx<T>, Rx<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Tx(tx), Rx(rx))
}

impl<T> Tx<T> {
    /// Sends a message, waiting for a free slot if the channel is full.
    /// Returns `false` if the receiving end has shut down.
    pub async fn send(&self, message: T) -> bool {
        self.0.send(message).await.is_ok()
    }
}

impl<T> Rx<T> {
    /// Receives the next message; `None` once every sender has dropped.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }

    /// Bounded receive: `None` on timeout, on a closed channel, or for a
    /// zero timeout.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<T> {
        if timeout.is_zero() {
            return None;
        }
        tokio::time::timeout(timeout, self.0.recv())
            .await
            .ok()
            .flatten()
    }
}
