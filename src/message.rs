//! # Summary
//!
//! This module defines the messages exchanged between the three protocol
//! roles, and the committed `Entry` record visible to users.
//!
//! A single flat `Message` type carries every category; the `prior` field
//! is populated only on promises, where it reports the acceptor's highest
//! previously accepted proposal for the slot. Keeping the promised number
//! and the prior accepted number in separate fields lets the proposer
//! count promises and apply value adoption without conflating the two.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Category of a protocol message. Serialized as its fixed one-byte wire
/// tag, so transports built against the documented assignment
/// interoperate with `Message::encode`/`decode`.
#[derive(Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Category {
    /// Phase 1a: proposer asks acceptors to promise a proposal number.
    Prepare = 1,

    /// Phase 2a: proposer asks promised acceptors to accept a value.
    Propose = 2,

    /// Phase 2b: acceptor reports an accepted proposal to the learners.
    Accept = 3,

    /// Phase 1b: acceptor promises a proposal number back to the proposer.
    Ack = 4,

    /// Leader-election beacon between proposers.
    Heartbeat = 5,
}

impl Category {
    /// Fixed tag for network transports.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Category> {
        match code {
        | 1 => Some(Category::Prepare),
        | 2 => Some(Category::Propose),
        | 3 => Some(Category::Accept),
        | 4 => Some(Category::Ack),
        | 5 => Some(Category::Heartbeat),
        | _ => None,
        }
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> u8 {
        category.code()
    }
}

impl TryFrom<u8> for Category {
    type Error = Error;

    fn try_from(code: u8) -> Result<Category, Error> {
        Category::from_code(code).ok_or(Error::UnknownCategory(code))
    }
}

/// A previously accepted proposal reported inside a promise.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prior {
    pub number: usize,
    pub value: Vec<u8>,
}

/// A single protocol message between two nodes.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub from: usize,
    pub to: usize,
    pub category: Category,

    /// Proposal number. On an `Ack` this is always the number being
    /// promised, i.e. the number of the prepare that triggered it.
    pub number: usize,

    pub value: Vec<u8>,
    pub slot: usize,

    /// Set only on `Ack`: the highest-numbered proposal this acceptor
    /// previously accepted for the slot.
    pub prior: Option<Prior>,
}

impl Message {
    pub fn prepare(from: usize, to: usize, number: usize, value: Vec<u8>, slot: usize) -> Message {
        Message {
            from,
            to,
            category: Category::Prepare,
            number,
            value,
            slot,
            prior: None,
        }
    }

    pub fn propose(from: usize, to: usize, number: usize, value: Vec<u8>, slot: usize) -> Message {
        Message {
            from,
            to,
            category: Category::Propose,
            number,
            value,
            slot,
            prior: None,
        }
    }

    pub fn accept(from: usize, to: usize, number: usize, value: Vec<u8>, slot: usize) -> Message {
        Message {
            from,
            to,
            category: Category::Accept,
            number,
            value,
            slot,
            prior: None,
        }
    }

    pub fn ack(
        from: usize,
        to: usize,
        number: usize,
        value: Vec<u8>,
        slot: usize,
        prior: Option<Prior>,
    ) -> Message {
        Message {
            from,
            to,
            category: Category::Ack,
            number,
            value,
            slot,
            prior,
        }
    }

    pub fn heartbeat(from: usize, to: usize) -> Message {
        Message {
            from,
            to,
            category: Category::Heartbeat,
            number: 0,
            value: Vec::new(),
            slot: 0,
            prior: None,
        }
    }

    /// Serializes this message for a byte-oriented transport.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserializes a message produced by `encode`.
    pub fn decode(bytes: &[u8]) -> Result<Message, Error> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// A decided value for a given slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub slot: usize,
    pub value: Vec<u8>,
}
