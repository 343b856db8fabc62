//! hnsres is a codec and DNS synthesizer for a blockchain-style name
//! registry's resource records.
//!
//! It implements two things:
//!
//! * A compact, versioned binary encoding of a per-name record set (a
//!   [`Record`]), built on top of a string-dictionary compressor shared
//!   across a record's fields ([`compress`]).
//! * A mapping from a decoded `Record` to a synthesized DNS
//!   [`message::Message`] for a given query `(name, qtype)`, including
//!   referral logic, glue records, and synthetic pointer names for
//!   inline IP literals ([`synth::to_dns`]).
//!
//! # Usage
//!
//! ```rust
//! use hnsres::record::Record;
//! use hnsres::message::Type;
//! use hnsres::synth;
//!
//! let record = Record {
//!     ttl: 3600,
//!     hosts: vec!["1.2.3.4".parse().unwrap()],
//!     ..Record::default()
//! };
//!
//! // Round-trip through the wire format.
//! let bytes = record.encode().unwrap();
//! let decoded = Record::decode(&bytes).unwrap();
//! assert_eq!(decoded, record);
//!
//! // Synthesize a DNS answer for an A query.
//! let answer = synth::to_dns(&decoded, "alice.", Type::A, true);
//! assert_eq!(answer.answers.len(), 1);
//! ```
//!
//! # Scope
//!
//! This crate is a pure, synchronous, in-memory codec (no I/O, no
//! locking, no async runtime). Transport (UDP/TCP DNS servers), the
//! chain/registry that produces these record blobs, key generation,
//! DNSSEC signing, and a CLI are all external collaborators — see
//! `DESIGN.md` for the full list of what's deliberately out of scope.

pub mod compress;
pub mod constants;
pub mod errors;
pub mod fields;
pub mod io;
pub mod message;
pub mod record;
pub mod synth;
pub mod target;

#[macro_use]
extern crate num_derive;

pub use crate::errors::ParseError;
pub use crate::message::Message;
pub use crate::record::Record;
