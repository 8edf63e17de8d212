//! The runtime core of the secure-computation engine
//!
//! Defines the party/communicator model, runtime configuration, the
//! authenticated share types of the SPDZ-style online phase, and the
//! round-synchronous network collectives (gather, broadcast, all-gather,
//! all-to-all) over an abstract point-to-point mesh. An in-memory mesh
//! built on tokio channels backs the unit and scenario tests.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod config;
pub mod error;
pub mod network;
pub mod share;

pub use error::CoreError;

/// The id of a party in the protocol
pub type PartyId = u64;

/// The designated party that adds public constants to value shares
pub const PARTY0: PartyId = 0;
