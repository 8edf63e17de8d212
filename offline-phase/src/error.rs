//! Error types for the preprocessing engine
use std::{error::Error, fmt::Display};

use lattice_he::error::ZkRejection;
use mpc_core::{CoreError, PartyId};

/// The error types of the preprocessing engine
///
/// Every variant is fatal: the protocol is honest-with-abort, and any
/// failure terminates the run. Where the offender is attributable the
/// variant names the party.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreprocessError {
    /// The runtime configuration fails a compatibility requirement
    ConfigInvalid(String),
    /// A transport operation failed
    Transport(String),
    /// A party's plaintext proof failed verification
    ZkRejected {
        /// The offending party
        party: PartyId,
        /// Which check failed
        reason: ZkRejection,
    },
    /// The batched MAC check reconstructed a nonzero value
    MacCheckFailed,
    /// A decrypted coefficient left the noise window
    DecryptOutOfRange,
    /// A commit/reveal peer opened a value that does not match its
    /// commitment
    InvalidCommitment {
        /// The offending party
        party: PartyId,
    },
    /// An authenticated-encryption payload failed to open
    CipherFailed,
}

impl Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessError::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            PreprocessError::Transport(msg) => write!(f, "transport failed: {msg}"),
            PreprocessError::ZkRejected { party, reason } => {
                write!(f, "party {party}'s plaintext proof rejected: {reason}")
            },
            PreprocessError::MacCheckFailed => write!(f, "MAC check failed"),
            PreprocessError::DecryptOutOfRange => {
                write!(f, "decryption noise outside the q/4 window")
            },
            PreprocessError::InvalidCommitment { party } => {
                write!(f, "party {party} opened an invalid commitment")
            },
            PreprocessError::CipherFailed => write!(f, "authenticated decryption failed"),
        }
    }
}
impl Error for PreprocessError {}

impl From<CoreError> for PreprocessError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigInvalid(msg) => PreprocessError::ConfigInvalid(msg),
            CoreError::Transport(msg) => PreprocessError::Transport(msg),
            CoreError::UnexpectedMessage(msg) => PreprocessError::Transport(msg),
            CoreError::CipherFailed => PreprocessError::CipherFailed,
        }
    }
}
