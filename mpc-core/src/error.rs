//! Error types for the runtime core
use std::{error::Error, fmt::Display};

/// The error types of the runtime core
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// The runtime configuration fails a compatibility requirement
    ConfigInvalid(String),
    /// A transport operation failed; the run must abort
    Transport(String),
    /// A peer sent a payload of an unexpected kind
    UnexpectedMessage(String),
    /// An authenticated-encryption payload failed to open
    CipherFailed,
}

impl Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            CoreError::Transport(msg) => write!(f, "transport failed: {msg}"),
            CoreError::UnexpectedMessage(msg) => write!(f, "unexpected message: {msg}"),
            CoreError::CipherFailed => write!(f, "authenticated decryption failed"),
        }
    }
}
impl Error for CoreError {}
