//! Error types for the lattice cryptosystem
use std::{error::Error, fmt::Display};

/// The reason a zero-knowledge transcript was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZkRejection {
    /// The ciphertext equation over the response failed
    CiphertextEquation,
    /// The response tensor exceeded its norm bound
    ResponseNorm,
    /// The `u` component of the response randomness exceeded its bound
    RandomnessNormU,
    /// The `v` component of the response randomness exceeded its bound
    RandomnessNormV,
    /// The `w` component of the response randomness exceeded its bound
    RandomnessNormW,
}

impl Display for ZkRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZkRejection::CiphertextEquation => write!(f, "ciphertext equation failed"),
            ZkRejection::ResponseNorm => write!(f, "response norm bound exceeded"),
            ZkRejection::RandomnessNormU => write!(f, "randomness norm bound (u) exceeded"),
            ZkRejection::RandomnessNormV => write!(f, "randomness norm bound (v) exceeded"),
            ZkRejection::RandomnessNormW => write!(f, "randomness norm bound (w) exceeded"),
        }
    }
}

/// The error types of the lattice cryptosystem
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeError {
    /// The parameter set fails a compatibility requirement
    ConfigInvalid(String),
    /// A decrypted coefficient lifted outside the noise window, indicating
    /// parameter mis-sizing
    DecryptOutOfRange,
    /// A zero-knowledge transcript failed verification
    ZkRejected(ZkRejection),
}

impl Display for HeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeError::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            HeError::DecryptOutOfRange => {
                write!(f, "decryption noise outside the q/4 window")
            },
            HeError::ZkRejected(reason) => write!(f, "zero-knowledge proof rejected: {reason}"),
        }
    }
}
impl Error for HeError {}
