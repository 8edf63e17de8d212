//! The artifacts produced by the preprocessing phase

use mpc_core::{cipher::Cipher, share::AuthTensor};

/// One party's shares of an authenticated Beaver triple
/// `(<a>, <b>, <c>)` with `c = a * b`
#[derive(Clone, Debug)]
pub struct AuthTriple {
    /// The left factor
    pub a: AuthTensor,
    /// The right factor
    pub b: AuthTensor,
    /// The product
    pub c: AuthTensor,
}

/// One party's half of an authenticated input mask
///
/// The share and tag share stay with the compute party; the tag share is
/// also delivered to the input party sealed under `cipher`, which is
/// opened only at verification time.
#[derive(Clone, Debug)]
pub struct InputMask {
    /// The authenticated mask share
    pub auth: AuthTensor,
    /// The cipher sealing the delivered tag share
    pub cipher: Cipher,
}
