//! Ciphertexts and their homomorphic operations

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::{
    params::BgvParams,
    tensor::{Eval, RingTensor, Shape},
};

/// A ciphertext pair `(c0, c1)` over the `Z_q` evaluation domain
///
/// Decrypts to `(c0 - c1*s) mod q mod p`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// The message-carrying component
    pub c0: RingTensor<Eval>,
    /// The key-carrying component
    pub c1: RingTensor<Eval>,
}

impl Ciphertext {
    /// The all-zero ciphertext of a given shape, used as an all-to-all
    /// placeholder for a party's own slot
    pub fn zeros(params: &BgvParams, shape: Shape) -> Self {
        let zero = RingTensor::zeros(shape, params.degree(), params.mod_q());
        Self { c0: zero.clone(), c1: zero }
    }

    /// The batch shape
    pub fn shape(&self) -> &Shape {
        self.c0.shape()
    }

    /// Multiply by a public scalar residue of `Z_q`
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        Self { c0: self.c0.scalar_mul(scalar), c1: self.c1.scalar_mul(scalar) }
    }

    /// Pointwise multiply by a public ring tensor in the evaluation
    /// domain
    ///
    /// The noise grows multiplicatively; the result must be refreshed
    /// with drowning noise before it is sent anywhere.
    pub fn mul_eval(&self, rhs: &RingTensor<Eval>) -> Self {
        Self { c0: &self.c0 * rhs, c1: &self.c1 * rhs }
    }
}

impl Add for &Ciphertext {
    type Output = Ciphertext;

    fn add(self, rhs: Self) -> Self::Output {
        Ciphertext { c0: &self.c0 + &rhs.c0, c1: &self.c1 + &rhs.c1 }
    }
}

impl Sub for &Ciphertext {
    type Output = Ciphertext;

    fn sub(self, rhs: Self) -> Self::Output {
        Ciphertext { c0: &self.c0 - &rhs.c0, c1: &self.c1 - &rhs.c1 }
    }
}
