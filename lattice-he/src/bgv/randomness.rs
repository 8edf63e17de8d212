//! Encryption randomness

use rand::Rng;

use crate::{
    params::BgvParams,
    prg,
    tensor::{Coeff, Eval, RingTensor, Shape},
};

/// Bit-pairs of the centered binomial used for secret keys and the `u`
/// component (variance 1/2)
pub const CBD_PAIRS_KEY: u32 = 1;

/// Bit-pairs of the centered binomial used for noise terms (variance 10)
pub const CBD_PAIRS_NOISE: u32 = 20;

/// The randomness triple `(u, v, w)` of one encryption, in the `Z_q`
/// evaluation domain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Randomness {
    /// The shared small factor
    pub u: RingTensor<Eval>,
    /// The `c0` noise; drowning-sized when refreshing
    pub v: RingTensor<Eval>,
    /// The `c1` noise
    pub w: RingTensor<Eval>,
}

impl Randomness {
    /// Standard encryption randomness: `u` of variance 1/2, `v` and `w`
    /// of variance 10
    pub fn sample<R: Rng + ?Sized>(params: &BgvParams, shape: Shape, rng: &mut R) -> Self {
        let n = params.degree();
        let q = params.mod_q();
        let u = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_KEY);
        let v = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_NOISE);
        let w = prg::centered_binomial_tensor(rng, shape, n, q, CBD_PAIRS_NOISE);
        Self::from_coeff(params, &u, &v, &w)
    }

    /// Drowning randomness: the `v` component is uniform over
    /// `[-B * 2^lambda, B * 2^lambda]` so that the refreshed ciphertext
    /// statistically hides the noise of any prior homomorphic product
    pub fn drowning<R: Rng + ?Sized>(params: &BgvParams, shape: Shape, rng: &mut R) -> Self {
        let n = params.degree();
        let q = params.mod_q();
        let u = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_KEY);
        let v = prg::drowning_tensor(
            rng,
            shape.clone(),
            n,
            q,
            params.drown_bound(),
            params.statistical_security(),
        );
        let w = prg::centered_binomial_tensor(rng, shape, n, q, CBD_PAIRS_NOISE);
        Self::from_coeff(params, &u, &v, &w)
    }

    /// Assemble a triple from coefficient-form components
    pub fn from_coeff(
        params: &BgvParams,
        u: &RingTensor<Coeff>,
        v: &RingTensor<Coeff>,
        w: &RingTensor<Coeff>,
    ) -> Self {
        let ntt = params.ntt_q();
        Self {
            u: ntt.forward_tensor(u),
            v: ntt.forward_tensor(v),
            w: ntt.forward_tensor(w),
        }
    }
}
