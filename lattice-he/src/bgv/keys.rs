//! Key material of the BGV-like scheme

use serde::{Deserialize, Serialize};

use crate::{
    error::HeError,
    params::BgvParams,
    prg::{self, PrgKey},
    tensor::{Eval, RingTensor, Shape},
};

use super::{Ciphertext, Randomness, CBD_PAIRS_KEY, CBD_PAIRS_NOISE};

/// Number of per-holder streams consumed by key derivation
const KEYGEN_STREAMS: u64 = 3;

/// A public encryption key `(a, b)` with `b = a*s + p*e`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// The uniform component
    pub a: RingTensor<Eval>,
    /// The keyed component
    pub b: RingTensor<Eval>,
}

impl PublicKey {
    /// Encrypt a message already embedded in the `Z_q` evaluation domain
    ///
    /// `c0 = b*u + p*v + m`, `c1 = a*u + p*w`.
    pub fn encrypt(
        &self,
        params: &BgvParams,
        message: &RingTensor<Eval>,
        randomness: &Randomness,
    ) -> Ciphertext {
        debug_assert_eq!(message.modulus(), params.mod_q());
        let p = params.p_in_q();

        let c0 = &(&randomness.u.mul_elem(&self.b) + &randomness.v.scalar_mul(p)) + message;
        let c1 = &randomness.u.mul_elem(&self.a) + &randomness.w.scalar_mul(p);
        Ciphertext { c0, c1 }
    }
}

/// A secret decryption key
#[derive(Clone, Debug)]
pub struct SecretKey {
    /// The key element, small in coefficient form
    s: RingTensor<Eval>,
}

impl SecretKey {
    /// Decrypt a ciphertext back to a plaintext tensor
    ///
    /// Computes `c0 - c1*s` in the `Z_q` evaluation domain, returns to
    /// coefficient form, and reduces each centered representative modulo
    /// `p`. A representative outside the `q/4` window surfaces as
    /// [`HeError::DecryptOutOfRange`].
    pub fn decrypt(&self, params: &BgvParams, ct: &Ciphertext) -> Result<RingTensor<Eval>, HeError> {
        let d = &ct.c0 - &ct.c1.mul_elem(&self.s);
        let coeff = params.ntt_q().inverse_tensor(&d);
        let reduced = coeff.centered_reduce(params.mod_p())?;
        Ok(params.ntt_p().forward_tensor(&reduced))
    }
}

/// A public/secret keypair
#[derive(Clone, Debug)]
pub struct Keypair {
    /// The public half
    public: PublicKey,
    /// The secret half
    secret: SecretKey,
}

impl Keypair {
    /// Derive the keypair of `holder` deterministically from a demo seed
    ///
    /// Every party can derive every other party's public key from the
    /// shared seed; a production deployment replaces this with a
    /// distributed key-generation protocol. Streams: `0` for the secret
    /// key, `1` for the uniform component, `2` for the key noise.
    pub fn demo_derive(
        params: &BgvParams,
        seed: &PrgKey,
        holder: u64,
        party_count: u64,
    ) -> Self {
        let space = [KEYGEN_STREAMS, party_count];
        let scalar = Shape::scalar();
        let n = params.degree();
        let q = params.mod_q();

        let s_coeff = prg::centered_binomial_tensor(
            &mut prg::stream(seed, &[0, holder], &space),
            scalar.clone(),
            n,
            q,
            CBD_PAIRS_KEY,
        );
        let s = params.ntt_q().forward_tensor(&s_coeff);

        let a: RingTensor<Eval> = prg::uniform_tensor(
            &mut prg::stream(seed, &[1, holder], &space),
            scalar.clone(),
            n,
            q,
        );

        let e_coeff = prg::centered_binomial_tensor(
            &mut prg::stream(seed, &[2, holder], &space),
            scalar,
            n,
            q,
            CBD_PAIRS_NOISE,
        );
        let e = params.ntt_q().forward_tensor(&e_coeff);

        let b = &(&a * &s) + &e.scalar_mul(params.p_in_q());

        Self { public: PublicKey { a, b }, secret: SecretKey { s } }
    }

    /// The public key
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// The secret key
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}
