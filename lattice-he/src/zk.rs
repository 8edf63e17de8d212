//! Zero-knowledge proof of bounded plaintext knowledge
//!
//! A prover holding a plaintext tensor `x` (last axis `U`) and the
//! randomness of its encryption `c` proves that both are bounded in
//! coefficient norm, without revealing either. The protocol is a batched
//! sigma protocol made non-interactive by deriving the challenge from a
//! hash of the transcript: a sparse matrix `W` whose entries are
//! monomials `X^k` or absent, sampled uniformly with one sentinel value
//! per slot (challenge space `n + 1`).
//!
//! Verification checks one ciphertext equation,
//! `Enc(NTT(z), NTT(t)) = a + NTT(W * invNTT(c))`, and three norm bounds
//! on the response. Each failure is reported as its own
//! [`ZkRejection`] reason.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::{
    bgv::{Ciphertext, PublicKey, Randomness, CBD_PAIRS_KEY, CBD_PAIRS_NOISE},
    error::{HeError, ZkRejection},
    params::BgvParams,
    prg::{self, PrgKey},
    tensor::{Coeff, Eval, MonomialMatrix, RingTensor, Shape},
};

/// The coefficient-domain response randomness `(t_u, t_v, t_w)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRandomness {
    /// Response for the `u` component
    pub u: RingTensor<Coeff>,
    /// Response for the `v` component
    pub v: RingTensor<Coeff>,
    /// Response for the `w` component
    pub w: RingTensor<Coeff>,
}

/// A non-interactive proof of plaintext knowledge for one ciphertext
/// batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextProof {
    /// The commitment ciphertext `a`
    pub commitment: Ciphertext,
    /// The response `z = y + W * x`, coefficient domain over `Z_q`
    pub response: RingTensor<Coeff>,
    /// The response randomness `t = s + W * r`
    pub randomness: ProofRandomness,
}

/// Encrypt a plaintext tensor and prove knowledge of it
///
/// The plaintext lives in the `Z_p` evaluation domain with last axis
/// width `U`. Returns the ciphertext together with its proof.
pub fn prove<R: Rng + ?Sized>(
    params: &BgvParams,
    key: &PublicKey,
    x: &RingTensor<Eval>,
    rng: &mut R,
) -> (Ciphertext, PlaintextProof) {
    assert_eq!(x.shape().last_dim(), params.zk_cols(), "plaintext last axis must be U");
    debug_assert_eq!(x.modulus(), params.mod_p());

    let n = params.degree();
    let q = params.mod_q();
    let shape = x.shape().clone();

    // Encryption randomness, kept in coefficient form for the response
    let r_u = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_KEY);
    let r_v = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_NOISE);
    let r_w = prg::centered_binomial_tensor(rng, shape.clone(), n, q, CBD_PAIRS_NOISE);
    let r = Randomness::from_coeff(params, &r_u, &r_v, &r_w);

    let x_coeff = params.ntt_p().inverse_tensor(x).lift(q);
    let c = key.encrypt(params, &params.ntt_q().forward_tensor(&x_coeff), &r);

    let proof = prove_for(params, key, &x_coeff, (&r_u, &r_v, &r_w), &c, rng);
    (c, proof)
}

/// Produce the proof for an already-encrypted coefficient-domain value
///
/// Split out of [`prove`] so the response computation is independent of
/// how the witness was embedded.
fn prove_for<R: Rng + ?Sized>(
    params: &BgvParams,
    key: &PublicKey,
    x_coeff: &RingTensor<Coeff>,
    r_coeff: (&RingTensor<Coeff>, &RingTensor<Coeff>, &RingTensor<Coeff>),
    c: &Ciphertext,
    rng: &mut R,
) -> PlaintextProof {
    let n = params.degree();
    let q = params.mod_q();
    let zeta = params.zk_security();
    let aux_shape = x_coeff.shape().replace_last(params.zk_rows());

    // Auxiliary value and randomness, 2^zeta wider than the witness
    let half_p = params.mod_p().value() / 2;
    let y = prg::drowning_tensor(rng, aux_shape.clone(), n, q, half_p, zeta);
    let s_u = prg::drowning_tensor(rng, aux_shape.clone(), n, q, CBD_PAIRS_KEY as u64, zeta);
    let s_v = prg::drowning_tensor(rng, aux_shape.clone(), n, q, CBD_PAIRS_NOISE as u64, zeta);
    let s_w = prg::drowning_tensor(rng, aux_shape, n, q, CBD_PAIRS_NOISE as u64, zeta);

    let commitment = key.encrypt(
        params,
        &params.ntt_q().forward_tensor(&y),
        &Randomness::from_coeff(params, &s_u, &s_v, &s_w),
    );

    let w = challenge_matrix(params, &challenge_seed(c, &commitment), x_coeff.shape());
    let response = &y + &w.matvec(x_coeff);
    let randomness = ProofRandomness {
        u: &s_u + &w.matvec(r_coeff.0),
        v: &s_v + &w.matvec(r_coeff.1),
        w: &s_w + &w.matvec(r_coeff.2),
    };

    PlaintextProof { commitment, response, randomness }
}

/// Verify a proof against a ciphertext batch
pub fn verify(
    params: &BgvParams,
    key: &PublicKey,
    c: &Ciphertext,
    proof: &PlaintextProof,
) -> Result<(), HeError> {
    // Norm bounds first: an out-of-range witness surfaces as the norm
    // failure even when the transcript is otherwise consistent
    let zeta = params.zk_security();
    let checks = [
        (&proof.response, params.mod_p().value(), zeta, ZkRejection::ResponseNorm),
        (&proof.randomness.u, CBD_PAIRS_KEY as u64, zeta + 1, ZkRejection::RandomnessNormU),
        (&proof.randomness.v, CBD_PAIRS_NOISE as u64, zeta + 1, ZkRejection::RandomnessNormV),
        (&proof.randomness.w, CBD_PAIRS_NOISE as u64, zeta + 1, ZkRejection::RandomnessNormW),
    ];
    for (tensor, base, shift, rejection) in checks {
        if (tensor.inf_norm() as u128) > shifted_bound(base, shift) {
            return Err(HeError::ZkRejected(rejection));
        }
    }

    // Enc(NTT(z), NTT(t)) = a + NTT(W * invNTT(c))
    let ntt = params.ntt_q();
    let w = challenge_matrix(params, &challenge_seed(c, &proof.commitment), c.shape());
    let lhs = key.encrypt(
        params,
        &ntt.forward_tensor(&proof.response),
        &Randomness::from_coeff(
            params,
            &proof.randomness.u,
            &proof.randomness.v,
            &proof.randomness.w,
        ),
    );
    let rhs = Ciphertext {
        c0: &proof.commitment.c0 + &ntt.forward_tensor(&w.matvec(&ntt.inverse_tensor(&c.c0))),
        c1: &proof.commitment.c1 + &ntt.forward_tensor(&w.matvec(&ntt.inverse_tensor(&c.c1))),
    };
    if lhs != rhs {
        return Err(HeError::ZkRejected(ZkRejection::CiphertextEquation));
    }

    Ok(())
}

/// Derive the challenge seed from the transcript so far
///
/// Binding the challenge to `(c, a)` makes the proof non-interactive; a
/// verifier recomputes the same matrix from the received transcript.
fn challenge_seed(c: &Ciphertext, commitment: &Ciphertext) -> PrgKey {
    let mut hasher = Sha3_256::new();
    hasher.update(b"lattice-he.zk.challenge.v1");
    for tensor in [&c.c0, &c.c1, &commitment.c0, &commitment.c1] {
        hasher.update((tensor.shape().dims().len() as u64).to_le_bytes());
        for &d in tensor.shape().dims() {
            hasher.update((d as u64).to_le_bytes());
        }
        hasher.update(tensor.to_le_bytes());
    }
    PrgKey(hasher.finalize().into())
}

/// Sample the challenge matrix for a value of the given shape
///
/// Entries are uniform over `[0, n]`; the value `n` is the sentinel for
/// an absent entry, giving a challenge space of `n + 1` per slot.
fn challenge_matrix(params: &BgvParams, seed: &PrgKey, value_shape: &Shape) -> MonomialMatrix {
    let shape = value_shape.insert_before_last(params.zk_rows());
    let n = params.degree() as u64;
    let mut rng = prg::stream(seed, &[], &[]);

    let entries = (0..shape.size())
        .map(|_| {
            let k = prg::uniform_u64(&mut rng, n + 1);
            if k == n {
                None
            } else {
                Some(k as u32)
            }
        })
        .collect();
    MonomialMatrix::from_entries(shape, entries)
}

/// `base * 2^shift`, saturating at the top of `u128`
///
/// Large security parameters push bounds past 128 bits; every norm is
/// below `q < 2^63`, so saturation keeps the comparison correct.
fn shifted_bound(base: u64, shift: u32) -> u128 {
    if shift >= 128 {
        return u128::MAX;
    }
    let b = base as u128;
    if b.leading_zeros() < shift {
        u128::MAX
    } else {
        b << shift
    }
}
