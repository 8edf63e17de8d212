//! Deterministic keyed sampling
//!
//! A PRG invocation is a pure function of `(key, index, shape)`: the
//! triple is domain-separated and hashed into a ChaCha20 seed, so streams
//! at distinct index vectors are computationally independent. All
//! samplers draw from such a stream (or any other [`Rng`]) and parse
//! bytes into residues by rejection.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::{
    ring::Modulus,
    tensor::{Coeff, Representation, RingTensor, Shape},
};

/// A 256-bit PRF/PRG key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrgKey(pub [u8; 32]);

impl PrgKey {
    /// A key whose first limb is `v`, the demo convention for
    /// deterministic key material
    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&v.to_le_bytes());
        Self(bytes)
    }

    /// A fresh random key
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

/// The deterministic stream at `(key, index, shape)`
///
/// `shape` describes the index space the caller draws from; it is folded
/// into the seed so that the same index under a different enumeration
/// yields an independent stream.
pub fn stream(key: &PrgKey, index: &[u64], shape: &[u64]) -> ChaCha20Rng {
    let mut hasher = Sha3_256::new();
    hasher.update(b"lattice-he.prg.v1");
    hasher.update(key.0);
    hasher.update((index.len() as u64).to_le_bytes());
    for &i in index {
        hasher.update(i.to_le_bytes());
    }
    hasher.update((shape.len() as u64).to_le_bytes());
    for &s in shape {
        hasher.update(s.to_le_bytes());
    }
    ChaCha20Rng::from_seed(hasher.finalize().into())
}

/// A uniform residue in `[0, m)` by rejection below the largest multiple
/// of `m` under `2^64`
pub fn uniform_u64<R: Rng + ?Sized>(rng: &mut R, m: u64) -> u64 {
    debug_assert!(m > 0);
    // Number of values rejected at the top of the u64 range
    let overhang = ((u64::MAX % m) + 1) % m;
    let limit = u64::MAX - overhang;
    loop {
        let v = rng.gen::<u64>();
        if v <= limit {
            return v % m;
        }
    }
}

/// A uniform tensor of ring elements
///
/// Uniform residues are uniform in either representation, so the caller
/// picks the representation the value is consumed in.
pub fn uniform_tensor<D: Representation, R: Rng + ?Sized>(
    rng: &mut R,
    shape: Shape,
    degree: usize,
    modulus: Modulus,
) -> RingTensor<D> {
    let len = shape.size() * degree;
    let data = (0..len).map(|_| uniform_u64(rng, modulus.value())).collect();
    RingTensor::from_raw(shape, degree, modulus, data)
}

/// A centered-binomial tensor of variance `pairs / 2`
///
/// Each coefficient is the sum of `pairs` bit-pair differences, so its
/// magnitude is at most `pairs`.
pub fn centered_binomial_tensor<R: Rng + ?Sized>(
    rng: &mut R,
    shape: Shape,
    degree: usize,
    modulus: Modulus,
    pairs: u32,
) -> RingTensor<Coeff> {
    let len = shape.size() * degree;
    let data = (0..len)
        .map(|_| {
            let mut acc = 0i128;
            for _ in 0..pairs {
                let bits = rng.gen::<u32>();
                acc += (bits & 1) as i128 - ((bits >> 1) & 1) as i128;
            }
            modulus.reduce_signed(acc)
        })
        .collect();
    RingTensor::from_raw(shape, degree, modulus, data)
}

/// The largest magnitude of a drowning sample: `bound * 2^security`
pub fn drown_magnitude(bound: u64, security: u32) -> u128 {
    (bound as u128) << security
}

/// A drowning tensor: signed uniform over `[-B * 2^sec, B * 2^sec]`
///
/// Sampling is by rejection over `u128` values, then shifted to be
/// centered and reduced into the canonical range.
pub fn drowning_tensor<R: Rng + ?Sized>(
    rng: &mut R,
    shape: Shape,
    degree: usize,
    modulus: Modulus,
    bound: u64,
    security: u32,
) -> RingTensor<Coeff> {
    let magnitude = drown_magnitude(bound, security);
    let range = 2 * magnitude + 1;
    let overhang = ((u128::MAX % range) + 1) % range;
    let limit = u128::MAX - overhang;

    let len = shape.size() * degree;
    let data = (0..len)
        .map(|_| {
            let v = loop {
                let v = rng.gen::<u128>();
                if v <= limit {
                    break v % range;
                }
            };
            modulus.reduce_signed(v as i128 - magnitude as i128)
        })
        .collect();
    RingTensor::from_raw(shape, degree, modulus, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Eval;

    #[test]
    fn test_stream_determinism() {
        let key = PrgKey::from_u64(42);
        let shape = Shape::new(vec![3]);
        let m = Modulus::new(17);

        let a: RingTensor<Eval> = uniform_tensor(&mut stream(&key, &[0, 1], &[2, 4]), shape.clone(), 4, m);
        let b: RingTensor<Eval> = uniform_tensor(&mut stream(&key, &[0, 1], &[2, 4]), shape.clone(), 4, m);
        let c: RingTensor<Eval> = uniform_tensor(&mut stream(&key, &[1, 1], &[2, 4]), shape, 4, m);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_uniform_in_range() {
        let mut rng = stream(&PrgKey::from_u64(1), &[], &[]);
        for _ in 0..1000 {
            assert!(uniform_u64(&mut rng, 17) < 17);
        }
    }

    #[test]
    fn test_binomial_bounded() {
        let mut rng = stream(&PrgKey::from_u64(2), &[], &[]);
        let t = centered_binomial_tensor(
            &mut rng,
            Shape::new(vec![64]),
            8,
            Modulus::new(998244353),
            20,
        );
        assert!(t.inf_norm() <= 20);
    }

    #[test]
    fn test_drowning_bounded() {
        let mut rng = stream(&PrgKey::from_u64(3), &[], &[]);
        let t = drowning_tensor(
            &mut rng,
            Shape::new(vec![64]),
            8,
            Modulus::new(998244353),
            16,
            4,
        );
        assert!(t.inf_norm() <= 16 << 4);
    }
}
