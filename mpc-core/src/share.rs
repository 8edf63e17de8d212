//! Authenticated share types
//!
//! An authenticated share pairs an additive share with an additive share
//! of its MAC under the global key: every compute party `i` holds
//! `(x_i, t_i)` with `sum x_i = x` and `sum t_i = alpha * x`. Per-party
//! artifacts are `Vec`s indexed by a party's position in the compute
//! quorum, and [`reconstruct`] is the single canonical reconstruction
//! path.

use std::ops::{Add, Sub};

use lattice_he::tensor::{Eval, RingTensor};

// ------------------------
// | Authenticated shares |
// ------------------------

/// One party's authenticated share of a plaintext tensor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthTensor {
    /// The additive share of the value
    pub share: RingTensor<Eval>,
    /// The additive share of the MAC tag
    pub mac: RingTensor<Eval>,
}

impl AuthTensor {
    /// Pair a value share with its tag share
    pub fn new(share: RingTensor<Eval>, mac: RingTensor<Eval>) -> Self {
        Self { share, mac }
    }

    /// Multiply by a public plaintext tensor
    ///
    /// Share and tag scale together, so the result stays authenticated.
    pub fn mul_public(&self, public: &RingTensor<Eval>) -> Self {
        Self { share: &self.share * public, mac: &self.mac * public }
    }

    /// Add a public plaintext tensor
    ///
    /// Only the designated party moves its value share; every party
    /// adjusts its tag share by `alpha_i * public`.
    pub fn add_public(
        &self,
        public: &RingTensor<Eval>,
        mac_key_share: u64,
        is_designated: bool,
    ) -> Self {
        let share = if is_designated { &self.share + public } else { self.share.clone() };
        let mac = &self.mac + &public.scalar_mul(mac_key_share);
        Self { share, mac }
    }
}

impl Add for &AuthTensor {
    type Output = AuthTensor;

    fn add(self, rhs: Self) -> Self::Output {
        AuthTensor { share: &self.share + &rhs.share, mac: &self.mac + &rhs.mac }
    }
}

impl Sub for &AuthTensor {
    type Output = AuthTensor;

    fn sub(self, rhs: Self) -> Self::Output {
        AuthTensor { share: &self.share - &rhs.share, mac: &self.mac - &rhs.mac }
    }
}

/// Reconstruct a secret from every party's additive share
pub fn reconstruct(shares: &[RingTensor<Eval>]) -> RingTensor<Eval> {
    let (first, rest) = shares.split_first().expect("reconstruct needs at least one share");
    rest.iter().fold(first.clone(), |acc, s| &acc + s)
}

#[cfg(test)]
mod tests {
    use lattice_he::{ring::Modulus, tensor::Shape};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn uniform(rng: &mut ChaCha20Rng) -> RingTensor<Eval> {
        lattice_he::prg::uniform_tensor(rng, Shape::new(vec![2]), 4, Modulus::new(17))
    }

    #[test]
    fn test_reconstruct_sums_shares() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let a = uniform(&mut rng);
        let b = uniform(&mut rng);
        let c = uniform(&mut rng);

        let total = reconstruct(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(total, &(&a + &b) + &c);
    }

    #[test]
    fn test_share_arithmetic_is_componentwise() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let x = AuthTensor::new(uniform(&mut rng), uniform(&mut rng));
        let y = AuthTensor::new(uniform(&mut rng), uniform(&mut rng));

        let sum = &x + &y;
        assert_eq!(sum.share, &x.share + &y.share);
        assert_eq!(sum.mac, &x.mac + &y.mac);
        assert_eq!(&(&sum - &y), &x);
    }

    #[test]
    fn test_add_public_designated_only() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let x = AuthTensor::new(uniform(&mut rng), uniform(&mut rng));
        let public = uniform(&mut rng);
        let alpha_share = 5u64;

        let designated = x.add_public(&public, alpha_share, true);
        let other = x.add_public(&public, alpha_share, false);

        assert_eq!(designated.share, &x.share + &public);
        assert_eq!(other.share, x.share);
        assert_eq!(designated.mac, other.mac);
        assert_eq!(designated.mac, &x.mac + &public.scalar_mul(alpha_share));
    }
}
