//! The BGV-like cryptosystem
//!
//! Keys and ciphertexts live in the `Z_q` evaluation domain. The scheme
//! is flat: homomorphic addition, scalar multiplication, and pointwise
//! multiplication by a public ring tensor are supported, and no
//! relinearization is ever needed. A ciphertext that went through a
//! homomorphic product must be refreshed with drowning noise (an added
//! encryption drawn via [`Randomness::drowning`]) before leaving the
//! party that computed it.

mod ciphertext;
mod keys;
mod randomness;

pub use ciphertext::Ciphertext;
pub use keys::{Keypair, PublicKey, SecretKey};
pub use randomness::{Randomness, CBD_PAIRS_KEY, CBD_PAIRS_NOISE};

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::{
        params::BgvParams,
        prg::PrgKey,
        tensor::{Eval, RingTensor, Shape},
    };

    fn toy() -> BgvParams {
        BgvParams::new(998244353, 17, 4, 1 << 18, 4, 8, 2, 2).unwrap()
    }

    fn keypair(params: &BgvParams) -> Keypair {
        Keypair::demo_derive(params, &PrgKey::from_u64(44), 0, 2)
    }

    fn constant_pt(params: &BgvParams, value: u64) -> RingTensor<Eval> {
        RingTensor::constant(Shape::new(vec![3]), params.degree(), params.mod_p(), value)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let params = toy();
        let keys = keypair(&params);
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        let pt = constant_pt(&params, 11);
        let r = Randomness::sample(&params, pt.shape().clone(), &mut rng);
        let ct = keys.public().encrypt(&params, &params.lift_plaintext(&pt), &r);

        let decrypted = keys.secret().decrypt(&params, &ct).unwrap();
        assert_eq!(decrypted, pt);
    }

    #[test]
    fn test_homomorphic_linearity() {
        let params = toy();
        let keys = keypair(&params);
        let mut rng = ChaCha20Rng::seed_from_u64(8);

        let m1 = constant_pt(&params, 4);
        let m2 = constant_pt(&params, 9);
        let shape = m1.shape().clone();

        let c1 = keys.public().encrypt(
            &params,
            &params.lift_plaintext(&m1),
            &Randomness::sample(&params, shape.clone(), &mut rng),
        );
        let c2 = keys.public().encrypt(
            &params,
            &params.lift_plaintext(&m2),
            &Randomness::sample(&params, shape.clone(), &mut rng),
        );

        // alpha * c1 + beta * c2 + Enc(0, drowning refresh)
        let (alpha, beta) = (3u64, 5u64);
        let zero = RingTensor::<Eval>::zeros(shape.clone(), params.degree(), params.mod_q());
        let refresh = keys.public().encrypt(
            &params,
            &zero,
            &Randomness::drowning(&params, shape, &mut rng),
        );
        let combined = &(&c1.scalar_mul(alpha) + &c2.scalar_mul(beta)) + &refresh;

        let decrypted = keys.secret().decrypt(&params, &combined).unwrap();
        let expected = &m1.scalar_mul(alpha) + &m2.scalar_mul(beta);
        assert_eq!(decrypted, expected);
    }

    #[test]
    fn test_drowning_refresh_masks_scalar_product() {
        let params = toy();
        let keys = keypair(&params);
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        let m = constant_pt(&params, 7);
        let shape = m.shape().clone();
        let c = keys.public().encrypt(
            &params,
            &params.lift_plaintext(&m),
            &Randomness::sample(&params, shape.clone(), &mut rng),
        );

        // alpha * c refreshed with an encryption of the mask s'
        let alpha = 13u64;
        let mask = constant_pt(&params, 2);
        let refresh = keys.public().encrypt(
            &params,
            &params.lift_plaintext(&mask),
            &Randomness::drowning(&params, shape, &mut rng),
        );
        let refreshed = &c.scalar_mul(alpha) + &refresh;

        let decrypted = keys.secret().decrypt(&params, &refreshed).unwrap();
        let expected = &m.scalar_mul(alpha) + &mask;
        assert_eq!(decrypted, expected);
    }
}
