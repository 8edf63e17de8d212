//! Cryptosystem parameters
//!
//! All parameters are runtime values handed in at startup. Compatibility
//! requirements that a compile-time build would static-assert are checked
//! once here and reported as [`HeError::ConfigInvalid`].

use crate::{
    error::HeError,
    ntt::NttTable,
    ring::{is_prime, Modulus},
    tensor::{Coeff, Eval, RingTensor},
};

/// The parameter set of the BGV-like scheme
///
/// Carries the plaintext modulus `p`, ciphertext modulus `q`, ring degree
/// `n`, the drowning-noise bound, the statistical security parameters,
/// and the batching widths of the plaintext proof, together with the
/// precomputed NTT tables for both moduli.
#[derive(Clone, Debug)]
pub struct BgvParams {
    /// Ciphertext modulus
    mod_q: Modulus,
    /// Plaintext modulus
    mod_p: Modulus,
    /// Ring degree
    n: usize,
    /// Drowning-noise bound `B`; refresh noise is uniform over
    /// `[-B * 2^lambda, B * 2^lambda]`
    drown_bound: u64,
    /// Statistical security `lambda` for drowning and uniform sampling
    statistical_security: u32,
    /// Statistical security `zeta` of the plaintext proof
    zk_security: u32,
    /// Last-axis width `U` of proven plaintext tensors
    zk_cols: usize,
    /// Auxiliary width `V` of the proof commitment
    zk_rows: usize,
    /// NTT table for `Z_q`
    ntt_q: NttTable,
    /// NTT table for `Z_p`
    ntt_p: NttTable,
}

impl BgvParams {
    /// Validate a parameter set and precompute its NTT tables
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        q: u64,
        p: u64,
        n: usize,
        drown_bound: u64,
        statistical_security: u32,
        zk_security: u32,
        zk_cols: usize,
        zk_rows: usize,
    ) -> Result<Self, HeError> {
        if !n.is_power_of_two() || n < 2 {
            return Err(HeError::ConfigInvalid(format!("ring degree {n} is not a power of two")));
        }
        if q >= 1 << 63 {
            return Err(HeError::ConfigInvalid("q must fit in 63 bits".into()));
        }
        if !is_prime(q) || !is_prime(p) {
            return Err(HeError::ConfigInvalid("moduli must be prime".into()));
        }
        if p >= q {
            return Err(HeError::ConfigInvalid("p must be smaller than q".into()));
        }
        let two_n = 2 * n as u64;
        if q % two_n != 1 {
            return Err(HeError::ConfigInvalid(format!("q = {q} is not 1 mod 2n")));
        }
        if p % two_n != 1 {
            return Err(HeError::ConfigInvalid(format!("p = {p} is not 1 mod 2n")));
        }
        if zk_cols == 0 || zk_rows == 0 {
            return Err(HeError::ConfigInvalid("proof batching widths must be positive".into()));
        }
        if statistical_security == 0 || statistical_security > 64 {
            return Err(HeError::ConfigInvalid(
                "statistical security must be in 1..=64".into(),
            ));
        }
        if zk_security == 0 || zk_security > 128 {
            return Err(HeError::ConfigInvalid("zk security must be in 1..=128".into()));
        }
        if drown_bound == 0 {
            return Err(HeError::ConfigInvalid("drowning bound must be positive".into()));
        }

        // The noise of a drowning encryption must stay inside the q/4
        // decryption window: |p * (v - u*e - w*s) + m| with |v| up to
        // B * 2^lambda and the binomial terms bounded by 40n.
        let drown_mag = (drown_bound as u128) << statistical_security;
        let worst = 4u128 * p as u128 * (drown_mag + 40 * n as u128 + 1);
        if worst >= q as u128 {
            return Err(HeError::ConfigInvalid(
                "drowning bound too large for the q/4 decryption window".into(),
            ));
        }

        let mod_q = Modulus::new(q);
        let mod_p = Modulus::new(p);
        let ntt_q = NttTable::new(n, mod_q);
        let ntt_p = NttTable::new(n, mod_p);

        Ok(Self {
            mod_q,
            mod_p,
            n,
            drown_bound,
            statistical_security,
            zk_security,
            zk_cols,
            zk_rows,
            ntt_q,
            ntt_p,
        })
    }

    /// The ciphertext modulus
    pub fn mod_q(&self) -> Modulus {
        self.mod_q
    }

    /// The plaintext modulus
    pub fn mod_p(&self) -> Modulus {
        self.mod_p
    }

    /// The ring degree
    pub fn degree(&self) -> usize {
        self.n
    }

    /// The drowning bound `B`
    pub fn drown_bound(&self) -> u64 {
        self.drown_bound
    }

    /// Statistical security for drowning and uniform sampling
    pub fn statistical_security(&self) -> u32 {
        self.statistical_security
    }

    /// Statistical security of the plaintext proof
    pub fn zk_security(&self) -> u32 {
        self.zk_security
    }

    /// The last-axis width of proven plaintext tensors
    pub fn zk_cols(&self) -> usize {
        self.zk_cols
    }

    /// The auxiliary width of the proof commitment
    pub fn zk_rows(&self) -> usize {
        self.zk_rows
    }

    /// The NTT table of `Z_q`
    pub fn ntt_q(&self) -> &NttTable {
        &self.ntt_q
    }

    /// The NTT table of `Z_p`
    pub fn ntt_p(&self) -> &NttTable {
        &self.ntt_p
    }

    /// The plaintext modulus as a ciphertext-domain scalar
    pub fn p_in_q(&self) -> u64 {
        self.mod_q.reduce(self.mod_p.value())
    }

    /// Embed a plaintext tensor into the ciphertext ring
    ///
    /// Residues are lifted positionally: the plaintext is taken back to
    /// coefficient form, its representatives in `[0, p)` are reinterpreted
    /// modulo `q`, and the result is transformed into the `Z_q`
    /// evaluation domain.
    pub fn lift_plaintext(&self, pt: &RingTensor<Eval>) -> RingTensor<Eval> {
        debug_assert_eq!(pt.modulus(), self.mod_p);
        let coeff = self.ntt_p.inverse_tensor(pt);
        self.ntt_q.forward_tensor(&coeff.lift(self.mod_q))
    }

    /// Embed a coefficient-form plaintext into the ciphertext ring
    pub fn lift_plaintext_coeff(&self, pt: &RingTensor<Coeff>) -> RingTensor<Eval> {
        debug_assert_eq!(pt.modulus(), self.mod_p);
        self.ntt_q.forward_tensor(&pt.lift(self.mod_q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Shape;

    /// A small but NTT-compatible parameter set
    pub(crate) fn toy() -> BgvParams {
        BgvParams::new(998244353, 17, 4, 1 << 18, 4, 8, 2, 2).unwrap()
    }

    #[test]
    fn test_rejects_bad_moduli() {
        // q not 1 mod 2n
        assert!(matches!(
            BgvParams::new(23, 17, 4, 4, 2, 4, 2, 2),
            Err(HeError::ConfigInvalid(_))
        ));
        // composite p
        assert!(matches!(
            BgvParams::new(998244353, 15, 4, 4, 2, 4, 2, 2),
            Err(HeError::ConfigInvalid(_))
        ));
        // degree not a power of two
        assert!(matches!(
            BgvParams::new(998244353, 17, 6, 4, 2, 4, 2, 2),
            Err(HeError::ConfigInvalid(_))
        ));
        // drowning range overflows the decryption window
        assert!(matches!(
            BgvParams::new(998244353, 17, 4, 1 << 40, 30, 4, 2, 2),
            Err(HeError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_lift_roundtrip() {
        let params = toy();
        let pt = RingTensor::<Eval>::constant(Shape::new(vec![2]), 4, params.mod_p(), 5);
        let lifted = params.lift_plaintext(&pt);
        assert_eq!(lifted.modulus(), params.mod_q());

        // Lifting a constant keeps it constant in the q evaluation domain
        assert!(lifted.data().iter().all(|&x| x == 5));
    }
}
