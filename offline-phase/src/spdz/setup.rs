//! Demo key material
//!
//! The encryption keys and MAC key shares are derived deterministically
//! from fixed demo seeds, so every party can derive every peer's public
//! key without a round of communication. A production deployment must
//! replace this with a distributed key-generation protocol and fresh MAC
//! key shares; the derivation is isolated here so that swap stays local.

use lattice_he::{
    bgv::{Keypair, PublicKey},
    prg::{self, PrgKey},
    BgvParams,
};

/// The demo seed encryption keys are derived from
const DEMO_ENCRYPTION_SEED: u64 = 44;

/// The demo seed MAC key shares are derived from
const DEMO_MAC_SEED: u64 = 42;

/// Derive the local keypair and every quorum member's public key
pub(crate) fn derive_demo_keys(
    params: &BgvParams,
    my_index: u64,
    quorum: u64,
) -> (Keypair, Vec<PublicKey>) {
    let seed = PrgKey::from_u64(DEMO_ENCRYPTION_SEED);
    let keypair = Keypair::demo_derive(params, &seed, my_index, quorum);
    let public_keys = (0..quorum)
        .map(|holder| Keypair::demo_derive(params, &seed, holder, quorum).public().clone())
        .collect();
    (keypair, public_keys)
}

/// Derive the local party's additive share of the global MAC key
pub(crate) fn derive_mac_share(params: &BgvParams, my_index: u64, quorum: u64) -> u64 {
    let seed = PrgKey::from_u64(DEMO_MAC_SEED);
    let mut rng = prg::stream(&seed, &[my_index], &[quorum]);
    prg::uniform_u64(&mut rng, params.mod_p().value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::toy_params;

    #[test]
    fn test_key_derivation_is_consistent() {
        let params = toy_params();
        let (kp0, keys_seen_by_0) = derive_demo_keys(&params, 0, 2);
        let (kp1, keys_seen_by_1) = derive_demo_keys(&params, 1, 2);

        // Both parties derive the same public key list
        assert_eq!(keys_seen_by_0, keys_seen_by_1);
        assert_eq!(kp0.public(), &keys_seen_by_0[0]);
        assert_eq!(kp1.public(), &keys_seen_by_0[1]);
        assert_ne!(kp0.public(), kp1.public());
    }

    #[test]
    fn test_mac_shares_differ_per_party() {
        let params = toy_params();
        let s0 = derive_mac_share(&params, 0, 2);
        let s1 = derive_mac_share(&params, 1, 2);
        assert!(s0 < params.mod_p().value());
        assert!(s1 < params.mod_p().value());

        // Re-derivation is deterministic
        assert_eq!(s0, derive_mac_share(&params, 0, 2));
        assert_eq!(s1, derive_mac_share(&params, 1, 2));
    }
}
