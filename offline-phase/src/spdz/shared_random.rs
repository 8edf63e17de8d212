//! Shared randomness no single party controls
//!
//! Every quorum member commits to a fresh local seed before any is
//! revealed, so the combined seed is unpredictable to each party alone.
//! The MAC check derives its random coefficients from this seed rather
//! than from any fixed, coordinator-controlled stream.

use lattice_he::prg::PrgKey;
use mpc_core::network::MeshNetwork;
use rand::{rngs::OsRng, RngCore};
use sha3::{Digest, Sha3_256};

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Jointly derive a PRG seed via commit/reveal
    pub async fn shared_randomness_seed(&mut self) -> Result<PrgKey, PreprocessError> {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let seeds = self.commit_reveal_bytes(seed.to_vec()).await?;

        let mut hasher = Sha3_256::new();
        hasher.update(b"offline-phase.shared-randomness.v1");
        for s in &seeds {
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s);
        }
        Ok(PrgKey(hasher.finalize().into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::mock_engines;

    /// Every party derives the same seed
    #[tokio::test]
    async fn test_shared_seed_agreement() {
        let seeds = mock_engines(3, |mut engine| async move {
            engine.shared_randomness_seed().await.unwrap()
        })
        .await;

        assert_eq!(seeds[0], seeds[1]);
        assert_eq!(seeds[1], seeds[2]);
    }
}
