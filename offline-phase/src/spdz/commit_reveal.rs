//! A hash-based commit/reveal subprotocol over the compute quorum

use mpc_core::network::MeshNetwork;
use sha3::{Digest, Sha3_256};

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Commit to a byte blob, then reveal it, with every quorum member
    ///
    /// Returns the revealed blobs indexed by quorum position. A peer
    /// whose opening does not match its commitment aborts the run.
    pub async fn commit_reveal_bytes(
        &mut self,
        value: Vec<u8>,
    ) -> Result<Vec<Vec<u8>>, PreprocessError> {
        let my_comm = commit_bytes(&value).to_vec();
        let comms: Vec<Vec<u8>> =
            self.net.all_gather(&self.cfg.compute_parties, my_comm).await?;
        let values: Vec<Vec<u8>> = self.net.all_gather(&self.cfg.compute_parties, value).await?;

        for (i, (comm, opened)) in comms.iter().zip(values.iter()).enumerate() {
            if commit_bytes(opened).as_slice() != comm.as_slice() {
                return Err(PreprocessError::InvalidCommitment {
                    party: self.cfg.compute_parties.get(i),
                });
            }
        }
        Ok(values)
    }
}

/// Hash commitment over a byte blob
fn commit_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(b"offline-phase.commit.v1");
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
    hasher.finalize().into()
}
