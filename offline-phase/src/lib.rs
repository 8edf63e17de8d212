//! The authenticated preprocessing engine
//!
//! Implements the SPDZ-style offline phase over the drowning-BGV
//! cryptosystem: additive MAC key shares, homomorphic authentication of
//! encrypted shares, Beaver triple generation with plaintext-knowledge
//! proofs, authenticated input masks, and the batched MAC check — plus
//! the online subprotocols (Beaver multiplication, secure aggregation)
//! that consume the preprocessed artifacts.
//!
//! The offline phase runs ahead of any computation so the online phase
//! needs no public-key operations. Security is honest-with-abort: any
//! failed check terminates the run, naming the offending party where
//! attributable.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod spdz;
pub mod structs;

pub use error::PreprocessError;
pub use spdz::{aggregation::InputClient, SpdzEngine};

#[cfg(test)]
pub(crate) mod test_helpers {
    use futures::Future;
    use lattice_he::BgvParams;
    use mpc_core::{
        config::MpcConfig,
        network::{mock::MockMesh, Communicator},
        PartyId,
    };

    use crate::spdz::SpdzEngine;

    /// A small NTT-compatible parameter set for protocol tests
    pub fn toy_params() -> BgvParams {
        BgvParams::new(998244353, 17, 4, 1 << 18, 4, 8, 2, 2).unwrap()
    }

    /// The configuration of one party in a test run
    pub fn party_config(
        params: &BgvParams,
        compute: &[PartyId],
        inputs: &[PartyId],
        self_id: PartyId,
    ) -> MpcConfig {
        MpcConfig {
            params: params.clone(),
            compute_parties: Communicator::new(compute.to_vec()),
            input_parties: Communicator::new(inputs.to_vec()),
            self_id,
        }
    }

    /// Run the same closure on `n` mock compute parties
    pub async fn mock_engines<F, S, T>(n: usize, mut f: F) -> Vec<T>
    where
        F: FnMut(SpdzEngine<MockMesh>) -> S,
        S: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let params = toy_params();
        let ids: Vec<PartyId> = (0..n as u64).collect();

        let mut handles = Vec::with_capacity(n);
        for (id, mesh) in ids.iter().zip(MockMesh::mesh(&ids)) {
            let cfg = party_config(&params, &ids, &[], *id);
            let engine = SpdzEngine::new(cfg, mesh).unwrap();
            handles.push(tokio::spawn(f(engine)));
        }

        let mut out = Vec::with_capacity(n);
        for handle in handles {
            out.push(handle.await.unwrap());
        }
        out
    }
}
