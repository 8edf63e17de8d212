//! Homomorphic share authentication
//!
//! Turns encrypted additive shares into additive shares of the MAC tag:
//! for every other party's ciphertext `c_j`, the local party computes
//! `alpha_i * c_j - Enc(pk_j, s_ij, drowning r)` with a fresh plaintext
//! mask `s_ij`, ships it via all-to-all, and keeps `s_ij` as its own tag
//! contribution. The recipient decrypts its deliveries and adds
//! `alpha_j * x_j` for its own share. Summed over the quorum the tag
//! shares reconstruct to `alpha * sum_j x_j`.

use lattice_he::{
    bgv::{Ciphertext, Randomness},
    error::HeError,
    prg,
    tensor::{Coeff, Eval, RingTensor},
    zk::{self, PlaintextProof},
};
use mpc_core::{network::MeshNetwork, share::AuthTensor};
use rand::rngs::OsRng;

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Encrypt and prove the local share, exchange with the quorum, and
    /// verify every peer's proof
    ///
    /// Returns the gathered ciphertexts indexed by quorum position. A
    /// failed verification aborts the run naming the offending party;
    /// none of the ciphertexts may be used in that case.
    pub async fn exchange_encrypted_shares(
        &mut self,
        share: &RingTensor<Eval>,
    ) -> Result<Vec<Ciphertext>, PreprocessError> {
        let (ct, proof) = zk::prove(&self.cfg.params, self.keypair.public(), share, &mut OsRng);
        let cts: Vec<Ciphertext> = self.net.all_gather(&self.cfg.compute_parties, ct).await?;
        let proofs: Vec<PlaintextProof> =
            self.net.all_gather(&self.cfg.compute_parties, proof).await?;

        let my_idx = self.compute_index();
        for (i, (ct, proof)) in cts.iter().zip(proofs.iter()).enumerate() {
            if i == my_idx {
                continue;
            }
            zk::verify(&self.cfg.params, &self.public_keys[i], ct, proof).map_err(|err| {
                let party = self.cfg.compute_parties.get(i);
                match err {
                    HeError::ZkRejected(reason) => PreprocessError::ZkRejected { party, reason },
                    other => PreprocessError::Transport(other.to_string()),
                }
            })?;
        }
        Ok(cts)
    }

    /// Mask per-peer homomorphic products with drowning encryptions,
    /// deliver them via all-to-all, decrypt the deliveries, and combine
    ///
    /// `products[j]` is the unmasked product addressed to quorum member
    /// `j` (`None` at the local slot). The local result is
    /// `own_term + sum_j (s_ij + Dec(delivery_j))`, an additive share of
    /// the sum of what every party's products encode.
    pub(crate) async fn exchange_masked_products(
        &mut self,
        products: Vec<Option<Ciphertext>>,
        own_term: RingTensor<Eval>,
    ) -> Result<RingTensor<Eval>, PreprocessError> {
        let params = self.cfg.params.clone();
        let shape = own_term.shape().clone();
        let my_idx = self.compute_index();
        assert_eq!(products.len(), self.cfg.compute_parties.len());

        let mut rng = OsRng;
        let mut kept_masks: Vec<Option<RingTensor<Eval>>> = Vec::with_capacity(products.len());
        let mut outgoing = Vec::with_capacity(products.len());
        for (j, product) in products.into_iter().enumerate() {
            if j == my_idx {
                debug_assert!(product.is_none());
                kept_masks.push(None);
                outgoing.push(Ciphertext::zeros(&params, shape.clone()));
                continue;
            }
            let product = product.expect("every peer slot carries a product");

            let mask: RingTensor<Coeff> = prg::uniform_tensor(
                &mut rng,
                shape.clone(),
                params.degree(),
                params.mod_p(),
            );
            let refresh = self.public_keys[j].encrypt(
                &params,
                &params.lift_plaintext_coeff(&mask),
                &Randomness::drowning(&params, shape.clone(), &mut rng),
            );
            outgoing.push(&product - &refresh);
            kept_masks.push(Some(params.ntt_p().forward_tensor(&mask)));
        }

        let received = self.net.all_to_all(&self.cfg.compute_parties, outgoing).await?;

        let mut acc = own_term;
        for (j, ct) in received.into_iter().enumerate() {
            if j == my_idx {
                continue;
            }
            let delivered = self
                .keypair
                .secret()
                .decrypt(&params, &ct)
                .map_err(|_| PreprocessError::DecryptOutOfRange)?;
            let kept = kept_masks[j].take().expect("peer slots keep a mask");
            acc = &(&acc + &delivered) + &kept;
        }
        Ok(acc)
    }

    /// The local additive share of `alpha` times the total of the
    /// encrypted shares
    pub async fn tag_shares(
        &mut self,
        my_share: &RingTensor<Eval>,
        encs: &[Ciphertext],
    ) -> Result<RingTensor<Eval>, PreprocessError> {
        let my_idx = self.compute_index();
        let alpha = self.mac_share;
        let products = encs
            .iter()
            .enumerate()
            .map(|(j, c)| (j != my_idx).then(|| c.scalar_mul(alpha)))
            .collect();
        let own = my_share.scalar_mul(alpha);
        self.exchange_masked_products(products, own).await
    }

    /// Authenticate a locally sampled additive share
    ///
    /// Returns the authenticated share together with the gathered
    /// ciphertexts, which triple generation reuses for its products.
    pub async fn authenticate(
        &mut self,
        share: RingTensor<Eval>,
    ) -> Result<(AuthTensor, Vec<Ciphertext>), PreprocessError> {
        let encs = self.exchange_encrypted_shares(&share).await?;
        let mac = self.tag_shares(&share, &encs).await?;
        Ok((AuthTensor::new(share, mac), encs))
    }
}

#[cfg(test)]
mod tests {
    use lattice_he::{prg, tensor::Shape};
    use mpc_core::share::reconstruct;
    use rand::rngs::OsRng;

    use crate::test_helpers::mock_engines;

    /// The tag shares of authenticated shares reconstruct to
    /// `alpha * value` for the reconstructed value
    #[tokio::test]
    async fn test_authenticated_shares_reconstruct() {
        let results = mock_engines(3, |mut engine| async move {
            let params = engine.params().clone();
            let shape = Shape::new(vec![1, params.zk_cols()]);
            let share = prg::uniform_tensor(
                &mut OsRng,
                shape,
                params.degree(),
                params.mod_p(),
            );
            let (auth, _) = engine.authenticate(share).await.unwrap();

            let shares = engine.net.all_gather(&engine.cfg.compute_parties, auth.share).await.unwrap();
            let macs = engine.net.all_gather(&engine.cfg.compute_parties, auth.mac).await.unwrap();
            let alphas: Vec<u64> =
                engine.net.all_gather(&engine.cfg.compute_parties, engine.mac_share()).await.unwrap();

            (reconstruct(&shares), reconstruct(&macs), alphas, params)
        })
        .await;

        for (value, tag, alphas, params) in results {
            let p = params.mod_p();
            let alpha = alphas.iter().fold(0u64, |acc, &a| p.add(acc, a));
            assert_eq!(tag, value.scalar_mul(alpha));
        }
    }
}
