//! The batched MAC check
//!
//! Consolidates a batch of opened values and local tag shares into a
//! single randomized equation: with jointly derived coefficients `rho`,
//! each party computes `sigma_i = sum_k rho_k * (t_i^k - y^k * alpha_i)`
//! and the quorum accepts iff the all-gathered `sigma_i` reconstruct to
//! zero. A wrong tag survives only if the random combination cancels it,
//! which happens with probability `1/p`.

use itertools::izip;
use lattice_he::{
    prg,
    tensor::{Eval, RingTensor, Shape},
};
use mpc_core::{network::MeshNetwork, share::{reconstruct, AuthTensor}};

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Check a batch of opened values against the local tag shares
    pub async fn mac_check(
        &mut self,
        opened: &[RingTensor<Eval>],
        tag_shares: &[RingTensor<Eval>],
    ) -> Result<(), PreprocessError> {
        assert_eq!(opened.len(), tag_shares.len(), "batch sizes must match");

        let params = self.cfg.params.clone();
        let seed = self.shared_randomness_seed().await?;
        let mut rng = prg::stream(&seed, &[], &[]);

        let alpha = self.mac_share;
        let mut sigma =
            RingTensor::<Eval>::zeros(Shape::scalar(), params.degree(), params.mod_p());
        for (y, t) in izip!(opened, tag_shares) {
            let rho: RingTensor<Eval> = prg::uniform_tensor(
                &mut rng,
                y.shape().clone(),
                params.degree(),
                params.mod_p(),
            );
            let term = &(&rho * t) - &(&rho * y).scalar_mul(alpha);
            sigma = &sigma + &term.sum_elements();
        }

        let sigmas: Vec<RingTensor<Eval>> =
            self.net.all_gather(&self.cfg.compute_parties, sigma).await?;
        if reconstruct(&sigmas).is_zero() {
            Ok(())
        } else {
            Err(PreprocessError::MacCheckFailed)
        }
    }

    /// Open a batch of authenticated shares and check their MACs
    ///
    /// Returns the opened values; on a failed check none of them may be
    /// used.
    pub async fn open_and_check(
        &mut self,
        batch: &[AuthTensor],
    ) -> Result<Vec<RingTensor<Eval>>, PreprocessError> {
        let mut opened = Vec::with_capacity(batch.len());
        for item in batch {
            let shares: Vec<RingTensor<Eval>> =
                self.net.all_gather(&self.cfg.compute_parties, item.share.clone()).await?;
            opened.push(reconstruct(&shares));
        }

        let tag_shares: Vec<RingTensor<Eval>> = batch.iter().map(|b| b.mac.clone()).collect();
        self.mac_check(&opened, &tag_shares).await?;
        Ok(opened)
    }
}

#[cfg(test)]
mod tests {
    use lattice_he::{prg, tensor::Shape};
    use rand::rngs::OsRng;

    use crate::{error::PreprocessError, test_helpers::mock_engines};

    /// Honest tags pass, and the opened values reconstruct correctly
    #[tokio::test]
    async fn test_honest_batch_accepts() {
        let results = mock_engines(3, |mut engine| async move {
            let params = engine.params().clone();
            let shape = Shape::new(vec![1, params.zk_cols()]);
            let share = prg::uniform_tensor(&mut OsRng, shape, params.degree(), params.mod_p());
            let (auth, _) = engine.authenticate(share).await.unwrap();

            engine.open_and_check(&[auth]).await
        })
        .await;

        for res in results {
            res.unwrap();
        }
    }

    /// One tampered tag share trips the check for everyone
    #[tokio::test]
    async fn test_tampered_tag_rejects() {
        let results = mock_engines(3, |mut engine| async move {
            let params = engine.params().clone();
            let shape = Shape::new(vec![1, params.zk_cols()]);
            let share = prg::uniform_tensor(&mut OsRng, shape, params.degree(), params.mod_p());
            let (mut auth, _) = engine.authenticate(share).await.unwrap();

            // The last party shifts its tag share by one
            if engine.compute_index() == 2 {
                let m = params.mod_p();
                for c in auth.mac.data_mut() {
                    *c = m.add(*c, 1);
                }
            }

            engine.open_and_check(&[auth]).await
        })
        .await;

        for res in results {
            assert!(matches!(res, Err(PreprocessError::MacCheckFailed)));
        }
    }
}
