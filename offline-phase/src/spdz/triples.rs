//! Beaver triple generation
//!
//! The quorum produces authenticated shares `<a>`, `<b>`, `<c>` with
//! `c = a * b`. Both factors are authenticated by the homomorphic
//! tagging routine; the product shares come from the same masked
//! cross-product exchange, with the local factor share multiplied into
//! every peer's encrypted share. Intermediate ciphertexts are refreshed
//! with drowning noise inside the exchange before anything is sent.

use lattice_he::{
    prg,
    tensor::{Coeff, Eval, RingTensor, Shape},
};
use mpc_core::network::MeshNetwork;
use rand::rngs::OsRng;

use crate::{error::PreprocessError, structs::AuthTriple};

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Generate one authenticated Beaver triple of the given shape
    pub async fn generate_triple(&mut self, shape: &Shape) -> Result<AuthTriple, PreprocessError> {
        let params = self.cfg.params.clone();
        let mut rng = OsRng;

        // The left factor is sampled in coefficient form so its lift
        // into the ciphertext ring is available for the cross products
        let a_coeff: RingTensor<Coeff> = prg::uniform_tensor(
            &mut rng,
            shape.clone(),
            params.degree(),
            params.mod_p(),
        );
        let a_pt = params.ntt_p().forward_tensor(&a_coeff);
        let a_hom = params.lift_plaintext_coeff(&a_coeff);
        let (a_auth, _) = self.authenticate(a_pt.clone()).await?;

        let b_pt: RingTensor<Eval> = prg::uniform_tensor(
            &mut rng,
            shape.clone(),
            params.degree(),
            params.mod_p(),
        );
        let (b_auth, b_encs) = self.authenticate(b_pt.clone()).await?;

        // Cross products a_i * Enc(b_j) for every peer j
        let my_idx = self.compute_index();
        let products = b_encs
            .iter()
            .enumerate()
            .map(|(j, c)| (j != my_idx).then(|| c.mul_eval(&a_hom)))
            .collect();
        let own = &a_pt * &b_pt;
        let c_share = self.exchange_masked_products(products, own).await?;
        let (c_auth, _) = self.authenticate(c_share).await?;

        Ok(AuthTriple { a: a_auth, b: b_auth, c: c_auth })
    }

    /// Generate a batch of triples and store them for the online phase
    pub async fn generate_triples(
        &mut self,
        count: usize,
        shape: &Shape,
    ) -> Result<(), PreprocessError> {
        self.triples.reserve(count);
        for _ in 0..count {
            let triple = self.generate_triple(shape).await?;
            self.triples.push(triple);
        }
        Ok(())
    }

    /// Take the next unconsumed triple
    pub(crate) fn next_triple(&mut self) -> AuthTriple {
        self.triples.pop().expect("triple supply exhausted")
    }
}

#[cfg(test)]
mod tests {
    use lattice_he::tensor::Shape;

    use crate::test_helpers::mock_engines;

    /// Opened triples satisfy `a * b = c`
    #[tokio::test]
    async fn test_triple_identity() {
        let results = mock_engines(2, |mut engine| async move {
            let shape = Shape::new(vec![1, engine.params().zk_cols()]);
            let triple = engine.generate_triple(&shape).await.unwrap();

            engine
                .open_and_check(&[triple.a, triple.b, triple.c])
                .await
                .unwrap()
        })
        .await;

        for opened in results {
            let (a, b, c) = (&opened[0], &opened[1], &opened[2]);
            assert_eq!(&(a * b), c);
        }
    }
}
