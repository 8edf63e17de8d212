//! Online multiplication via the Beaver trick

use lattice_he::tensor::{Eval, RingTensor};
use mpc_core::{network::MeshNetwork, share::AuthTensor};

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Multiply two authenticated tensors using one preprocessed triple
    ///
    /// Opens `u = x - a` and `v = y - b` (with MAC checks), then combines
    /// `<x*y> = <c> + u*<b> + v*<a> + u*v`, the constant term added by
    /// the designated party and the matching MAC term by everyone.
    pub async fn beaver_mul(
        &mut self,
        lhs: &AuthTensor,
        rhs: &AuthTensor,
    ) -> Result<AuthTensor, PreprocessError> {
        assert!(self.num_triples() >= 1, "no triples left for multiplication");
        let triple = self.next_triple();

        let opened = self.open_and_check(&[lhs - &triple.a, rhs - &triple.b]).await?;
        let (u, v): (&RingTensor<Eval>, &RingTensor<Eval>) = (&opened[0], &opened[1]);

        let partial = &(&triple.c + &triple.b.mul_public(u)) + &triple.a.mul_public(v);
        let uv = u * v;
        Ok(partial.add_public(&uv, self.mac_share, self.is_designated()))
    }
}

#[cfg(test)]
mod tests {
    use lattice_he::{prg, tensor::Shape};
    use rand::rngs::OsRng;

    use crate::test_helpers::mock_engines;

    /// Beaver multiplication reproduces the pointwise product
    #[tokio::test]
    async fn test_beaver_mul_matches_product() {
        let results = mock_engines(3, |mut engine| async move {
            let params = engine.params().clone();
            let shape = Shape::new(vec![1, params.zk_cols()]);
            engine.generate_triples(1, &shape).await.unwrap();

            let x = prg::uniform_tensor(&mut OsRng, shape.clone(), params.degree(), params.mod_p());
            let y = prg::uniform_tensor(&mut OsRng, shape, params.degree(), params.mod_p());
            let (x_auth, _) = engine.authenticate(x).await.unwrap();
            let (y_auth, _) = engine.authenticate(y).await.unwrap();

            let product = engine.beaver_mul(&x_auth, &y_auth).await.unwrap();
            engine.open_and_check(&[x_auth, y_auth, product]).await.unwrap()
        })
        .await;

        for opened in results {
            let (x, y, z) = (&opened[0], &opened[1], &opened[2]);
            assert_eq!(&(x * y), z);
        }
    }
}
