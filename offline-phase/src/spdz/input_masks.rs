//! Authenticated input masks
//!
//! For every input party the quorum holds an authenticated mask `<r>`;
//! the mask shares go to the input party in the clear, the tag shares go
//! sealed under a per-(server, client) cipher that is opened only at
//! verification time. The input party reconstructs `r`, masks its input
//! with it, and later checks the opened tags against `alpha * r`.

use lattice_he::{
    prg,
    tensor::{Eval, RingTensor, Shape},
};
use mpc_core::{cipher::Cipher, network::MeshNetwork, PartyId};
use rand::rngs::OsRng;

use crate::{error::PreprocessError, structs::InputMask};

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// Generate an authenticated mask for one input party and deliver
    /// the share and sealed tag share to them
    pub async fn deliver_input_mask(
        &mut self,
        input_party: PartyId,
        shape: &Shape,
    ) -> Result<InputMask, PreprocessError> {
        let params = self.cfg.params.clone();
        let mut rng = OsRng;

        let share: RingTensor<Eval> = prg::uniform_tensor(
            &mut rng,
            shape.clone(),
            params.degree(),
            params.mod_p(),
        );
        let (auth, _) = self.authenticate(share).await?;

        let cipher = Cipher::random(&mut rng);
        let sealed = cipher.seal(&auth.mac.to_le_bytes())?;

        self.net
            .gather(&self.cfg.compute_parties, input_party, Some(auth.share.clone()))
            .await?;
        self.net.gather(&self.cfg.compute_parties, input_party, Some(sealed)).await?;

        Ok(InputMask { auth, cipher })
    }

    /// Open the cipher sealing a mask's tag shares to its input party
    pub async fn open_mask_cipher(
        &mut self,
        input_party: PartyId,
        mask: &InputMask,
    ) -> Result<(), PreprocessError> {
        self.net
            .gather(&self.cfg.compute_parties, input_party, Some(mask.cipher.to_bytes()))
            .await?;
        Ok(())
    }
}
