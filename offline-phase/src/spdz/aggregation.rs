//! The secure-aggregation online phase
//!
//! Input parties mask their private inputs with authenticated masks held
//! by the quorum, and broadcast only the difference. The quorum
//! aggregates the authenticated input shares, opens the result to every
//! party, and runs the batched MAC check. The MAC key shares and the
//! tag ciphers are opened afterwards so that each input party can verify
//! that the mask it used was honestly tagged.

use std::time::Instant;

use itertools::izip;
use lattice_he::tensor::{Eval, RingTensor, Shape};
use mpc_core::{
    cipher::Cipher,
    config::MpcConfig,
    network::{MeshNetwork, NetQueue},
    share::{reconstruct, AuthTensor},
    PartyId,
};

use crate::error::PreprocessError;

use super::SpdzEngine;

impl<N: MeshNetwork> SpdzEngine<N> {
    /// The compute-party side of an aggregation run
    ///
    /// Returns the reconstructed aggregate after the MAC check passed.
    pub async fn run_aggregation(&mut self, shape: &Shape) -> Result<RingTensor<Eval>, PreprocessError> {
        let input_parties = self.cfg.input_parties.clone();
        if input_parties.is_empty() {
            return Err(PreprocessError::ConfigInvalid("no input parties to aggregate".into()));
        }
        self.ready().await?;
        let start = Instant::now();

        // Offline: one authenticated mask per input party
        let mut masks = Vec::with_capacity(input_parties.len());
        for &client in input_parties.parties() {
            masks.push(self.deliver_input_mask(client, shape).await?);
        }
        tracing::info!(party = self.cfg.self_id, elapsed = ?start.elapsed(), "input masks delivered");

        // Online: receive masked inputs, assemble authenticated shares
        let designated = self.is_designated();
        let mut output: Option<AuthTensor> = None;
        for (mask, &client) in izip!(&masks, input_parties.parties()) {
            let masked: RingTensor<Eval> =
                self.net.broadcast(&self.cfg.compute_parties, client, None).await?;
            let x = mask.auth.add_public(&masked, self.mac_share, designated);
            output = Some(match output {
                Some(acc) => &acc + &x,
                None => x,
            });
        }
        let output = output.expect("at least one input party");
        tracing::info!(party = self.cfg.self_id, elapsed = ?start.elapsed(), "aggregate computed");

        // Open the aggregate to every party, then check the opening
        let all = self.cfg.all_parties();
        let shares: Vec<RingTensor<Eval>> = self
            .net
            .all_gather_to(&self.cfg.compute_parties, &all, Some(output.share.clone()))
            .await?;
        let value = reconstruct(&shares);
        self.mac_check(&[value.clone()], &[output.mac.clone()]).await?;
        tracing::info!(party = self.cfg.self_id, elapsed = ?start.elapsed(), "MAC check passed");

        // Open the MAC key shares and tag ciphers for input verification
        let _alphas: Vec<u64> = self
            .net
            .all_gather_to(&self.cfg.compute_parties, &all, Some(self.mac_share))
            .await?;
        for (mask, &client) in izip!(&masks, input_parties.parties()) {
            self.open_mask_cipher(client, mask).await?;
        }

        self.log_stats();
        Ok(value)
    }
}

/// The input-party driver of an aggregation run
pub struct InputClient<N: MeshNetwork> {
    /// The runtime configuration
    cfg: MpcConfig,
    /// Collectives over the transport
    net: NetQueue<N>,
}

impl<N: MeshNetwork> InputClient<N> {
    /// Build the driver for an input party
    pub fn new(cfg: MpcConfig, net: N) -> Result<Self, PreprocessError> {
        cfg.validate()?;
        if !cfg.is_input() {
            return Err(PreprocessError::ConfigInvalid(format!(
                "party {} is not an input party",
                cfg.self_id
            )));
        }
        Ok(Self { cfg, net: NetQueue::new(net) })
    }

    /// The id of the local party
    pub fn party_id(&self) -> PartyId {
        self.cfg.self_id
    }

    /// Contribute a private input to an aggregation run
    ///
    /// Returns the reconstructed aggregate and the input-check bit: true
    /// iff the opened tag shares of the mask reconstruct to `alpha * r`.
    pub async fn run(
        &mut self,
        input: &RingTensor<Eval>,
    ) -> Result<(RingTensor<Eval>, bool), PreprocessError> {
        let me = self.cfg.self_id;
        let params = self.cfg.params.clone();
        let compute = self.cfg.compute_parties.clone();
        let all = self.cfg.all_parties();
        self.net.barrier(&all).await?;

        // Mask delivery: shares in the clear, tag shares sealed
        let shares: Vec<RingTensor<Eval>> =
            self.net.gather(&compute, me, None).await?.expect("mask receiver");
        let sealed_tags: Vec<Vec<u8>> =
            self.net.gather(&compute, me, None).await?.expect("mask receiver");
        let mask = reconstruct(&shares);

        // Mask the input; only the difference crosses the wire
        let masked = input - &mask;
        self.net.broadcast(&compute, me, Some(masked)).await?;

        // Output opening
        let output_shares: Vec<RingTensor<Eval>> =
            self.net.all_gather_to(&compute, &all, None).await?;
        let value = reconstruct(&output_shares);

        // Verification: the MAC key and the tag ciphers are opened now
        let alphas: Vec<u64> = self.net.all_gather_to(&compute, &all, None).await?;
        let p = params.mod_p();
        let alpha = alphas.iter().fold(0, |acc, &a| p.add(acc, a));

        let cipher_blobs: Vec<Vec<u8>> =
            self.net.gather(&compute, me, None).await?.expect("cipher receiver");
        let mut tag_sum =
            RingTensor::<Eval>::zeros(input.shape().clone(), params.degree(), p);
        for (blob, sealed) in izip!(&cipher_blobs, &sealed_tags) {
            let cipher = Cipher::from_bytes(blob)?;
            let bytes = cipher.open(sealed)?;
            let tag = RingTensor::<Eval>::from_le_bytes(
                input.shape().clone(),
                params.degree(),
                p,
                &bytes,
            )
            .ok_or_else(|| PreprocessError::Transport("tag share size mismatch".into()))?;
            tag_sum = &tag_sum + &tag;
        }

        let accepted = tag_sum == mask.scalar_mul(alpha);
        tracing::info!(party = me, accepted, "input mask tag check");
        tracing::info!(party = me, stats = %self.net.stats(), "network statistics");
        Ok((value, accepted))
    }
}
