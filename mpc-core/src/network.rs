//! Network abstractions and round-synchronous collectives
//!
//! The transport is a point-to-point mesh: [`MeshNetwork`] sends and
//! receives typed payloads between pairs of parties with per-peer,
//! per-direction ordering. [`NetQueue`] builds the protocol's
//! collectives on top — gather, broadcast, all-gather, all-to-all, and
//! the readiness barrier — all of which are synchronization points that
//! every involved party must enter in the same order.
//!
//! Payloads cross the wire in canonical form: coefficient representation
//! for plaintext-domain tensors, evaluation (NTT) representation for
//! ciphertexts, little-endian limbs throughout.

pub mod mock;

use async_trait::async_trait;
use lattice_he::{
    bgv::{Ciphertext, PublicKey},
    prg::PrgKey,
    tensor::{Coeff, Eval, RingTensor},
    zk::PlaintextProof,
};
use serde::{Deserialize, Serialize};

use crate::{error::CoreError, PartyId};

// -----------------
// | Communicators |
// -----------------

/// An ordered set of parties participating in a collective
///
/// The order is protocol-relevant: gathered tuples are indexed by a
/// sender's position in the communicator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communicator(Vec<PartyId>);

impl Communicator {
    /// Create a communicator from an ordered list of distinct parties
    pub fn new(parties: Vec<PartyId>) -> Self {
        for (i, p) in parties.iter().enumerate() {
            assert!(!parties[..i].contains(p), "communicator parties must be distinct");
        }
        Self(parties)
    }

    /// The number of parties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the communicator is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The parties in order
    pub fn parties(&self) -> &[PartyId] {
        &self.0
    }

    /// The party at a position
    pub fn get(&self, index: usize) -> PartyId {
        self.0[index]
    }

    /// Whether a party is a member
    pub fn contains(&self, party: PartyId) -> bool {
        self.0.contains(&party)
    }

    /// The position of a party, if a member
    pub fn index_of(&self, party: PartyId) -> Option<usize> {
        self.0.iter().position(|&p| p == party)
    }

    /// This communicator followed by another
    pub fn append(&self, other: &Communicator) -> Communicator {
        let mut parties = self.0.clone();
        for &p in &other.0 {
            if !parties.contains(&p) {
                parties.push(p);
            }
        }
        Communicator(parties)
    }
}

// ------------
// | Payloads |
// ------------

/// A typed payload crossing the wire
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NetworkPayload {
    /// A readiness or check bit
    Bit(bool),
    /// A single residue
    Scalar(u64),
    /// A batch of residues
    ScalarBatch(Vec<u64>),
    /// An opaque byte blob (AEAD payloads)
    Bytes(Vec<u8>),
    /// A PRF/PRG key opened for verification
    Key(PrgKey),
    /// A public encryption key
    PublicKey(PublicKey),
    /// A plaintext-domain tensor
    Plaintext(RingTensor<Eval>),
    /// A coefficient-domain tensor
    CoeffTensor(RingTensor<Coeff>),
    /// A ciphertext batch
    Ciphertext(Ciphertext),
    /// A plaintext-knowledge proof
    Proof(PlaintextProof),
}

macro_rules! impl_payload_conversions {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for NetworkPayload {
            fn from(value: $ty) -> Self {
                NetworkPayload::$variant(value)
            }
        }

        impl TryFrom<NetworkPayload> for $ty {
            type Error = CoreError;

            fn try_from(payload: NetworkPayload) -> Result<Self, Self::Error> {
                match payload {
                    NetworkPayload::$variant(value) => Ok(value),
                    other => Err(CoreError::UnexpectedMessage(format!(
                        "expected {}, got {other:?}",
                        stringify!($variant),
                    ))),
                }
            }
        }
    };
}

impl_payload_conversions!(Bit, bool);
impl_payload_conversions!(Scalar, u64);
impl_payload_conversions!(ScalarBatch, Vec<u64>);
impl_payload_conversions!(Bytes, Vec<u8>);
impl_payload_conversions!(Key, PrgKey);
impl_payload_conversions!(PublicKey, PublicKey);
impl_payload_conversions!(Plaintext, RingTensor<Eval>);
impl_payload_conversions!(CoeffTensor, RingTensor<Coeff>);
impl_payload_conversions!(Ciphertext, Ciphertext);
impl_payload_conversions!(Proof, PlaintextProof);

// -------------
// | Transport |
// -------------

/// Counters of a transport's traffic
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetStats {
    /// Messages sent by this party
    pub messages_sent: u64,
    /// Messages received by this party
    pub messages_received: u64,
}

impl std::fmt::Display for NetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sent {} messages, received {}", self.messages_sent, self.messages_received)
    }
}

/// A point-to-point transport between a fixed set of parties
///
/// Implementations must preserve per-peer ordering and byte-exact
/// payloads; a failed send or receive is fatal for the run.
#[async_trait]
pub trait MeshNetwork: Send {
    /// The id of the local party
    fn party_id(&self) -> PartyId;

    /// Send a payload to a peer
    async fn send(&mut self, to: PartyId, payload: NetworkPayload) -> Result<(), CoreError>;

    /// Receive the next payload from a peer, suspending until it arrives
    async fn recv(&mut self, from: PartyId) -> Result<NetworkPayload, CoreError>;

    /// Tear down the connection
    async fn close(&mut self) -> Result<(), CoreError>;

    /// Traffic counters
    fn stats(&self) -> NetStats;
}

// ---------------
// | Collectives |
// ---------------

/// Round-synchronous collectives over a mesh transport
///
/// Each collective iterates the communicator in index order, sending
/// before receiving, so the unbuffered round structure cannot deadlock.
pub struct NetQueue<N: MeshNetwork> {
    /// The underlying transport
    net: N,
}

impl<N: MeshNetwork> NetQueue<N> {
    /// Wrap a transport
    pub fn new(net: N) -> Self {
        Self { net }
    }

    /// The id of the local party
    pub fn party_id(&self) -> PartyId {
        self.net.party_id()
    }

    /// Traffic counters of the underlying transport
    pub fn stats(&self) -> NetStats {
        self.net.stats()
    }

    /// Tear down the underlying transport
    pub async fn close(&mut self) -> Result<(), CoreError> {
        self.net.close().await
    }

    /// Send a typed value to a peer
    pub async fn send_to<T: Into<NetworkPayload>>(
        &mut self,
        to: PartyId,
        value: T,
    ) -> Result<(), CoreError> {
        self.net.send(to, value.into()).await
    }

    /// Receive a typed value from a peer
    pub async fn recv_from<T>(&mut self, from: PartyId) -> Result<T, CoreError>
    where
        T: TryFrom<NetworkPayload, Error = CoreError>,
    {
        self.net.recv(from).await?.try_into()
    }

    /// Every member of `group` contributes a value; every member receives
    /// the tuple indexed by sender position
    pub async fn all_gather<T>(&mut self, group: &Communicator, value: T) -> Result<Vec<T>, CoreError>
    where
        T: Clone + Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        self.all_gather_to(group, group, Some(value)).await
    }

    /// Members of `from` contribute; members of `from` and `to` receive
    ///
    /// The local party must belong to at least one of the communicators;
    /// contributors pass `Some(value)`.
    pub async fn all_gather_to<T>(
        &mut self,
        from: &Communicator,
        to: &Communicator,
        value: Option<T>,
    ) -> Result<Vec<T>, CoreError>
    where
        T: Clone + Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        let me = self.party_id();
        let sender_idx = from.index_of(me);
        if sender_idx.is_none() && !to.contains(me) {
            return Err(CoreError::Transport(format!(
                "party {me} is not part of this all-gather"
            )));
        }

        if sender_idx.is_some() {
            let value = value.as_ref().ok_or_else(|| {
                CoreError::Transport("all-gather contributor needs a value".into())
            })?;
            for &peer in from.append(to).parties() {
                if peer != me {
                    self.net.send(peer, value.clone().into()).await?;
                }
            }
        }

        let mut out = Vec::with_capacity(from.len());
        for &peer in from.parties() {
            if peer == me {
                let own = value.clone().ok_or_else(|| {
                    CoreError::Transport("all-gather contributor needs a value".into())
                })?;
                out.push(own);
            } else {
                out.push(self.recv_from(peer).await?);
            }
        }
        Ok(out)
    }

    /// A sender distributes one value to every member of `group`
    ///
    /// The sender need not be a member. Returns the distributed value on
    /// every participant.
    pub async fn broadcast<T>(
        &mut self,
        group: &Communicator,
        sender: PartyId,
        value: Option<T>,
    ) -> Result<T, CoreError>
    where
        T: Clone + Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        let me = self.party_id();
        if me == sender {
            let value = value
                .ok_or_else(|| CoreError::Transport("broadcast sender needs a value".into()))?;
            for &peer in group.parties() {
                if peer != me {
                    self.net.send(peer, value.clone().into()).await?;
                }
            }
            Ok(value)
        } else if group.contains(me) {
            self.recv_from(sender).await
        } else {
            Err(CoreError::Transport(format!("party {me} is not part of this broadcast")))
        }
    }

    /// Every member of `from` sends a value to a single receiver
    ///
    /// The receiver obtains the tuple indexed by sender position (its
    /// own value in place if it is also a contributor); contributors get
    /// `None` back.
    pub async fn gather<T>(
        &mut self,
        from: &Communicator,
        to: PartyId,
        value: Option<T>,
    ) -> Result<Option<Vec<T>>, CoreError>
    where
        T: Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        let me = self.party_id();
        if me == to {
            let mut out = Vec::with_capacity(from.len());
            let mut own = value;
            for &peer in from.parties() {
                if peer == me {
                    let v = own.take().ok_or_else(|| {
                        CoreError::Transport("gather contributor needs a value".into())
                    })?;
                    out.push(v);
                } else {
                    out.push(self.recv_from(peer).await?);
                }
            }
            Ok(Some(out))
        } else if from.contains(me) {
            let value = value
                .ok_or_else(|| CoreError::Transport("gather contributor needs a value".into()))?;
            self.net.send(to, value.into()).await?;
            Ok(None)
        } else {
            Err(CoreError::Transport(format!("party {me} is not part of this gather")))
        }
    }

    /// A sender distributes one value per member of `group`
    ///
    /// Member `j` receives the `j`-th element of the sender's tuple; the
    /// sender keeps its own element if it is a member, and gets `None`
    /// back otherwise.
    pub async fn scatter<T>(
        &mut self,
        group: &Communicator,
        sender: PartyId,
        values: Option<Vec<T>>,
    ) -> Result<Option<T>, CoreError>
    where
        T: Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        let me = self.party_id();
        if me == sender {
            let values = values
                .ok_or_else(|| CoreError::Transport("scatter sender needs values".into()))?;
            if values.len() != group.len() {
                return Err(CoreError::Transport(format!(
                    "scatter needs {} values, got {}",
                    group.len(),
                    values.len()
                )));
            }
            let mut own = None;
            for (i, v) in values.into_iter().enumerate() {
                if group.get(i) == me {
                    own = Some(v);
                } else {
                    self.net.send(group.get(i), v.into()).await?;
                }
            }
            Ok(own)
        } else if group.contains(me) {
            Ok(Some(self.recv_from(sender).await?))
        } else {
            Err(CoreError::Transport(format!("party {me} is not part of this scatter")))
        }
    }

    /// Party `i` sends the `j`-th element of its tuple to party `j` and
    /// receives the tuple indexed by sender
    ///
    /// Ownership of the input values moves into the transport; the slot
    /// addressed to the local party is carried over directly.
    pub async fn all_to_all<T>(&mut self, group: &Communicator, values: Vec<T>) -> Result<Vec<T>, CoreError>
    where
        T: Into<NetworkPayload> + TryFrom<NetworkPayload, Error = CoreError>,
    {
        let me = self.party_id();
        let my_idx = group.index_of(me).ok_or_else(|| {
            CoreError::Transport(format!("party {me} is not part of this all-to-all"))
        })?;
        if values.len() != group.len() {
            return Err(CoreError::Transport(format!(
                "all-to-all needs {} values, got {}",
                group.len(),
                values.len()
            )));
        }

        let mut own = None;
        for (i, v) in values.into_iter().enumerate() {
            if i == my_idx {
                own = Some(v);
            } else {
                self.net.send(group.get(i), v.into()).await?;
            }
        }

        let mut out = Vec::with_capacity(group.len());
        for (i, &peer) in group.parties().iter().enumerate() {
            if i == my_idx {
                out.push(own.take().expect("own all-to-all slot"));
            } else {
                out.push(self.recv_from(peer).await?);
            }
        }
        Ok(out)
    }

    /// The readiness barrier: every member all-gathers a ready bit
    ///
    /// Dampens startup skew; required before any timed region.
    pub async fn barrier(&mut self, group: &Communicator) -> Result<(), CoreError> {
        let bits = self.all_gather(group, true).await?;
        if bits.iter().all(|&b| b) {
            tracing::debug!(party = self.party_id(), peers = group.len(), "barrier complete");
            Ok(())
        } else {
            Err(CoreError::Transport("peer reported not ready".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{mock::MockMesh, *};

    fn spawn_parties<F, Fut, T>(ids: &[PartyId], f: F) -> Vec<tokio::task::JoinHandle<T>>
    where
        F: Fn(NetQueue<MockMesh>) -> Fut,
        Fut: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        MockMesh::mesh(ids).into_iter().map(|net| tokio::spawn(f(NetQueue::new(net)))).collect()
    }

    #[tokio::test]
    async fn test_all_gather_ordering() {
        let group = Communicator::new(vec![0, 1, 2]);
        let handles = spawn_parties(&[0, 1, 2], |mut queue| {
            let group = group.clone();
            async move {
                let id = queue.party_id();
                queue.all_gather(&group, id * 10).await.unwrap()
            }
        });

        for h in handles {
            assert_eq!(h.await.unwrap(), vec![0, 10, 20]);
        }
    }

    #[tokio::test]
    async fn test_broadcast_from_outsider() {
        let group = Communicator::new(vec![0, 1]);
        let handles = spawn_parties(&[0, 1, 2], |mut queue| {
            let group = group.clone();
            async move {
                let id = queue.party_id();
                let value = (id == 2).then_some(7u64);
                queue.broadcast(&group, 2, value).await.unwrap()
            }
        });

        for h in handles {
            assert_eq!(h.await.unwrap(), 7);
        }
    }

    #[tokio::test]
    async fn test_gather_to_individual() {
        let group = Communicator::new(vec![0, 1, 2]);
        let handles = spawn_parties(&[0, 1, 2], |mut queue| {
            let group = group.clone();
            async move {
                let id = queue.party_id();
                queue.gather(&group, 1, Some(vec![id; 2])).await.unwrap()
            }
        });

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert_eq!(results[0], None);
        assert_eq!(results[1], Some(vec![vec![0, 0], vec![1, 1], vec![2, 2]]));
        assert_eq!(results[2], None);
    }

    #[tokio::test]
    async fn test_scatter_per_receiver_values() {
        let group = Communicator::new(vec![0, 1, 2]);
        let handles = spawn_parties(&[0, 1, 2], |mut queue| {
            let group = group.clone();
            async move {
                let id = queue.party_id();
                let values = (id == 0).then(|| vec![10u64, 11, 12]);
                queue.scatter(&group, 0, values).await.unwrap()
            }
        });

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert_eq!(results, vec![Some(10), Some(11), Some(12)]);
    }

    #[tokio::test]
    async fn test_all_to_all_transpose() {
        let group = Communicator::new(vec![0, 1, 2]);
        let handles = spawn_parties(&[0, 1, 2], |mut queue| {
            let group = group.clone();
            async move {
                let id = queue.party_id();
                // Party i sends i * 10 + j to party j
                let values: Vec<u64> = (0..3).map(|j| id * 10 + j).collect();
                queue.all_to_all(&group, values).await.unwrap()
            }
        });

        for (i, h) in handles.into_iter().enumerate() {
            let received = h.await.unwrap();
            let expected: Vec<u64> = (0..3).map(|j| j * 10 + i as u64).collect();
            assert_eq!(received, expected);
        }
    }

    #[tokio::test]
    async fn test_barrier_and_stats() {
        let group = Communicator::new(vec![0, 1]);
        let handles = spawn_parties(&[0, 1], |mut queue| {
            let group = group.clone();
            async move {
                queue.barrier(&group).await.unwrap();
                queue.stats()
            }
        });

        for h in handles {
            let stats = h.await.unwrap();
            assert_eq!(stats.messages_sent, 1);
            assert_eq!(stats.messages_received, 1);
        }
    }

    #[tokio::test]
    async fn test_typed_recv_rejects_wrong_kind() {
        let handles = spawn_parties(&[0, 1], |mut queue| async move {
            if queue.party_id() == 0 {
                queue.send_to(1, true).await.unwrap();
                Ok(())
            } else {
                queue.recv_from::<u64>(0).await.map(|_| ())
            }
        });

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CoreError::UnexpectedMessage(_))));
    }
}
