//! Transfer types: one logical application message on its way through the
//! engine.
//!
//! A transfer exists in one of two concrete shapes. [`ReassemblyTransfer`]
//! is the receiver side: preallocated slots filled as fragments arrive.
//! [`EmissionTransfer`] is the sender side: one contiguous payload sliced
//! into fragments on demand. [`TransferMetadata`] is the small surface the
//! two shapes share, and [`ReceivedTransfer`] is the explicit conversion of
//! a completed reassembly into a deliverable payload.

mod emission;
mod reassembly;

use bytes::Bytes;

pub use emission::EmissionTransfer;
pub use reassembly::ReassemblyTransfer;

use crate::{
    id::TransferId,
    link::{InterfaceId, PeerAddress},
};

/// Identity and addressing of a transfer, shared by both transfer shapes.
///
/// This is also the value delivered by the acknowledgement event: once the
/// peer confirms reception the payload itself is no longer of interest,
/// only which transfer completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferMetadata {
    /// Interface the transfer belongs to.
    pub interface: InterfaceId,
    /// Transfer identifier, unique per peer and direction.
    pub id: TransferId,
    /// Identifier of the previous transfer exchanged with the same peer.
    pub prev_id: TransferId,
    /// Address the transfer originates from.
    pub source: PeerAddress,
    /// Address the transfer is directed at.
    pub destination: PeerAddress,
}

/// A fully reassembled transfer surfaced to the application.
///
/// Produced only by [`ReassemblyTransfer::into_received`], so holding one
/// is proof that every fragment arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedTransfer {
    metadata: TransferMetadata,
    payload: Bytes,
}

impl ReceivedTransfer {
    pub(crate) fn new(metadata: TransferMetadata, payload: Bytes) -> Self {
        Self { metadata, payload }
    }

    /// Identity and addressing of the completed transfer.
    #[must_use]
    pub const fn metadata(&self) -> TransferMetadata { self.metadata }

    /// Borrow the reassembled payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.payload.as_ref() }

    /// Consume the transfer, returning the owned payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}
