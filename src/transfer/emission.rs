//! Sender-side transfer: a contiguous payload sliced into fragments on
//! demand.

use std::num::NonZeroUsize;

use bytes::Bytes;

use crate::{
    error::{TransferError, TransmitError},
    id::TransferId,
    index::FragmentIndex,
    link::{Fragment, InterfaceId, PeerAddress},
    transfer::TransferMetadata,
};

/// A transfer being split into outgoing fragments.
///
/// The payload is kept whole; [`fragment_payload`](Self::fragment_payload)
/// materialises any slice on demand, which keeps retransmission free of
/// per-fragment buffering. An empty payload still occupies one fragment so
/// every transfer is representable on the wire.
#[derive(Debug)]
pub struct EmissionTransfer {
    metadata: TransferMetadata,
    payload: Bytes,
    max_fragment_size: NonZeroUsize,
    fragments_total: FragmentIndex,
}

impl EmissionTransfer {
    /// Build a transfer owning `payload`, destined for `destination`.
    ///
    /// `max_fragment_size` is captured here so fragment extraction stays
    /// consistent for the transfer's whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::PayloadTooLarge`] when the payload needs
    /// more fragments than the 8-bit wire index can address.
    pub fn new(
        interface: InterfaceId,
        destination: PeerAddress,
        payload: Bytes,
        id: TransferId,
        prev_id: TransferId,
        max_fragment_size: NonZeroUsize,
    ) -> Result<Self, TransmitError> {
        let count = payload.len().div_ceil(max_fragment_size.get()).max(1);
        let fragments_total = u8::try_from(count)
            .ok()
            .and_then(FragmentIndex::new)
            .ok_or(TransmitError::PayloadTooLarge {
                destination,
                len: payload.len(),
                max: max_fragment_size.get() * usize::from(FragmentIndex::MAX.get()),
            })?;
        Ok(Self {
            metadata: TransferMetadata {
                interface,
                id,
                prev_id,
                source: PeerAddress::UNSPECIFIED,
                destination,
            },
            payload,
            max_fragment_size,
            fragments_total,
        })
    }

    /// Identity and addressing of the transfer.
    #[must_use]
    pub const fn metadata(&self) -> TransferMetadata { self.metadata }

    /// Transfer identifier.
    #[must_use]
    pub const fn id(&self) -> TransferId { self.metadata.id }

    /// Identifier of the previous transfer to the same peer.
    #[must_use]
    pub const fn prev_id(&self) -> TransferId { self.metadata.prev_id }

    /// Peer the transfer is directed at.
    #[must_use]
    pub const fn destination(&self) -> PeerAddress { self.metadata.destination }

    /// Number of fragments needed to carry the payload.
    #[must_use]
    pub const fn fragments_count(&self) -> FragmentIndex { self.fragments_total }

    /// Whether `fragment` answers this transfer: REQ and ACK frames travel
    /// the reverse direction, so the fragment's source must be the peer we
    /// transmitted to.
    #[must_use]
    pub fn matches_response(&self, fragment: &Fragment) -> bool {
        fragment.source() == self.metadata.destination
    }

    /// Payload slice carried by fragment `index`: bytes
    /// `(index - 1) * max_fragment_size ..` up to `max_fragment_size` long.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::IndexOutOfRange`] when `index` exceeds
    /// [`fragments_count`](Self::fragments_count).
    pub fn fragment_payload(&self, index: FragmentIndex) -> Result<Bytes, TransferError> {
        if index > self.fragments_total {
            return Err(TransferError::IndexOutOfRange {
                index,
                fragments_total: self.fragments_total,
            });
        }
        let offset = index.slot() * self.max_fragment_size.get();
        let end = (offset + self.max_fragment_size.get()).min(self.payload.len());
        Ok(self.payload.slice(offset..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(value: u8) -> FragmentIndex { FragmentIndex::new(value).expect("non-zero index") }

    fn transfer_with(payload: &'static [u8], max: usize) -> EmissionTransfer {
        EmissionTransfer::new(
            InterfaceId::new(0),
            PeerAddress::new(3),
            Bytes::from_static(payload),
            TransferId::new(5),
            TransferId::new(4),
            NonZeroUsize::new(max).expect("non-zero fragment size"),
        )
        .expect("payload within addressable range")
    }

    #[test]
    fn slices_payload_into_bounded_fragments() {
        let transfer = transfer_with(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 4);

        assert_eq!(transfer.fragments_count(), index(3));
        assert_eq!(
            transfer.fragment_payload(index(1)).expect("fragment 1").as_ref(),
            &[1, 2, 3, 4]
        );
        assert_eq!(
            transfer.fragment_payload(index(2)).expect("fragment 2").as_ref(),
            &[5, 6, 7, 8]
        );
        assert_eq!(
            transfer.fragment_payload(index(3)).expect("fragment 3").as_ref(),
            &[9, 10]
        );
    }

    #[test]
    fn empty_payload_still_occupies_one_fragment() {
        let transfer = transfer_with(&[], 8);
        assert_eq!(transfer.fragments_count(), index(1));
        assert!(
            transfer
                .fragment_payload(index(1))
                .expect("fragment 1")
                .is_empty()
        );
    }

    #[test]
    fn rejects_indices_beyond_the_payload() {
        let transfer = transfer_with(&[1, 2, 3], 2);
        assert_eq!(transfer.fragments_count(), index(2));
        assert_eq!(
            transfer.fragment_payload(index(3)),
            Err(TransferError::IndexOutOfRange {
                index: index(3),
                fragments_total: index(2),
            })
        );
    }

    #[test]
    fn oversized_payload_is_rejected_up_front() {
        let payload = Bytes::from(vec![0_u8; 2 * 255 + 1]);
        let err = EmissionTransfer::new(
            InterfaceId::new(0),
            PeerAddress::new(3),
            payload,
            TransferId::new(5),
            TransferId::NONE,
            NonZeroUsize::new(2).expect("non-zero"),
        )
        .expect_err("payload needs more than 255 fragments");
        assert_eq!(
            err,
            TransmitError::PayloadTooLarge {
                destination: PeerAddress::new(3),
                len: 511,
                max: 510,
            }
        );
    }

    #[test]
    fn responses_match_on_the_reverse_direction() {
        let transfer = transfer_with(&[1], 4);
        let from_peer = Fragment::new(
            PeerAddress::new(3),
            PeerAddress::new(1),
            bytes::BytesMut::new(),
        );
        let from_other = Fragment::new(
            PeerAddress::new(8),
            PeerAddress::new(1),
            bytes::BytesMut::new(),
        );
        assert!(transfer.matches_response(&from_peer));
        assert!(!transfer.matches_response(&from_other));
    }
}
