//! Receiver-side transfer: ordered slots filled as fragments arrive.

use std::time::Instant;

use bytes::{Bytes, BytesMut};

use crate::{
    error::TransferError,
    header::FragmentHeader,
    index::FragmentIndex,
    link::{Fragment, InterfaceId},
    transfer::{ReceivedTransfer, TransferMetadata},
};

/// A transfer being rebuilt from incoming fragments.
///
/// Slot count and identity come from the first fragment's header; every
/// subsequent assignment is bounds-checked against that shape. Assigning a
/// slot that is already filled is silently idempotent so retransmitted
/// duplicates cannot corrupt the payload.
#[derive(Debug)]
pub struct ReassemblyTransfer {
    metadata: TransferMetadata,
    fragments_total: FragmentIndex,
    slots: Vec<Option<BytesMut>>,
    timestamp_modified: Instant,
}

impl ReassemblyTransfer {
    /// Start a reassembly shaped by the first observed fragment header.
    ///
    /// `fragment` supplies the addresses as seen by the link parser; the
    /// header supplies identity and slot count.
    #[must_use]
    pub fn from_header(
        interface: InterfaceId,
        fragment: &Fragment,
        header: &FragmentHeader,
        now: Instant,
    ) -> Self {
        let fragments_total = header.fragments_total();
        Self {
            metadata: TransferMetadata {
                interface,
                id: header.id(),
                prev_id: header.prev_id(),
                source: fragment.source(),
                destination: fragment.destination(),
            },
            fragments_total,
            slots: (0..fragments_total.get()).map(|_| None).collect(),
            timestamp_modified: now,
        }
    }

    /// Identity and addressing of the transfer.
    #[must_use]
    pub const fn metadata(&self) -> TransferMetadata { self.metadata }

    /// Number of fragments the transfer spans.
    #[must_use]
    pub const fn fragments_count(&self) -> FragmentIndex { self.fragments_total }

    /// Instant of the most recent successful slot assignment.
    #[must_use]
    pub const fn timestamp_modified(&self) -> Instant { self.timestamp_modified }

    /// Whether `fragment` belongs to this transfer: same source and same
    /// destination as the fragment that started it.
    #[must_use]
    pub fn matches(&self, fragment: &Fragment) -> bool {
        fragment.source() == self.metadata.source
            && fragment.destination() == self.metadata.destination
    }

    /// Place `payload` into slot `index`.
    ///
    /// Filling an empty slot advances `timestamp_modified`; re-delivery of
    /// an already-filled slot is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::IndexOutOfRange`] when `index` lies beyond
    /// the slot count declared by the first fragment.
    pub fn assign(
        &mut self,
        index: FragmentIndex,
        payload: BytesMut,
        now: Instant,
    ) -> Result<(), TransferError> {
        let Some(slot) = self.slots.get_mut(index.slot()) else {
            return Err(TransferError::IndexOutOfRange {
                index,
                fragments_total: self.fragments_total,
            });
        };
        if slot.is_none() {
            *slot = Some(payload);
            // max() keeps the modification timestamp monotonic even if the
            // caller's clock readings interleave oddly across entry points.
            self.timestamp_modified = self.timestamp_modified.max(now);
        }
        Ok(())
    }

    /// Whether every slot has been filled.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.slots.iter().all(Option::is_some) }

    /// Lowest fragment index still missing, or `None` once complete.
    #[must_use]
    pub fn missing_fragment(&self) -> Option<FragmentIndex> {
        self.slots
            .iter()
            .position(Option::is_none)
            .and_then(|slot| FragmentIndex::new(slot as u8 + 1))
    }

    /// Convert the completed reassembly into a deliverable payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Incomplete`] naming the lowest missing
    /// fragment when slots remain empty.
    pub fn into_received(self) -> Result<ReceivedTransfer, TransferError> {
        if let Some(missing) = self.missing_fragment() {
            return Err(TransferError::Incomplete { missing });
        }
        let total: usize = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map_or(0, BytesMut::len))
            .sum();
        let mut payload = BytesMut::with_capacity(total);
        for slot in self.slots {
            if let Some(chunk) = slot {
                payload.extend_from_slice(&chunk);
            }
        }
        Ok(ReceivedTransfer::new(self.metadata, Bytes::from(payload)))
    }
}
