//! Fixed-size wire header carried by every on-link fragment.
//!
//! The header occupies the first [`HEADER_SIZE`] bytes of each fragment:
//! `{kind: u8, fragment: u8, fragments_total: u8, id: u16, prev_id: u16}`,
//! integers big-endian. Both ends of a link must agree on this layout; the
//! link layer has already verified payload integrity with its own checksum,
//! so parse failures are treated as noise and dropped.

use bytes::{Buf, BufMut, BytesMut};

use crate::{error::HeaderError, id::TransferId, index::FragmentIndex};

/// Encoded size of a [`FragmentHeader`] in bytes.
pub const HEADER_SIZE: usize = 7;

/// Discriminates the three frame types of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Carries one payload slice of a transfer.
    Fragment = 1,
    /// Confirms end-to-end reception of a whole transfer.
    FragmentAck = 2,
    /// Requests selective retransmission of one fragment.
    FragmentReq = 3,
}

impl FrameKind {
    /// Map a wire code to a frame kind.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Fragment),
            2 => Some(Self::FragmentAck),
            3 => Some(Self::FragmentReq),
            _ => None,
        }
    }

    /// Wire code of this frame kind.
    #[must_use]
    pub const fn code(self) -> u8 { self as u8 }
}

/// Per-fragment control header.
///
/// `fragment` is the one-based position of the carried payload slice,
/// `fragments_total` the number of slices in the whole transfer. For ACK
/// frames `fragment` echoes the acknowledged transfer's fragment count; for
/// REQ frames it names the index being chased.
///
/// # Examples
///
/// ```
/// use fraglink::{FragmentHeader, FrameKind, FragmentIndex, TransferId, HEADER_SIZE};
///
/// let header = FragmentHeader::new(
///     FrameKind::Fragment,
///     FragmentIndex::new(2).expect("non-zero"),
///     FragmentIndex::new(3).expect("non-zero"),
///     TransferId::new(17),
///     TransferId::new(16),
/// );
/// let mut wire = bytes::BytesMut::new();
/// header.encode_into(&mut wire);
/// assert_eq!(wire.len(), HEADER_SIZE);
/// assert_eq!(FragmentHeader::parse(&wire), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragmentHeader {
    kind: FrameKind,
    fragment: FragmentIndex,
    fragments_total: FragmentIndex,
    id: TransferId,
    prev_id: TransferId,
}

impl FragmentHeader {
    /// Create a new header.
    #[must_use]
    pub const fn new(
        kind: FrameKind,
        fragment: FragmentIndex,
        fragments_total: FragmentIndex,
        id: TransferId,
        prev_id: TransferId,
    ) -> Self {
        Self {
            kind,
            fragment,
            fragments_total,
            id,
            prev_id,
        }
    }

    /// Frame kind carried by this header.
    #[must_use]
    pub const fn kind(&self) -> FrameKind { self.kind }

    /// One-based index of the fragment within its transfer.
    #[must_use]
    pub const fn fragment(&self) -> FragmentIndex { self.fragment }

    /// Total fragment count of the transfer.
    #[must_use]
    pub const fn fragments_total(&self) -> FragmentIndex { self.fragments_total }

    /// Transfer identifier.
    #[must_use]
    pub const fn id(&self) -> TransferId { self.id }

    /// Identifier of the previous transfer to the same peer.
    #[must_use]
    pub const fn prev_id(&self) -> TransferId { self.prev_id }

    /// Range check on the index fields.
    ///
    /// The constructors make a zero index unrepresentable, so this reduces
    /// to `fragment <= fragments_total`. [`parse`](Self::parse) rejects
    /// headers that fail it.
    #[must_use]
    pub const fn is_valid(&self) -> bool { self.fragment.get() <= self.fragments_total.get() }

    /// Parse a header from the front of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::Truncated`] when fewer than [`HEADER_SIZE`]
    /// bytes are available, [`HeaderError::UnknownKind`] for an
    /// unrecognised kind code, and [`HeaderError::InvalidCounts`] when the
    /// index fields fail validation.
    pub fn parse(data: &[u8]) -> Result<Self, HeaderError> {
        if data.len() < HEADER_SIZE {
            return Err(HeaderError::Truncated {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let code = buf.get_u8();
        let kind = FrameKind::from_code(code).ok_or(HeaderError::UnknownKind { code })?;
        let raw_fragment = buf.get_u8();
        let raw_total = buf.get_u8();
        let id = TransferId::new(buf.get_u16());
        let prev_id = TransferId::new(buf.get_u16());

        let invalid = HeaderError::InvalidCounts {
            fragment: raw_fragment,
            fragments_total: raw_total,
        };
        let fragment = FragmentIndex::new(raw_fragment).ok_or(invalid)?;
        let fragments_total = FragmentIndex::new(raw_total).ok_or(invalid)?;

        let header = Self::new(kind, fragment, fragments_total, id, prev_id);
        if !header.is_valid() {
            return Err(invalid);
        }
        Ok(header)
    }

    /// Append the encoded header to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(HEADER_SIZE);
        buf.put_u8(self.kind.code());
        buf.put_u8(self.fragment.get());
        buf.put_u8(self.fragments_total.get());
        buf.put_u16(self.id.get());
        buf.put_u16(self.prev_id.get());
    }

    /// Build the on-wire image `header || payload` in a single buffer.
    #[must_use]
    pub fn encode_with_payload(&self, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        self.encode_into(&mut buf);
        buf.extend_from_slice(payload);
        buf
    }
}
