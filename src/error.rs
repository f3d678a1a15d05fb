//! Error types surfaced by the fragmentation layer.
//!
//! Almost every failure here is recovered internally: malformed headers and
//! stale control frames are dropped, backpressure defers work to the next
//! periodic pass, and timeouts silently erase state. The enums exist so the
//! recovery sites and the behavioural tests can name precisely what went
//! wrong.

use thiserror::Error;

use crate::{index::FragmentIndex, link::PeerAddress};

/// Errors produced while parsing a wire header.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The buffer is too short to contain a header.
    #[error("header truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    /// The frame kind code is not part of the protocol.
    #[error("unknown frame kind {code:#04x}")]
    UnknownKind { code: u8 },
    /// Index or total fall outside the valid range.
    #[error("invalid fragment counts: index {fragment} of {fragments_total}")]
    InvalidCounts { fragment: u8, fragments_total: u8 },
}

/// Errors produced by transfer slot and fragment accounting.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    /// A fragment index points outside the transfer.
    #[error("fragment index {index} outside transfer of {fragments_total} fragments")]
    IndexOutOfRange {
        /// Index that was requested or assigned.
        index: FragmentIndex,
        /// Number of fragments the transfer actually spans.
        fragments_total: FragmentIndex,
    },
    /// A completion conversion was attempted with slots still empty.
    #[error("transfer incomplete: fragment {missing} not yet received")]
    Incomplete {
        /// Lowest fragment index still missing.
        missing: FragmentIndex,
    },
}

/// Errors raised by [`FragmentationEngine::transmit`](crate::FragmentationEngine::transmit).
///
/// This is the only synchronous failure the public API reports; everything
/// else is recovered, deferred, or observed via the absence of an ACK event.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransmitError {
    /// The payload cannot be addressed by the 8-bit fragment index.
    #[error("payload of {len} bytes to {destination} exceeds the {max} bytes addressable per transfer")]
    PayloadTooLarge {
        /// Peer the payload was meant for.
        destination: PeerAddress,
        /// Offered payload length.
        len: usize,
        /// Largest payload a single transfer can carry at the configured
        /// fragment size.
        max: usize,
    },
}
