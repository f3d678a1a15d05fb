//! Per-transfer progress records kept in the engine's tables.
//!
//! Each record wraps one transfer with the housekeeping the periodic pass
//! needs: a last-touch timestamp and a retransmission counter. An incoming
//! record outlives its transfer: once the reassembly is delivered upstream
//! the record flips to [`IncomingState::Grace`], keeping only the cached
//! identity so late retries by the peer can be re-acknowledged instead of
//! being mistaken for a new transfer.

use std::time::Instant;

use crate::{
    config::EngineConfig,
    header::FragmentHeader,
    id::TransferId,
    link::Fragment,
    transfer::{EmissionTransfer, ReassemblyTransfer},
};

/// Ownership state of an incoming record.
#[derive(Debug)]
pub(crate) enum IncomingState {
    /// The record owns a live reassembly.
    Assembling(ReassemblyTransfer),
    /// The reassembly was delivered; only the identity lingers to suppress
    /// duplicates until the grace window closes.
    Grace,
}

/// One in-flight (or just-finished) inbound reassembly.
#[derive(Debug)]
pub(crate) struct IncomingProgress {
    /// Cached transfer identifier; stays valid through the grace state.
    pub(crate) id: TransferId,
    pub(crate) state: IncomingState,
    pub(crate) timestamp_accessed: Instant,
    pub(crate) retransmissions: u32,
}

impl IncomingProgress {
    pub(crate) fn new(transfer: ReassemblyTransfer, now: Instant) -> Self {
        Self {
            id: transfer.metadata().id,
            state: IncomingState::Assembling(transfer),
            timestamp_accessed: now,
            retransmissions: 0,
        }
    }

    /// Match policy for inbound data fragments: a live reassembly checks
    /// identity and addresses, a grace record checks identity alone.
    pub(crate) fn matches(&self, header: &FragmentHeader, fragment: &Fragment) -> bool {
        match &self.state {
            IncomingState::Assembling(transfer) => {
                self.id == header.id() && transfer.matches(fragment)
            }
            IncomingState::Grace => self.id == header.id(),
        }
    }

    pub(crate) fn retransmit_done(&mut self, now: Instant) {
        self.timestamp_accessed = now;
        self.retransmissions += 1;
    }
}

/// One unacknowledged outbound transfer.
#[derive(Debug)]
pub(crate) struct OutgoingProgress {
    pub(crate) transfer: EmissionTransfer,
    pub(crate) timestamp_accessed: Instant,
    pub(crate) retransmissions: u32,
}

impl OutgoingProgress {
    pub(crate) fn new(transfer: EmissionTransfer, now: Instant) -> Self {
        Self {
            transfer,
            timestamp_accessed: now,
            retransmissions: 0,
        }
    }

    /// Match policy for inbound REQ/ACK frames answering this transfer.
    pub(crate) fn matches_response(&self, header: &FragmentHeader, fragment: &Fragment) -> bool {
        self.transfer.id() == header.id() && self.transfer.matches_response(fragment)
    }

    /// Whether another retransmission fits the configured budget.
    pub(crate) fn within_retransmit_budget(&self, config: &EngineConfig) -> bool {
        let budget =
            u32::from(self.transfer.fragments_count().get()) * config.retransmit_multiplier;
        self.retransmissions < budget
    }

    pub(crate) fn transmit_done(&mut self, now: Instant) { self.timestamp_accessed = now; }

    pub(crate) fn retransmit_done(&mut self, now: Instant) {
        self.timestamp_accessed = now;
        self.retransmissions += 1;
    }
}
