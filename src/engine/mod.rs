//! The fragmentation engine: reassembly and retransmission state machine
//! between the link interface and the application.
//!
//! The engine exposes three entry points the host must serialise:
//!
//! - [`receive`](FragmentationEngine::receive) accepts raw fragments
//!   surfaced by the link parser, strips the wire header, and routes the
//!   remainder into the incoming or outgoing table.
//! - [`transmit`](FragmentationEngine::transmit) splits an application
//!   payload into fragments and emits the first burst, link capacity
//!   permitting.
//! - [`tick`](FragmentationEngine::tick) is the periodic housekeeping pass
//!   that completes reassemblies, chases missing fragments with selective
//!   retransmit requests, re-probes unacknowledged transfers, and expires
//!   idle state.
//!
//! Nothing blocks and nothing panics: work that cannot proceed (link
//! transmit queue full, timers not yet expired) stays pending in the
//! tables and is retried on the next pass. Every entry point has an
//! `..._at(now)` variant taking an explicit clock reading so hosts and
//! tests control time.

mod hooks;
mod progress;


use std::{collections::HashMap, num::NonZeroUsize, time::Instant};

use bytes::{Buf, Bytes};
use log::{debug, trace, warn};

pub use hooks::EngineHooks;

use crate::{
    clock::older_than,
    config::EngineConfig,
    error::{TransferError, TransmitError},
    header::{FragmentHeader, FrameKind, HEADER_SIZE},
    id::TransferId,
    index::FragmentIndex,
    link::{Fragment, LinkStatus, PeerAddress},
    transfer::{EmissionTransfer, ReassemblyTransfer},
};

use progress::{IncomingProgress, IncomingState, OutgoingProgress};

/// Table occupancy snapshot for host-side introspection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Incoming records that still own a live reassembly.
    pub incoming_live: usize,
    /// Incoming records lingering in grace retention.
    pub incoming_grace: usize,
    /// Outbound transfers awaiting acknowledgement.
    pub outgoing: usize,
}

/// Bidirectional reliable-fragmentation engine for one link interface.
///
/// Construction takes the immutable [`EngineConfig`] and the
/// [`EngineHooks`] event sinks; the host then feeds link receive events
/// into [`receive`](Self::receive), link status updates into
/// [`handle_link_status`](Self::handle_link_status), and calls
/// [`tick`](Self::tick) periodically (a period around `retransmit_time`
/// works well; precision only affects retransmission latency).
#[derive(Debug)]
pub struct FragmentationEngine {
    config: EngineConfig,
    hooks: EngineHooks,
    incoming: Vec<IncomingProgress>,
    outgoing: Vec<OutgoingProgress>,
    link_status: LinkStatus,
    next_id: TransferId,
    last_sent: HashMap<PeerAddress, TransferId>,
}

impl FragmentationEngine {
    /// Create an engine with the given configuration and event sinks.
    ///
    /// The link is assumed saturated until the first status update
    /// arrives, so nothing is emitted before the host reports capacity.
    #[must_use]
    pub fn new(config: EngineConfig, hooks: EngineHooks) -> Self {
        Self {
            config,
            hooks,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            link_status: LinkStatus::default(),
            next_id: TransferId::NONE.wrapping_next(),
            last_sent: HashMap::new(),
        }
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig { &self.config }

    /// Maximum payload bytes per fragment.
    #[must_use]
    pub const fn max_fragment_size(&self) -> NonZeroUsize { self.config.max_fragment_size }

    /// Record the latest link status; emissions consult only the most
    /// recent reading.
    pub fn handle_link_status(&mut self, status: LinkStatus) { self.link_status = status; }

    /// Whether the link has at least one free transmit slot.
    #[must_use]
    pub const fn can_transmit(&self) -> bool { self.link_status.available_transmit_slots != 0 }

    /// Current table occupancy.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let incoming_live = self
            .incoming
            .iter()
            .filter(|record| matches!(record.state, IncomingState::Assembling(_)))
            .count();
        EngineStats {
            incoming_live,
            incoming_grace: self.incoming.len() - incoming_live,
            outgoing: self.outgoing.len(),
        }
    }

    /// Accept a raw fragment from the link, reading the clock internally.
    ///
    /// See [`receive_at`](Self::receive_at).
    pub fn receive(&mut self, fragment: Fragment) { self.receive_at(fragment, Instant::now()); }

    /// Accept a raw fragment from the link at an explicit instant.
    ///
    /// Malformed fragments (truncated, unknown kind, invalid counts) are
    /// dropped without any signal; the link layer already vouched for
    /// payload integrity, so damage here means stale or foreign traffic.
    pub fn receive_at(&mut self, mut fragment: Fragment, now: Instant) {
        let header = match FragmentHeader::parse(fragment.data()) {
            Ok(header) => header,
            Err(err) => {
                trace!("dropping malformed fragment from {}: {err}", fragment.source());
                return;
            }
        };
        fragment.data_mut().advance(HEADER_SIZE);

        match header.kind() {
            FrameKind::Fragment => self.handle_data_fragment(header, fragment, now),
            FrameKind::FragmentAck | FrameKind::FragmentReq => {
                self.handle_response(header, &fragment, now);
            }
        }
    }

    /// Queue `payload` for reliable delivery, reading the clock
    /// internally.
    ///
    /// See [`transmit_at`](Self::transmit_at).
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::PayloadTooLarge`] when the payload cannot
    /// be covered by the 8-bit fragment index at the configured fragment
    /// size.
    pub fn transmit(
        &mut self,
        destination: PeerAddress,
        payload: impl Into<Bytes>,
    ) -> Result<TransferId, TransmitError> {
        self.transmit_at(destination, payload, Instant::now())
    }

    /// Queue `payload` for reliable delivery at an explicit instant.
    ///
    /// Allocates a fresh transfer identifier, emits as many fragments as
    /// the link currently accepts, and parks the transfer in the outgoing
    /// table until the peer acknowledges it or `drop_time` passes. A burst
    /// cut short by backpressure resumes through the periodic pass (first
    /// fragment probe) and the peer's selective retransmit requests.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::PayloadTooLarge`] before any state is
    /// mutated when the payload cannot fit a single transfer.
    pub fn transmit_at(
        &mut self,
        destination: PeerAddress,
        payload: impl Into<Bytes>,
        now: Instant,
    ) -> Result<TransferId, TransmitError> {
        let id = self.next_id;
        let prev_id = self
            .last_sent
            .get(&destination)
            .copied()
            .unwrap_or(TransferId::NONE);
        let transfer = EmissionTransfer::new(
            self.config.interface,
            destination,
            payload.into(),
            id,
            prev_id,
            self.config.max_fragment_size,
        )?;
        self.next_id = self.next_id.wrapping_next();
        self.last_sent.insert(destination, id);

        debug!(
            "transmitting transfer {id} to {destination} in {} fragments",
            transfer.fragments_count()
        );
        let mut record = OutgoingProgress::new(transfer, now);
        for index in FragmentIndex::sequence(record.transfer.fragments_count()) {
            if !self.can_transmit() {
                debug!("transmit burst of transfer {id} deferred at fragment {index}");
                break;
            }
            match serialize_fragment(&record.transfer, index) {
                Ok(fragment) => self.hooks.fragment_out(fragment),
                Err(err) => {
                    warn!("stopping transmit burst of transfer {id}: {err}");
                    break;
                }
            }
        }
        record.transmit_done(now);
        self.outgoing.push(record);
        Ok(id)
    }

    /// Run the periodic housekeeping pass, reading the clock internally.
    ///
    /// See [`tick_at`](Self::tick_at).
    pub fn tick(&mut self) { self.tick_at(Instant::now()); }

    /// Run the periodic housekeeping pass at an explicit instant.
    ///
    /// Every record in both tables is visited exactly once. Erasures swap
    /// the last record into the vacated position, which the walk then
    /// examines before advancing, so a mid-pass erase never skips state.
    pub fn tick_at(&mut self, now: Instant) {
        self.tick_incoming(now);
        self.tick_outgoing(now);
    }

    fn tick_incoming(&mut self, now: Instant) {
        enum Action {
            Keep,
            ExpireGrace,
            DropIdle,
            Complete,
            Request(FragmentIndex),
        }

        let can_transmit = self.can_transmit();
        let config = self.config;

        let mut position = 0;
        while position < self.incoming.len() {
            let record = &self.incoming[position];
            let action = match &record.state {
                IncomingState::Grace => {
                    if older_than(record.timestamp_accessed, config.grace_period(), now) {
                        Action::ExpireGrace
                    } else {
                        Action::Keep
                    }
                }
                IncomingState::Assembling(transfer) => {
                    if transfer.is_complete() && can_transmit {
                        Action::Complete
                    } else if older_than(transfer.timestamp_modified(), config.drop_time, now) {
                        Action::DropIdle
                    } else if can_transmit
                        && older_than(transfer.timestamp_modified(), config.retransmit_time, now)
                        && older_than(record.timestamp_accessed, config.retransmit_time, now)
                    {
                        transfer.missing_fragment().map_or(Action::Keep, Action::Request)
                    } else {
                        Action::Keep
                    }
                }
            };

            match action {
                Action::Keep => position += 1,
                Action::ExpireGrace => {
                    let record = self.incoming.swap_remove(position);
                    trace!("incoming transfer {} left grace retention", record.id);
                }
                Action::DropIdle => {
                    let record = self.incoming.swap_remove(position);
                    warn!(
                        "dropping idle incomplete incoming transfer {} after {} retransmit requests",
                        record.id, record.retransmissions
                    );
                }
                Action::Complete => {
                    self.complete_incoming(position, now);
                    position += 1;
                }
                Action::Request(missing) => {
                    let record = &mut self.incoming[position];
                    if let IncomingState::Assembling(transfer) = &record.state {
                        let metadata = transfer.metadata();
                        debug!(
                            "requesting retransmit of fragment {missing} for transfer {}",
                            metadata.id
                        );
                        let request = FragmentHeader::new(
                            FrameKind::FragmentReq,
                            missing,
                            transfer.fragments_count(),
                            metadata.id,
                            metadata.prev_id,
                        );
                        self.hooks.fragment_out(Fragment::outbound(
                            metadata.source,
                            request.encode_with_payload(&[]),
                        ));
                        record.retransmit_done(now);
                    }
                    position += 1;
                }
            }
        }
    }

    /// Acknowledge the complete reassembly at `position`, surface it to
    /// the application, and flip the record into grace retention.
    ///
    /// The acknowledgement and the receive event fire back to back, so an
    /// external observer never sees a completed transfer that is only half
    /// announced.
    fn complete_incoming(&mut self, position: usize, now: Instant) {
        let record = &mut self.incoming[position];
        let previous = std::mem::replace(&mut record.state, IncomingState::Grace);
        record.timestamp_accessed = now;
        if let IncomingState::Assembling(transfer) = previous {
            let metadata = transfer.metadata();
            let count = transfer.fragments_count();
            let ack =
                FragmentHeader::new(FrameKind::FragmentAck, count, count, metadata.id, metadata.prev_id);
            self.hooks
                .fragment_out(Fragment::outbound(metadata.source, ack.encode_with_payload(&[])));
            match transfer.into_received() {
                Ok(received) => {
                    debug!(
                        "delivering reassembled transfer {} from {}",
                        metadata.id, metadata.source
                    );
                    self.hooks.transfer_received(received);
                }
                Err(err) => warn!("discarding transfer {}: {err}", metadata.id),
            }
        }
    }

    fn tick_outgoing(&mut self, now: Instant) {
        let can_transmit = self.can_transmit();
        let config = self.config;

        let mut position = 0;
        while position < self.outgoing.len() {
            let record = &self.outgoing[position];
            if older_than(record.timestamp_accessed, config.drop_time, now) {
                let record = self.outgoing.swap_remove(position);
                warn!(
                    "dropping outgoing transfer {} after waiting for acknowledgement",
                    record.transfer.id()
                );
                continue;
            }
            if can_transmit
                && record.within_retransmit_budget(&config)
                && older_than(record.timestamp_accessed, config.retransmit_time, now)
            {
                // No ACK and no REQ in a while: either the first fragment
                // was lost or the peer is gone. Probe with fragment one.
                match serialize_fragment(&record.transfer, FragmentIndex::FIRST) {
                    Ok(fragment) => {
                        debug!(
                            "re-probing transfer {} with its first fragment",
                            record.transfer.id()
                        );
                        self.hooks.fragment_out(fragment);
                        self.outgoing[position].retransmit_done(now);
                    }
                    Err(err) => warn!("cannot re-probe outgoing transfer: {err}"),
                }
            }
            position += 1;
        }
    }

    fn handle_data_fragment(&mut self, header: FragmentHeader, fragment: Fragment, now: Instant) {
        let can_transmit = self.can_transmit();
        let Some(position) = self
            .incoming
            .iter()
            .position(|record| record.matches(&header, &fragment))
        else {
            trace!(
                "starting reassembly of transfer {} from {}",
                header.id(),
                fragment.source()
            );
            let mut transfer =
                ReassemblyTransfer::from_header(self.config.interface, &fragment, &header, now);
            if let Err(err) = transfer.assign(header.fragment(), fragment.into_data(), now) {
                warn!("dropping fragment of new transfer {}: {err}", header.id());
                return;
            }
            self.incoming.push(IncomingProgress::new(transfer, now));
            return;
        };

        let record = &mut self.incoming[position];
        match &mut record.state {
            IncomingState::Assembling(transfer) => {
                trace!(
                    "assigning fragment {} of {} to transfer {}",
                    header.fragment(),
                    header.fragments_total(),
                    header.id()
                );
                if let Err(err) = transfer.assign(header.fragment(), fragment.into_data(), now) {
                    warn!("dropping fragment of transfer {}: {err}", header.id());
                }
            }
            IncomingState::Grace => {
                // The transfer was already delivered upstream; the peer is
                // retrying because our acknowledgement got lost. Repeat it
                // and discard the payload.
                if can_transmit {
                    debug!(
                        "re-acknowledging already received transfer {} for {}",
                        header.id(),
                        fragment.source()
                    );
                    let ack = FragmentHeader::new(
                        FrameKind::FragmentAck,
                        header.fragment(),
                        header.fragments_total(),
                        header.id(),
                        header.prev_id(),
                    );
                    self.hooks.fragment_out(Fragment::outbound(
                        fragment.source(),
                        ack.encode_with_payload(&[]),
                    ));
                    record.timestamp_accessed = now;
                }
            }
        }
    }

    fn handle_response(&mut self, header: FragmentHeader, fragment: &Fragment, now: Instant) {
        let Some(position) = self
            .outgoing
            .iter()
            .position(|record| record.matches_response(&header, fragment))
        else {
            trace!(
                "ignoring {:?} for unknown transfer {}",
                header.kind(),
                header.id()
            );
            return;
        };

        if header.kind() == FrameKind::FragmentReq {
            if !self.can_transmit() {
                return;
            }
            if !self.outgoing[position].within_retransmit_budget(&self.config) {
                debug!("retransmit budget of transfer {} exhausted", header.id());
                return;
            }
            match serialize_fragment(&self.outgoing[position].transfer, header.fragment()) {
                Ok(out) => {
                    debug!(
                        "answering retransmit request for fragment {} of transfer {}",
                        header.fragment(),
                        header.id()
                    );
                    self.hooks.fragment_out(out);
                    self.outgoing[position].retransmit_done(now);
                }
                Err(err) => warn!(
                    "ignoring retransmit request for transfer {}: {err}",
                    header.id()
                ),
            }
        } else if header.kind() == FrameKind::FragmentAck {
            // Unlike the incoming side there is nothing left to lose here:
            // the peer has the data, so the record can go immediately.
            let record = self.outgoing.swap_remove(position);
            debug!("transfer {} acknowledged by {}", header.id(), fragment.source());
            self.hooks.transfer_acked(record.transfer.metadata());
        }
    }
}

/// Re-serialise fragment `index` of an outgoing transfer as a data frame.
fn serialize_fragment(
    transfer: &EmissionTransfer,
    index: FragmentIndex,
) -> Result<Fragment, TransferError> {
    let payload = transfer.fragment_payload(index)?;
    let header = FragmentHeader::new(
        FrameKind::Fragment,
        index,
        transfer.fragments_count(),
        transfer.id(),
        transfer.prev_id(),
    );
    Ok(Fragment::outbound(
        transfer.destination(),
        header.encode_with_payload(&payload),
    ))
}
