//! Two-engine in-memory harness for scenario tests.
//!
//! Each [`TestPeer`] wraps one engine whose hooks feed channels the test
//! can drain. Fragments travel between peers through [`TestPeer::deliver_at`],
//! which stamps the sender's address onto the wire image the way a real
//! link driver fills in the source field. Time never advances on its own;
//! tests pass explicit instants into the `_at` entry points.

use std::{
    num::NonZeroUsize,
    sync::mpsc::{Receiver, channel},
    time::{Duration, Instant},
};

use fraglink::{
    EngineConfig, EngineHooks, Fragment, FragmentationEngine, InterfaceId, LinkStatus,
    PeerAddress, ReceivedTransfer, TransferMetadata,
};

pub struct TestPeer {
    pub address: PeerAddress,
    pub engine: FragmentationEngine,
    fragments: Receiver<Fragment>,
    received: Receiver<ReceivedTransfer>,
    acked: Receiver<TransferMetadata>,
}

impl TestPeer {
    pub fn new(address: u8, config: EngineConfig, transmit_slots: u16) -> Self {
        let (fragment_tx, fragments) = channel();
        let (received_tx, received) = channel();
        let (acked_tx, acked) = channel();
        let hooks = EngineHooks {
            on_fragment_out: Some(Box::new(move |fragment| {
                let _ = fragment_tx.send(fragment);
            })),
            on_transfer_received: Some(Box::new(move |transfer| {
                let _ = received_tx.send(transfer);
            })),
            on_transfer_acked: Some(Box::new(move |metadata| {
                let _ = acked_tx.send(metadata);
            })),
        };
        let mut engine = FragmentationEngine::new(config, hooks);
        engine.handle_link_status(LinkStatus::with_slots(transmit_slots));
        Self {
            address: PeerAddress::new(address),
            engine,
            fragments,
            received,
            acked,
        }
    }

    /// Fragments emitted since the last drain, in emission order.
    pub fn outgoing(&self) -> Vec<Fragment> { self.fragments.try_iter().collect() }

    /// Transfers surfaced to the application since the last drain.
    pub fn delivered(&self) -> Vec<ReceivedTransfer> { self.received.try_iter().collect() }

    /// Acknowledgement events observed since the last drain.
    pub fn acknowledged(&self) -> Vec<TransferMetadata> { self.acked.try_iter().collect() }

    /// Feed a fragment emitted by `from`, stamping its source address.
    pub fn deliver_at(&mut self, from: PeerAddress, fragment: Fragment, now: Instant) {
        let destination = fragment.destination();
        let data = fragment.into_data();
        self.engine.receive_at(Fragment::new(from, destination, data), now);
    }

    /// Deliver a whole batch in order.
    pub fn deliver_all_at(&mut self, from: PeerAddress, fragments: Vec<Fragment>, now: Instant) {
        for fragment in fragments {
            self.deliver_at(from, fragment, now);
        }
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        interface: InterfaceId::new(0),
        max_fragment_size: NonZeroUsize::new(4).expect("non-zero fragment size"),
        retransmit_time: Duration::from_millis(100),
        drop_time: Duration::from_secs(2),
        retransmit_multiplier: 2,
        grace_multiplier: 5,
    }
}

/// A connected sender/receiver pair with ample transmit capacity.
pub fn linked_pair(config: EngineConfig) -> (TestPeer, TestPeer) {
    (TestPeer::new(1, config, 16), TestPeer::new(2, config, 16))
}
