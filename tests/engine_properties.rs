//! Generated checks for reassembly and retransmission invariants.

mod common;

use std::time::{Duration, Instant};

use fraglink::{HEADER_SIZE, LinkStatus, PeerAddress};
use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any},
    prop_assert, prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};

use common::{TestPeer, linked_pair, test_config};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Payloads spanning one to sixteen fragments at the test fragment size.
fn payload_strategy() -> impl Strategy<Value = Vec<u8>> { vec(any::<u8>(), 0..64) }

#[test]
fn any_arrival_order_with_duplicates_reassembles_the_payload() {
    let mut runner = deterministic_runner(96);
    let strategy = payload_strategy().prop_flat_map(|payload| {
        let fragment_count = payload.len().div_ceil(4).max(1);
        let order = Just((0..fragment_count).collect::<Vec<_>>()).prop_shuffle();
        (Just(payload), order)
    });

    runner
        .run(&strategy, |(payload, order)| {
            let config = test_config();
            let (mut sender, mut receiver) = linked_pair(config);
            let now = Instant::now();

            sender
                .engine
                .transmit_at(receiver.address, payload.clone(), now)
                .map_err(|err| TestCaseError::fail(format!("transmit failed: {err}")))?;
            let fragments = sender.outgoing();
            prop_assert_eq!(fragments.len(), order.len());

            for fragment in &fragments {
                prop_assert!(
                    fragment.data().len() <= HEADER_SIZE + config.max_fragment_size.get(),
                    "an emitted fragment must fit the link MTU"
                );
            }

            // Deliver in the generated order, and every fragment twice, so
            // the final state also witnesses assignment idempotence.
            for &position in &order {
                receiver.deliver_at(sender.address, fragments[position].clone(), now);
                receiver.deliver_at(sender.address, fragments[position].clone(), now);
            }
            receiver.engine.tick_at(now);

            let delivered = receiver.delivered();
            prop_assert_eq!(delivered.len(), 1, "exactly one receive event per transfer");
            prop_assert_eq!(delivered[0].payload(), payload.as_slice());
            prop_assert_eq!(receiver.outgoing().len(), 1, "exactly one acknowledgement");
            Ok(())
        })
        .expect("generated arrival orders should always reassemble");
}

#[test]
fn emission_budget_holds_under_arbitrary_tick_schedules() {
    let mut runner = deterministic_runner(64);
    let strategy = (
        vec(any::<u8>(), 1..48),
        vec((0_u64..300, 0_u16..3), 1..40),
    );

    runner
        .run(&strategy, |(payload, schedule)| {
            let config = test_config();
            let mut sender = TestPeer::new(1, config, 1);
            let peer = PeerAddress::new(2);
            let start = Instant::now();

            sender
                .engine
                .transmit_at(peer, payload.clone(), start)
                .map_err(|err| TestCaseError::fail(format!("transmit failed: {err}")))?;
            let fragment_count = payload.len().div_ceil(config.max_fragment_size.get()).max(1);
            let mut emitted = sender.outgoing().len();

            let mut now = start;
            for (advance_ms, slots) in schedule {
                now += Duration::from_millis(advance_ms);
                sender.engine.handle_link_status(LinkStatus::with_slots(slots));
                sender.engine.tick_at(now);
                let burst = sender.outgoing();
                if slots == 0 {
                    prop_assert!(
                        burst.is_empty(),
                        "nothing may be emitted while transmit slots are exhausted"
                    );
                }
                emitted += burst.len();
            }

            let bound = fragment_count
                + fragment_count * usize::try_from(config.retransmit_multiplier).expect("small");
            prop_assert!(
                emitted <= bound,
                "emitted {} fragments for a transfer of {} with bound {}",
                emitted,
                fragment_count,
                bound
            );
            Ok(())
        })
        .expect("generated tick schedules should respect the retransmit budget");
}
