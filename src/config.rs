//! Engine configuration: fragment sizing, retransmission timing, and
//! retention policy. Immutable once the engine is constructed.

use std::{num::NonZeroUsize, time::Duration};

use crate::{header::HEADER_SIZE, link::InterfaceId};

/// Grace retention multiplier applied to `drop_time` when no explicit value
/// is configured. A completed incoming record lingers this many drop
/// periods so late retries by the peer still get their acknowledgement.
pub const DEFAULT_GRACE_MULTIPLIER: u32 = 5;

/// Settings that bound fragment sizes and drive the retransmission state
/// machine.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fraglink::{EngineConfig, InterfaceId, HEADER_SIZE};
///
/// let config = EngineConfig::for_link_mtu(
///     InterfaceId::new(0),
///     64,
///     Duration::from_millis(100),
///     Duration::from_secs(1),
///     2,
/// )
/// .expect("MTU leaves room for payload");
/// assert_eq!(config.max_fragment_size.get(), 64 - HEADER_SIZE);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Tag of the link interface this engine serves, recorded in every
    /// transfer's metadata for routing by the host.
    pub interface: InterfaceId,
    /// Maximum payload bytes per fragment: link MTU minus [`HEADER_SIZE`].
    pub max_fragment_size: NonZeroUsize,
    /// Idle interval before a missing inbound fragment is chased with a
    /// retransmit request, and before an unacknowledged outbound transfer
    /// re-probes with its first fragment.
    pub retransmit_time: Duration,
    /// Idle interval after which a transfer is abandoned.
    pub drop_time: Duration,
    /// Caps retransmissions per outgoing transfer at
    /// `fragments_count * retransmit_multiplier`.
    pub retransmit_multiplier: u32,
    /// Multiplies `drop_time` into the post-completion retention window of
    /// incoming records.
    pub grace_multiplier: u32,
}

impl EngineConfig {
    /// Derive a configuration from the link's maximum data unit.
    ///
    /// Returns `None` when `mtu` cannot carry any payload beyond the
    /// header. The grace multiplier defaults to
    /// [`DEFAULT_GRACE_MULTIPLIER`]; adjust the field afterwards when a
    /// different retention policy is needed.
    #[must_use]
    pub fn for_link_mtu(
        interface: InterfaceId,
        mtu: usize,
        retransmit_time: Duration,
        drop_time: Duration,
        retransmit_multiplier: u32,
    ) -> Option<Self> {
        let payload = mtu.checked_sub(HEADER_SIZE)?;
        Some(Self {
            interface,
            max_fragment_size: NonZeroUsize::new(payload)?,
            retransmit_time,
            drop_time,
            retransmit_multiplier,
            grace_multiplier: DEFAULT_GRACE_MULTIPLIER,
        })
    }

    /// Retention window of a completed incoming record.
    #[must_use]
    pub fn grace_period(&self) -> Duration { self.drop_time * self.grace_multiplier }

    /// Largest payload a single transfer can carry: the fragment index is
    /// 8-bit, so at most [`FragmentIndex::MAX`](crate::FragmentIndex::MAX)
    /// fragments of `max_fragment_size` bytes each.
    #[must_use]
    pub fn max_transfer_size(&self) -> usize {
        self.max_fragment_size.get() * usize::from(crate::FragmentIndex::MAX.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(mtu: usize) -> Option<EngineConfig> {
        EngineConfig::for_link_mtu(
            InterfaceId::new(1),
            mtu,
            Duration::from_millis(50),
            Duration::from_millis(500),
            2,
        )
    }

    #[test]
    fn mtu_derivation_subtracts_header_overhead() {
        let config = config_for(32).expect("valid MTU");
        assert_eq!(config.max_fragment_size.get(), 32 - HEADER_SIZE);
        assert_eq!(config.grace_multiplier, DEFAULT_GRACE_MULTIPLIER);
    }

    #[test]
    fn mtu_without_payload_room_is_rejected() {
        assert!(config_for(HEADER_SIZE).is_none());
        assert!(config_for(HEADER_SIZE - 1).is_none());
        assert!(config_for(0).is_none());
    }

    #[test]
    fn grace_period_scales_drop_time() {
        let config = config_for(64).expect("valid MTU");
        assert_eq!(
            config.grace_period(),
            Duration::from_millis(500) * DEFAULT_GRACE_MULTIPLIER
        );
    }

    #[test]
    fn transfer_size_cap_follows_index_width() {
        let config = config_for(32).expect("valid MTU");
        assert_eq!(config.max_transfer_size(), (32 - HEADER_SIZE) * 255);
    }
}
