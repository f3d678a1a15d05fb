//! Link-facing types: addresses, interface status, and the on-link
//! [`Fragment`] unit.
//!
//! The engine sits above a fragment-oriented link interface (serial, radio)
//! that enforces a maximum data unit and reports its transmit capacity. The
//! types here describe that boundary without depending on any concrete
//! driver.

use bytes::BytesMut;
use derive_more::{Display, From, Into};

/// Link-local address of a peer on the interface.
///
/// Addressing is single-hop; the engine never routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct PeerAddress(u8);

impl PeerAddress {
    /// Placeholder address used on outbound fragments before the link
    /// driver stamps its own source address onto the wire image.
    pub const UNSPECIFIED: Self = Self(0);

    /// Create a new address.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the inner numeric address.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}

/// Tag identifying the link interface an engine instance serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct InterfaceId(u8);

impl InterfaceId {
    /// Create a new interface identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}

/// Last observed state of the link interface.
///
/// The interface publishes a fresh status whenever its transmit queue
/// drains or fills; the engine only ever inspects the most recent reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStatus {
    /// Units of send capacity left in the link-layer transmit queue. Zero
    /// means the queue is full and emissions must be deferred.
    pub available_transmit_slots: u16,
}

impl LinkStatus {
    /// Status reporting `slots` free transmit slots.
    #[must_use]
    pub const fn with_slots(slots: u16) -> Self {
        Self {
            available_transmit_slots: slots,
        }
    }
}

/// One link-sized datagram: a pair of addresses and a bounded payload.
///
/// Inbound fragments carry the addresses observed by the link parser;
/// outbound fragments carry the destination while the source stays
/// [`PeerAddress::UNSPECIFIED`] until the driver fills it in.
///
/// # Examples
///
/// ```
/// use fraglink::{Fragment, PeerAddress};
/// let fragment = Fragment::outbound(PeerAddress::new(7), [1_u8, 2, 3].as_slice().into());
/// assert_eq!(fragment.destination(), PeerAddress::new(7));
/// assert_eq!(fragment.data().as_ref(), &[1, 2, 3]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    source: PeerAddress,
    destination: PeerAddress,
    data: BytesMut,
}

impl Fragment {
    /// Construct a fragment with explicit addresses, as surfaced by the
    /// link parser for inbound traffic.
    #[must_use]
    pub fn new(source: PeerAddress, destination: PeerAddress, data: BytesMut) -> Self {
        Self {
            source,
            destination,
            data,
        }
    }

    /// Construct an outbound fragment addressed to `destination`.
    #[must_use]
    pub fn outbound(destination: PeerAddress, data: BytesMut) -> Self {
        Self::new(PeerAddress::UNSPECIFIED, destination, data)
    }

    /// Address the fragment was received from.
    #[must_use]
    pub const fn source(&self) -> PeerAddress { self.source }

    /// Address the fragment is directed at.
    #[must_use]
    pub const fn destination(&self) -> PeerAddress { self.destination }

    /// Borrow the payload bytes.
    #[must_use]
    pub fn data(&self) -> &BytesMut { &self.data }

    /// Mutably borrow the payload bytes.
    pub fn data_mut(&mut self) -> &mut BytesMut { &mut self.data }

    /// Consume the fragment, returning the owned payload.
    #[must_use]
    pub fn into_data(self) -> BytesMut { self.data }
}
