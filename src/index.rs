//! One-based fragment positioning within transfers.
//!
//! Provides [`FragmentIndex`], a type-safe wrapper around `NonZeroU8`. The
//! wire format reserves index zero as invalid, so a parsed index can never
//! hold it.

use std::num::NonZeroU8;

use derive_more::{Display, Into};

/// One-based ordinal describing a fragment's position within its transfer.
///
/// The same type carries `fragments_total` counts, mirroring the 8-bit
/// index width of the wire header.
///
/// # Examples
///
/// ```
/// use fraglink::FragmentIndex;
/// let index = FragmentIndex::new(3).expect("non-zero");
/// assert_eq!(index.get(), 3);
/// assert_eq!(FragmentIndex::FIRST.get(), 1);
/// assert!(index.checked_increment().is_some());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Into)]
#[display("{_0}")]
pub struct FragmentIndex(NonZeroU8);

impl FragmentIndex {
    /// The first valid fragment index.
    pub const FIRST: Self = Self(NonZeroU8::MIN);

    /// The largest representable index, bounding fragments per transfer.
    pub const MAX: Self = Self(NonZeroU8::MAX);

    /// Construct an index from a raw wire value, rejecting the reserved
    /// zero.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        match NonZeroU8::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u8 { self.0.get() }

    /// Zero-based slot offset of this index.
    #[must_use]
    pub const fn slot(self) -> usize { (self.0.get() - 1) as usize }

    /// Increment the index, returning `None` on overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }

    /// Iterate indices `1..=total`, in order.
    pub fn sequence(total: Self) -> impl Iterator<Item = Self> {
        (1..=total.get()).filter_map(Self::new)
    }
}

impl From<NonZeroU8> for FragmentIndex {
    fn from(value: NonZeroU8) -> Self { Self(value) }
}
