use derive_more::{Display, From, Into};

/// Identifier of a transfer, unique per peer and direction for the
/// transfer's lifetime.
///
/// Identifiers are allocated from a wrapping counter that skips
/// [`TransferId::NONE`], which is reserved to mean "no previous transfer"
/// in the `prev_id` header field.
///
/// # Examples
///
/// ```
/// use fraglink::TransferId;
/// let id = TransferId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(TransferId::new(u16::MAX).wrapping_next().get(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct TransferId(u16);

impl TransferId {
    /// Reserved identifier meaning "no previous transfer".
    pub const NONE: Self = Self(0);

    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Advance to the next allocatable identifier, wrapping past
    /// `u16::MAX` and skipping [`TransferId::NONE`].
    #[must_use]
    pub const fn wrapping_next(self) -> Self {
        match self.0.checked_add(1) {
            Some(next) => Self(next),
            None => Self(1),
        }
    }
}
