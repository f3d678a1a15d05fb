#![doc(html_root_url = "https://docs.rs/fraglink/latest")]
//! Public API for the `fraglink` library.
//!
//! `fraglink` is a reliable-fragmentation transport for unreliable,
//! MTU-bounded links such as serial lines and packet radios. It splits
//! application transfers into link-sized fragments, recovers lost
//! fragments through selective retransmission, suppresses duplicates, and
//! confirms end-to-end delivery with acknowledgements.
//!
//! The crate is deliberately I/O-free: the host owns the link driver and
//! the clock, wires link events into [`FragmentationEngine::receive`] and
//! [`FragmentationEngine::handle_link_status`], drives
//! [`FragmentationEngine::tick`] periodically, and collects outbound
//! fragments plus delivery events through [`EngineHooks`].

mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod header;
pub mod id;
pub mod index;
pub mod link;
pub mod transfer;

pub use config::{DEFAULT_GRACE_MULTIPLIER, EngineConfig};
pub use engine::{EngineHooks, EngineStats, FragmentationEngine};
pub use error::{HeaderError, TransferError, TransmitError};
pub use header::{FragmentHeader, FrameKind, HEADER_SIZE};
pub use id::TransferId;
pub use index::FragmentIndex;
pub use link::{Fragment, InterfaceId, LinkStatus, PeerAddress};
pub use transfer::{EmissionTransfer, ReassemblyTransfer, ReceivedTransfer, TransferMetadata};
