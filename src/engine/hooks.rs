//! Event sinks invoked by the fragmentation engine.
//!
//! This module defines [`EngineHooks`], a container for optional callback
//! functions the engine fires as fragments and transfers cross its
//! boundary. The engine stays sink-agnostic: absent hooks are no-ops, and
//! a host can forward events into channels, the link driver, or test
//! queues without the engine knowing.

use crate::{
    link::Fragment,
    transfer::{ReceivedTransfer, TransferMetadata},
};

/// Type alias for the `on_fragment_out` callback.
type FragmentOutHook = Box<dyn FnMut(Fragment) + Send + 'static>;

/// Type alias for the `on_transfer_received` callback.
type TransferReceivedHook = Box<dyn FnMut(ReceivedTransfer) + Send + 'static>;

/// Type alias for the `on_transfer_acked` callback.
type TransferAckedHook = Box<dyn FnMut(TransferMetadata) + Send + 'static>;

/// Callbacks used by the fragmentation engine.
#[derive(Default)]
pub struct EngineHooks {
    /// Invoked when a fragment must be pushed to the link.
    pub on_fragment_out: Option<FragmentOutHook>,
    /// Invoked when a transfer has been fully reassembled.
    pub on_transfer_received: Option<TransferReceivedHook>,
    /// Invoked when the peer confirmed end-to-end delivery of a transfer.
    pub on_transfer_acked: Option<TransferAckedHook>,
}

impl EngineHooks {
    /// Run the `on_fragment_out` hook if registered.
    pub fn fragment_out(&mut self, fragment: Fragment) {
        if let Some(hook) = &mut self.on_fragment_out {
            hook(fragment);
        }
    }

    /// Run the `on_transfer_received` hook if registered.
    pub fn transfer_received(&mut self, transfer: ReceivedTransfer) {
        if let Some(hook) = &mut self.on_transfer_received {
            hook(transfer);
        }
    }

    /// Run the `on_transfer_acked` hook if registered.
    pub fn transfer_acked(&mut self, metadata: TransferMetadata) {
        if let Some(hook) = &mut self.on_transfer_acked {
            hook(metadata);
        }
    }
}

impl std::fmt::Debug for EngineHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHooks")
            .field("on_fragment_out", &self.on_fragment_out.is_some())
            .field("on_transfer_received", &self.on_transfer_received.is_some())
            .field("on_transfer_acked", &self.on_transfer_acked.is_some())
            .finish()
    }
}
