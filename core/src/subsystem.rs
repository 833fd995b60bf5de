//! Component trait.
//!
//! RULE: Every engine component implements CompSubsystem.
//! The engine calls update() on each registered component in
//! registration order, once per command, inside the command's
//! transaction. Execution order is fixed and documented in engine.rs.

use crate::{error::CompResult, event::CompEvent, store::CompStore, types::Seq};

/// The contract every engine component must fulfill.
pub trait CompSubsystem: Send {
    /// Unique stable name, written to the component column of event_log.
    fn name(&self) -> &'static str;

    /// Called once per command by the engine.
    ///
    /// - `seq`:       the command's sequence number
    /// - `store`:     the store, already inside the command's transaction
    /// - `events_in`: events emitted so far for this command
    ///
    /// Returns the new events to append to the command's stream.
    fn update(
        &mut self,
        seq: Seq,
        store: &CompStore,
        events_in: &[CompEvent],
    ) -> CompResult<Vec<CompEvent>>;
}
