//! Ledger clock: owns the operation sequence number.
//!
//! Every committed command gets the next seq. The seq is the only
//! timestamp written into engine-owned rows and event payloads, so two
//! engines fed the same commands produce identical ledgers.

use crate::types::Seq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerClock {
    pub current_seq: Seq,
}

impl LedgerClock {
    /// Resume from the last seq already recorded in the store.
    pub fn resume_at(current_seq: Seq) -> Self {
        Self { current_seq }
    }

    /// The seq the next command will carry if it commits.
    pub fn next_seq(&self) -> Seq {
        self.current_seq + 1
    }

    /// Mark `seq` as committed. Panics on a gap; callers must pass `next_seq()`.
    pub fn commit(&mut self, seq: Seq) {
        assert_eq!(seq, self.next_seq(), "commit() out of order");
        self.current_seq = seq;
    }
}
