// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Instance Identifier
//!
//! A process-wide unique 64-bit identifier assigned to every stage instance
//! at load time, strictly increasing and never reused. Because the registry
//! appends instances in load order, `stages[i].uid < stages[j].uid` for
//! `i < j` - the ordering half of the identity model the cache resume logic
//! depends on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe stage instance identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageUid(u64);

impl StageUid {
    /// Wraps a raw identifier value.
    ///
    /// Allocation of fresh values is the stage registry's job; this
    /// constructor exists for the registry and for tests reconstructing
    /// snapshots.
    pub fn new(value: u64) -> Self {
        StageUid(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_value() {
        assert!(StageUid::new(1) < StageUid::new(2));
        assert_eq!(StageUid::new(7).to_string(), "7");
    }
}
