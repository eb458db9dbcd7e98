// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Snapshot
//!
//! After every successful run, a job records the `(uid, arg_rev)` pair of
//! each stage in pipeline order. On the next run the engine compares that
//! record against the live registry to find the earliest stage whose output
//! can no longer be trusted; everything before it is served from cache.
//!
//! An empty snapshot means the job has never completed successfully and the
//! whole pipeline must run.

use crate::value_objects::StageUid;
use serde::{Deserialize, Serialize};

/// The identity of one stage as observed during a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFingerprint {
    pub uid: StageUid,
    pub arg_rev: u64,
}

impl StageFingerprint {
    pub fn new(uid: StageUid, arg_rev: u64) -> Self {
        StageFingerprint { uid, arg_rev }
    }
}

/// Ordered list of stage fingerprints recorded after a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot(Vec<StageFingerprint>);

impl PipelineSnapshot {
    /// The never-ran snapshot.
    pub fn empty() -> Self {
        PipelineSnapshot(Vec::new())
    }

    pub fn from_fingerprints(fingerprints: Vec<StageFingerprint>) -> Self {
        PipelineSnapshot(fingerprints)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StageFingerprint> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageFingerprint> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let snap = PipelineSnapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.len(), 0);
        assert!(snap.get(0).is_none());
    }

    #[test]
    fn test_ordered_access() {
        let snap = PipelineSnapshot::from_fingerprints(vec![
            StageFingerprint::new(StageUid::new(0), 0),
            StageFingerprint::new(StageUid::new(1), 3),
        ]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get(1).unwrap().arg_rev, 3);
    }
}
