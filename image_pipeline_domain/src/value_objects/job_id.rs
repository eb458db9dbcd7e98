// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Identifier
//!
//! Jobs are identified by the decimal string form of a monotonic counter
//! owned by the job store. The string form doubles as the cache file name
//! under each stage's cache directory, so it must stay filesystem-safe -
//! which a decimal integer trivially is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Builds the id for the given counter value.
    pub fn from_counter(value: u64) -> Self {
        JobId(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_form() {
        assert_eq!(JobId::from_counter(0).as_str(), "0");
        assert_eq!(JobId::from_counter(41).to_string(), "41");
    }
}
