// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error type for the image pipeline domain.
//!
//! ## Error Categories
//!
//! - **InvalidInput** - bad argument name for a stage, unknown job id,
//!   out-of-range stage index, malformed shell command arguments
//! - **InvalidConfiguration** - malformed configuration file contents or
//!   unknown configuration keys
//! - **AbiMismatch** - a stage module was built against an incompatible ABI
//!   revision or debug flavour
//! - **IoError** / **CodecError** - filesystem or image codec failures;
//!   always surfaced to the caller, never swallowed
//! - **StageFailed** - a stage's processing hook returned a non-`Done`
//!   status; recovered locally by the engine (the stage is skipped)
//! - **ResourceExhausted** - a bounded cache rejected a registration at
//!   capacity with eviction disabled
//! - **ConsistencyViolation** - the cache index and the on-disk file set
//!   disagreed at a point where they must not; fatal to the operation
//! - **NotFound** - lookup misses that callers may treat as recoverable
//! - **InternalError** - unexpected failures that indicate a bug

use thiserror::Error;

/// Domain-specific errors for the image pipeline system.
///
/// Each variant carries a descriptive message. Variants map onto the error
/// taxonomy used by the engine's propagation policy: `StageFailed` is
/// recovered inside the pipeline loop, everything else propagates to the
/// caller.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("ABI mismatch: {0}")]
    AbiMismatch(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Codec error: {0}")]
    CodecError(String),

    #[error("Stage failed: {0}")]
    StageFailed(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Cache consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Creates a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new ABI mismatch error
    pub fn abi_mismatch(msg: impl Into<String>) -> Self {
        Self::AbiMismatch(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new codec error
    pub fn codec_error(msg: impl Into<String>) -> Self {
        Self::CodecError(msg.into())
    }

    /// Creates a new stage failure error
    pub fn stage_failed(msg: impl Into<String>) -> Self {
        Self::StageFailed(msg.into())
    }

    /// Creates a new resource exhausted error
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Creates a new consistency violation error
    pub fn consistency_violation(msg: impl Into<String>) -> Self {
        Self::ConsistencyViolation(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Checks whether the error is fatal to a pipeline run.
    ///
    /// `StageFailed` is the only variant the engine recovers from locally;
    /// every other variant aborts the operation that produced it.
    pub fn is_stage_failure(&self) -> bool {
        matches!(self, PipelineError::StageFailed(_))
    }

    /// Gets the error category used by structured logging
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "input",
            PipelineError::InvalidConfiguration(_) => "configuration",
            PipelineError::AbiMismatch(_) => "abi",
            PipelineError::IoError(_) => "io",
            PipelineError::CodecError(_) => "codec",
            PipelineError::StageFailed(_) => "stage",
            PipelineError::ResourceExhausted(_) => "resource",
            PipelineError::ConsistencyViolation(_) => "consistency",
            PipelineError::NotFound(_) => "lookup",
            PipelineError::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}
