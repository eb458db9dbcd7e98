// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Pipeline Domain
//!
//! Core business types of the image pipeline system, independent of file
//! systems, codecs, dynamic loaders, and user interfaces.
//!
//! ## Module Structure
//!
//! - [`entities`] - Objects with identity that change state over time
//!   (`Job`)
//! - [`value_objects`] - Immutable, attribute-defined concepts (`Image`,
//!   `StageUid`, `JobId`, `PipelineSnapshot`, `StageArgs`, `BuildInfo`)
//! - [`services`] - Domain ports: the stage module ABI and the image codec
//!   contract, implemented by the infrastructure layer
//! - [`error`] - The single `PipelineError` type every fallible operation
//!   returns
//!
//! ## Key Invariants
//!
//! The domain encodes the identity model that drives pipeline caching:
//!
//! - Stage instance UIDs are unique for the process lifetime and strictly
//!   increasing in load order.
//! - A stage's argument revision only ever grows, by exactly one per
//!   argument mutation.
//! - A job's snapshot records the `(uid, arg_rev)` pair of every stage at
//!   the end of its last successful run; an empty snapshot means the job
//!   has never succeeded.

pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{Job, JobStatus};
pub use error::PipelineError;
pub use services::{ImageCodec, ModuleLoader, StageDescriptor, StageInput, StageModule, StageStatus};
pub use value_objects::{ArgMutation, BuildInfo, Image, JobId, PipelineSnapshot, StageArgs, StageFingerprint, StageUid};
