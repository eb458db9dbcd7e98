// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Ports
//!
//! Contracts the core consumes but does not implement:
//!
//! - [`stage_module`] - the stage module ABI (descriptor, input packet,
//!   status codes, capability trait) and the loader that produces module
//!   capabilities
//! - [`image_codec`] - decoding source images and persisting intermediates
//!
//! Infrastructure supplies the implementations; the pipeline engine, stage
//! registry, and job store are written purely against these traits.

pub mod image_codec;
pub mod stage_module;

pub use image_codec::ImageCodec;
pub use stage_module::{
    ModuleLoader, StageDescriptor, StageInput, StageModule, StageStatus, STAGE_INFO_SYMBOL_SUFFIX,
};
