// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Configuration loading infrastructure.

pub mod config_loader;

pub use config_loader::{AppConfig, ConfigLoader, DEFAULT_CONFIG_PATH};
