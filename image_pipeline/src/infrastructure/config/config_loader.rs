// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Loader
//!
//! Parses the pipeline's configuration file into a typed [`AppConfig`].
//!
//! ## Grammar
//!
//! Statements of the form `key=value`, separated by `;` or newlines.
//! A value may be a comma-separated array; the core's keys are scalar and
//! read index zero. Blank statements are skipped and `#` starts a line
//! comment.
//!
//! ## Keys
//!
//! The core consumes exactly two keys, both optional:
//!
//! - `cache_root` - directory holding every per-stage cache (default
//!   `cache`)
//! - `cache_default_max_files` - capacity of each created cache (default
//!   20, must be positive)
//!
//! Unknown keys are rejected so that a typo fails loudly instead of
//! silently running with defaults.

use image_pipeline_domain::PipelineError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fallback configuration file consulted when `-c` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "image_pipeline.conf";

const DEFAULT_CACHE_ROOT: &str = "cache";
const DEFAULT_CACHE_MAX_FILES: usize = 20;

const VALID_KEYS: &[&str] = &["cache_root", "cache_default_max_files"];

/// Typed configuration consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cache_root: PathBuf,
    pub cache_default_max_files: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            cache_default_max_files: DEFAULT_CACHE_MAX_FILES,
        }
    }
}

/// Parses configuration files into [`AppConfig`] values.
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_PATH`]
    /// when no path is given.
    ///
    /// An absent default file yields the compiled-in defaults; an absent
    /// explicitly requested file is an error.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, PipelineError> {
        match path {
            Some(explicit) => {
                info!(target: "config", path = %explicit.display(), "loading configuration");
                let contents = fs::read_to_string(explicit).map_err(|e| {
                    PipelineError::io_error(format!("failed to read config file {}: {}", explicit.display(), e))
                })?;
                Self::parse(&contents)
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    info!(target: "config", path = DEFAULT_CONFIG_PATH, "loading configuration");
                    let contents = fs::read_to_string(default)
                        .map_err(|e| PipelineError::io_error(format!("failed to read config file: {}", e)))?;
                    Self::parse(&contents)
                } else {
                    debug!(target: "config", "no configuration file, using defaults");
                    Ok(AppConfig::default())
                }
            }
        }
    }

    /// Parses configuration file contents.
    pub fn parse(contents: &str) -> Result<AppConfig, PipelineError> {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();

        let statements = contents.lines().flat_map(|line| {
            let line = match line.find('#') {
                Some(i) => &line[..i],
                None => line,
            };
            line.split(';')
        });

        for statement in statements {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }

            let (key, value) = statement.split_once('=').ok_or_else(|| {
                PipelineError::invalid_config(format!("statement '{}' is not of the form key=value", statement))
            })?;
            let key = key.trim();
            if !VALID_KEYS.contains(&key) {
                return Err(PipelineError::invalid_config(format!(
                    "unknown configuration key '{}'",
                    key
                )));
            }

            let items: Vec<String> = value.split(',').map(|v| v.trim().to_string()).collect();
            values.insert(key.to_string(), items);
        }

        let mut config = AppConfig::default();
        if let Some(root) = values.get("cache_root").and_then(|v| v.first()) {
            if root.is_empty() {
                return Err(PipelineError::invalid_config("cache_root cannot be empty"));
            }
            config.cache_root = PathBuf::from(root);
        }
        if let Some(max) = values.get("cache_default_max_files").and_then(|v| v.first()) {
            let parsed: usize = max.parse().map_err(|_| {
                PipelineError::invalid_config(format!(
                    "cache_default_max_files must be a positive integer, got '{}'",
                    max
                ))
            })?;
            if parsed == 0 {
                return Err(PipelineError::invalid_config(
                    "cache_default_max_files must be a positive integer, got '0'",
                ));
            }
            config.cache_default_max_files = parsed;
        }
        Ok(config)
    }
}
