// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Per-Stage File Cache
//!
//! A bounded, registration-ordered store of persisted intermediate images.
//! Every stage instance owns one [`Cache`]: a directory under the global
//! cache root plus an in-memory index of the files the pipeline has written
//! there, keyed by the submitting job's id.
//!
//! ## Consistency Invariant
//!
//! The in-memory index never strays above the on-disk file set: for every
//! indexed entry a readable file exists at its path (once the registering
//! write completes), and every mutation orders its filesystem half before
//! its index half so an error can only leave the index a *subset* of the
//! disk state. Stray files with no index entry are tolerated; index entries
//! with no file are a [`PipelineError::ConsistencyViolation`].
//!
//! ## Eviction
//!
//! Capacity is bounded by `max_files`, fixed at creation from
//! configuration. A registration at capacity either fails or, with
//! auto-evict, deletes the entry with the oldest registration timestamp
//! (ties broken by insertion order). This is a creation-ordered queue, not
//! an access-ordered LRU - lookups do not touch timestamps.

use image_pipeline_domain::PipelineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One registered cache file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    fname: String,
    fpath: PathBuf,
    tstamp: i64,
}

impl CacheEntry {
    /// Logical name; the submitting job's id when written by the pipeline.
    pub fn fname(&self) -> &str {
        &self.fname
    }

    /// Full path of the persisted file.
    pub fn fpath(&self) -> &Path {
        &self.fpath
    }

    /// Seconds since the epoch at registration time.
    pub fn tstamp(&self) -> i64 {
        self.tstamp
    }
}

/// The global cache root: parent directory of every per-stage cache and
/// source of the default capacity.
#[derive(Debug)]
pub struct CacheRoot {
    root: PathBuf,
    default_max_files: usize,
}

impl CacheRoot {
    /// Opens (creating if necessary) the cache root directory.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a zero capacity, `IoError` when the
    /// directory cannot be created.
    pub fn open(root: impl Into<PathBuf>, default_max_files: usize) -> Result<Self, PipelineError> {
        if default_max_files == 0 {
            return Err(PipelineError::invalid_config(
                "cache_default_max_files must be a positive integer",
            ));
        }
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| PipelineError::io_error(format!("failed to create cache root {}: {}", root.display(), e)))?;
        debug!(target: "cache", root = %root.display(), "cache root ready");
        Ok(CacheRoot {
            root,
            default_max_files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn default_max_files(&self) -> usize {
        self.default_max_files
    }

    /// Creates the named cache directory under the root, adopting it if it
    /// already exists. The index starts empty either way: pre-existing
    /// files are never scanned in, only explicit registrations count.
    pub fn create_cache(&self, name: &str) -> Result<Cache, PipelineError> {
        if name.is_empty() {
            return Err(PipelineError::invalid_input("cache name cannot be empty"));
        }
        let path = self.root.join(name);
        if !path.is_dir() {
            fs::create_dir(&path).map_err(|e| {
                PipelineError::io_error(format!("failed to create cache directory {}: {}", path.display(), e))
            })?;
        }
        info!(target: "cache", name, path = %path.display(), "created cache");
        Ok(Cache {
            name: name.to_string(),
            path,
            max_files: self.default_max_files,
            entries: Vec::new(),
        })
    }
}

/// A named, bounded store of persisted intermediate images.
#[derive(Debug)]
pub struct Cache {
    name: String,
    path: PathBuf,
    max_files: usize,
    entries: Vec<CacheEntry>,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the in-memory index for `fname`.
    pub fn has(&self, fname: &str) -> bool {
        self.index_of(fname).is_some()
    }

    /// Path of the registered file `fname`, from the index only.
    pub fn path_of(&self, fname: &str) -> Option<&Path> {
        self.index_of(fname).map(|i| self.entries[i].fpath.as_path())
    }

    /// Registers a logical filename, returning its entry.
    ///
    /// Registering an already-registered name returns the existing entry
    /// unchanged. At capacity the call either fails (`auto_evict` off) or
    /// deletes the oldest entry first. The caller writes the file at the
    /// returned path next and must roll back with [`Cache::unregister`] if
    /// that write fails.
    pub fn register(&mut self, fname: &str, auto_evict: bool) -> Result<&CacheEntry, PipelineError> {
        if let Some(i) = self.index_of(fname) {
            debug!(target: "cache", cache = %self.name, fname, "file already registered");
            return Ok(&self.entries[i]);
        }

        if self.entries.len() >= self.max_files {
            if !auto_evict {
                return Err(PipelineError::resource_exhausted(format!(
                    "cache {} is at capacity ({} files)",
                    self.name, self.max_files
                )));
            }
            self.evict_oldest()?;
        }

        let entry = CacheEntry {
            fname: fname.to_string(),
            fpath: self.path.join(fname),
            tstamp: chrono::Utc::now().timestamp(),
        };
        debug!(target: "cache", cache = %self.name, fname, path = %entry.fpath.display(), "registered file");
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or_else(|| PipelineError::internal_error("cache index empty after push"))
    }

    /// Drops the index entry for `fname` without touching the disk.
    ///
    /// Strictly an index operation, used to roll back a registration whose
    /// file write failed. Unlinking goes through [`Cache::delete`].
    pub fn unregister(&mut self, fname: &str) -> Result<(), PipelineError> {
        match self.index_of(fname) {
            Some(i) => {
                self.entries.remove(i);
                debug!(target: "cache", cache = %self.name, fname, "unregistered file");
                Ok(())
            }
            None => Err(PipelineError::not_found(format!(
                "cache {} has no file {}",
                self.name, fname
            ))),
        }
    }

    /// Unlinks the file on disk and removes its index entry.
    ///
    /// The unlink happens first; the index entry is removed only once the
    /// unlink succeeded, so a failure can never leave the index claiming a
    /// file that is gone.
    pub fn delete(&mut self, fname: &str) -> Result<(), PipelineError> {
        let i = self.index_of(fname).ok_or_else(|| {
            PipelineError::not_found(format!("cache {} has no file {}", self.name, fname))
        })?;

        let fpath = &self.entries[i].fpath;
        if !fpath.is_file() {
            return Err(PipelineError::consistency_violation(format!(
                "cache {} index entry {} has no file on disk at {}",
                self.name,
                fname,
                fpath.display()
            )));
        }
        fs::remove_file(fpath)
            .map_err(|e| PipelineError::io_error(format!("failed to unlink {}: {}", fpath.display(), e)))?;

        self.entries.remove(i);
        debug!(target: "cache", cache = %self.name, fname, "deleted file");
        Ok(())
    }

    /// Tears the cache down. With `delete_files` the whole directory is
    /// removed recursively; without it the directory and its contents stay
    /// behind for the next process. The index is dropped either way.
    pub fn destroy(self, delete_files: bool) -> Result<(), PipelineError> {
        if delete_files {
            if self.path.is_dir() {
                fs::remove_dir_all(&self.path).map_err(|e| {
                    PipelineError::io_error(format!("failed to delete cache {}: {}", self.path.display(), e))
                })?;
            }
            info!(target: "cache", name = %self.name, "cache destroyed");
        } else {
            info!(target: "cache", name = %self.name, "leaving cache files in place");
        }
        Ok(())
    }

    /// Verifies that every index entry has a regular file behind it.
    pub fn verify_consistency(&self) -> Result<(), PipelineError> {
        for entry in &self.entries {
            if !entry.fpath.is_file() {
                return Err(PipelineError::consistency_violation(format!(
                    "cache {} index entry {} has no file on disk at {}",
                    self.name,
                    entry.fname,
                    entry.fpath.display()
                )));
            }
        }
        Ok(())
    }

    fn index_of(&self, fname: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.fname == fname)
    }

    /// Deletes the entry with the smallest timestamp; insertion order
    /// breaks ties.
    fn evict_oldest(&mut self) -> Result<(), PipelineError> {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.tstamp)
            .map(|(i, _)| i);
        match oldest {
            Some(i) => {
                let fname = self.entries[i].fname.clone();
                warn!(target: "cache", cache = %self.name, fname = %fname, "evicting oldest cache file");
                self.delete(&fname)
            }
            None => Err(PipelineError::internal_error(format!(
                "cache {} is at capacity but has no entries to evict",
                self.name
            ))),
        }
    }
}
