// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Entity
//!
//! A `Job` pairs one source image with an identity and carries everything a
//! pipeline run produces for it: the result image, the run status, and the
//! snapshot of stage identities observed during the last successful run.
//!
//! ## Lifecycle
//!
//! 1. Created from a source file by the job store (`Pending`, empty
//!    snapshot, unallocated result image)
//! 2. Fed through the pipeline; on success the result image is overwritten,
//!    the status becomes `Success`, and the snapshot is refreshed
//! 3. On a fatal failure the status becomes `Fail`; the previous result and
//!    snapshot are left as they were
//!
//! The source image is immutable after creation - it is the fixed point the
//! caching model reasons from.

use crate::value_objects::{Image, JobId, PipelineSnapshot};
use crate::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of the most recent pipeline run for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Success,
    Fail,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// One submitted processing job.
#[derive(Debug, Clone)]
pub struct Job {
    job_id: JobId,
    filepath: PathBuf,
    src_img: Image,
    result_img: Image,
    status: JobStatus,
    snapshot: PipelineSnapshot,
}

impl Job {
    /// Creates a pending job around an already-decoded source image.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the source image is unallocated - a job
    /// with no pixels to process is meaningless.
    pub fn new(job_id: JobId, filepath: impl Into<PathBuf>, src_img: Image) -> Result<Self, PipelineError> {
        if src_img.is_unallocated() {
            return Err(PipelineError::invalid_input(
                "job source image must have nonzero dimensions",
            ));
        }
        Ok(Job {
            job_id,
            filepath: filepath.into(),
            src_img,
            result_img: Image::empty(),
            status: JobStatus::Pending,
            snapshot: PipelineSnapshot::empty(),
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn src_img(&self) -> &Image {
        &self.src_img
    }

    pub fn result_img(&self) -> &Image {
        &self.result_img
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn snapshot(&self) -> &PipelineSnapshot {
        &self.snapshot
    }

    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    /// Materialises a pipeline result: resizes the result image to the
    /// working buffer's dimensions, copies the pixels, and marks the job
    /// successful.
    pub fn store_result(&mut self, working: &Image) -> Result<(), PipelineError> {
        self.result_img.resize(working.width(), working.height());
        self.result_img.copy_from(working)?;
        self.status = JobStatus::Success;
        Ok(())
    }

    /// Overwrites the snapshot with the stage identities of the run that
    /// just completed.
    pub fn update_snapshot(&mut self, snapshot: PipelineSnapshot) {
        self.snapshot = snapshot;
    }
}
