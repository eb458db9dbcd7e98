// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Store
//!
//! Holds every submitted job and assigns job identities: the decimal string
//! of a store-owned monotonic counter, which also names each job's files in
//! the per-stage caches.

use image_pipeline_domain::{ImageCodec, Job, JobId, PipelineError};
use std::path::Path;
use tracing::{debug, info};

/// Registry of submitted jobs.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: Vec<Job>,
    next_job_id: u64,
}

impl JobStore {
    pub fn new() -> Self {
        JobStore {
            jobs: Vec::new(),
            next_job_id: 0,
        }
    }

    /// Creates a job for the image at `filepath` and registers it.
    ///
    /// The source image is decoded through the codec once, here; the job
    /// owns the decoded copy for its whole lifetime.
    pub fn create_job(&mut self, codec: &dyn ImageCodec, filepath: &Path) -> Result<JobId, PipelineError> {
        let src_img = codec.load(filepath)?;
        let job_id = JobId::from_counter(self.next_job_id);
        let job = Job::new(job_id.clone(), filepath, src_img)?;
        self.next_job_id += 1;

        info!(target: "jobs", job_id = %job_id, filepath = %filepath.display(), "job created");
        self.jobs.push(job);
        Ok(job_id)
    }

    /// Registers an externally constructed job.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a job with the same id is already registered.
    pub fn register(&mut self, job: Job) -> Result<(), PipelineError> {
        if self.find(job.job_id()).is_some() {
            return Err(PipelineError::invalid_input(format!(
                "job {} is already registered",
                job.job_id()
            )));
        }
        debug!(target: "jobs", job_id = %job.job_id(), "job registered");
        self.jobs.push(job);
        Ok(())
    }

    /// Removes a job from the store. With `destroy` the job and its images
    /// are dropped; without it the job is handed back to the caller.
    pub fn unregister(&mut self, job_id: &JobId, destroy: bool) -> Result<Option<Job>, PipelineError> {
        let index = self
            .jobs
            .iter()
            .position(|j| j.job_id() == job_id)
            .ok_or_else(|| PipelineError::not_found(format!("no job with id {}", job_id)))?;

        let job = self.jobs.remove(index);
        info!(target: "jobs", job_id = %job_id, destroy, "job unregistered");
        Ok(if destroy { None } else { Some(job) })
    }

    pub fn find(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.job_id() == job_id)
    }

    pub fn find_mut(&mut self, job_id: &JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.job_id() == job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Writes a job's result image to `path` through the codec.
    ///
    /// Fails iff the codec fails; a job that has never succeeded has an
    /// unallocated result image, which the codec refuses to encode.
    pub fn save_result(&self, codec: &dyn ImageCodec, job_id: &JobId, path: &Path) -> Result<(), PipelineError> {
        let job = self
            .find(job_id)
            .ok_or_else(|| PipelineError::not_found(format!("no job with id {}", job_id)))?;
        codec.save(job.result_img(), path)?;
        info!(target: "jobs", job_id = %job_id, path = %path.display(), "result saved");
        Ok(())
    }
}
