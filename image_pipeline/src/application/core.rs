// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Context
//!
//! One value owning every pipeline singleton: the stage registry, the job
//! store, and the engine, wired to the codec and loader collaborators.
//! Every entry point the shell exposes goes through here, and the shell
//! holds the whole context behind one coarse lock - core entry points are
//! not safe to call concurrently with pipeline execution, so the lock is
//! held for the duration of each command, `feed_job` included.

use crate::application::services::{JobStore, PipelineService, StageRegistry};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::repositories::CacheRoot;
use image_pipeline_domain::{ImageCodec, JobId, JobStatus, ModuleLoader, PipelineError, StageUid};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Behavioural switches read from the CLI collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreOptions {
    /// Propagated into every loaded stage module at load time.
    pub verbose: bool,
    /// Consulted once, at teardown: leave cache directories in place.
    pub preserve_cache: bool,
}

/// The assembled core: registry, job store, and engine.
pub struct Core {
    registry: StageRegistry,
    jobs: JobStore,
    engine: PipelineService,
    codec: Arc<dyn ImageCodec>,
    preserve_cache: bool,
}

impl Core {
    /// Wires the core together: opens the cache root from configuration
    /// and builds an empty registry and job store around it.
    pub fn setup(
        config: &AppConfig,
        loader: Box<dyn ModuleLoader>,
        codec: Arc<dyn ImageCodec>,
        options: CoreOptions,
    ) -> Result<Self, PipelineError> {
        info!(target: "pipeline", cache_root = %config.cache_root.display(), "core setup");
        let cache_root = CacheRoot::open(&config.cache_root, config.cache_default_max_files)?;
        Ok(Core {
            registry: StageRegistry::new(loader, cache_root, options.verbose),
            jobs: JobStore::new(),
            engine: PipelineService::new(),
            codec,
            preserve_cache: options.preserve_cache,
        })
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub fn engine(&self) -> &PipelineService {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PipelineService {
        &mut self.engine
    }

    pub fn load_stage(&mut self, directory: &Path, module_name: &str) -> Result<StageUid, PipelineError> {
        self.registry.load_stage(directory, module_name)
    }

    pub fn set_stage_arg(&mut self, index: usize, name: &str, value: &str) -> Result<(), PipelineError> {
        self.registry.set_arg(index, name, value)
    }

    pub fn create_job(&mut self, filepath: &Path) -> Result<JobId, PipelineError> {
        self.jobs.create_job(self.codec.as_ref(), filepath)
    }

    /// Feeds a job through the pipeline and reports its resulting status.
    pub fn feed_job(&mut self, job_id: &JobId) -> Result<JobStatus, PipelineError> {
        let Core {
            registry,
            jobs,
            engine,
            codec,
            ..
        } = self;
        let job = jobs
            .find_mut(job_id)
            .ok_or_else(|| PipelineError::not_found(format!("no job with id {}", job_id)))?;
        engine.feed(job, registry, codec.as_ref())?;
        Ok(job.status())
    }

    pub fn save_job(&self, job_id: &JobId, path: &Path) -> Result<(), PipelineError> {
        self.jobs.save_result(self.codec.as_ref(), job_id, path)
    }

    pub fn delete_job(&mut self, job_id: &JobId) -> Result<(), PipelineError> {
        self.jobs.unregister(job_id, true).map(|_| ())
    }

    /// Deletes one file from a named stage cache (index and disk).
    pub fn delete_cache_file(&mut self, cache_name: &str, fname: &str) -> Result<(), PipelineError> {
        let cache = self
            .registry
            .cache_by_name_mut(cache_name)
            .ok_or_else(|| PipelineError::not_found(format!("no cache named {}", cache_name)))?;
        cache.delete(fname)
    }

    /// Tears the core down in dependency order: modules and their caches
    /// first (honouring the preserve-cache flag), then the jobs.
    pub fn cleanup(mut self) {
        info!(target: "pipeline", preserve_cache = self.preserve_cache, "core cleanup");
        self.registry.cleanup(self.preserve_cache);
    }
}
