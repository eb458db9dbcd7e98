// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Registry
//!
//! The ordered list of loaded stage instances and the identity model the
//! cache resume logic is built on. Loading a module assigns the instance a
//! fresh process-unique UID, creates its private cache named
//! `"{module_name}-{uid}"`, and appends it at the end; order never changes
//! afterwards and stages are not removable at runtime.
//!
//! Every argument mutation bumps the instance's argument revision by one.
//! The `(uid, arg_rev)` pair is what jobs snapshot after a successful run -
//! if either differs on the next run, the stage's cached output for that
//! job can no longer be trusted.

use crate::infrastructure::repositories::{Cache, CacheRoot};
use image_pipeline_domain::{
    BuildInfo, Image, ModuleLoader, PipelineError, StageArgs, StageDescriptor, StageFingerprint,
    StageInput, StageModule, StageStatus, StageUid,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Source of stage UIDs: strictly increasing for the process lifetime,
/// never reused, shared by every registry in the process.
static NEXT_STAGE_UID: AtomicU64 = AtomicU64::new(0);

/// One configured use of a stage module in the pipeline.
pub struct StageInstance {
    uid: StageUid,
    module: Box<dyn StageModule>,
    args: StageArgs,
    arg_rev: u64,
    cache: Cache,
}

impl StageInstance {
    pub fn uid(&self) -> StageUid {
        self.uid
    }

    pub fn descriptor(&self) -> &StageDescriptor {
        self.module.descriptor()
    }

    pub fn args(&self) -> &StageArgs {
        &self.args
    }

    pub fn arg_rev(&self) -> u64 {
        self.arg_rev
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    /// The `(uid, arg_rev)` identity jobs snapshot after a run.
    pub fn fingerprint(&self) -> StageFingerprint {
        StageFingerprint::new(self.uid, self.arg_rev)
    }

    /// Runs the module's processing hook against the instance's current
    /// argument list.
    pub fn feed(&mut self, src: &Image, dst: &mut Image, progress: &mut dyn FnMut(u8)) -> StageStatus {
        let mut input = StageInput {
            src,
            dst,
            args: self.args.pairs(),
            progress,
        };
        self.module.process(&mut input)
    }
}

impl std::fmt::Debug for StageInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageInstance")
            .field("uid", &self.uid)
            .field("name", &self.descriptor().name)
            .field("arg_rev", &self.arg_rev)
            .field("cache", &self.cache.name())
            .finish()
    }
}

/// Ordered registry of stage instances.
pub struct StageRegistry {
    loader: Box<dyn ModuleLoader>,
    cache_root: CacheRoot,
    stages: Vec<StageInstance>,
    core_build: BuildInfo,
    verbose: bool,
}

impl StageRegistry {
    pub fn new(loader: Box<dyn ModuleLoader>, cache_root: CacheRoot, verbose: bool) -> Self {
        StageRegistry {
            loader,
            cache_root,
            stages: Vec::new(),
            core_build: BuildInfo::current(),
            verbose,
        }
    }

    /// Resolves and registers a stage module.
    ///
    /// The module's declared build is checked against the running core
    /// before anything is registered; an incompatible module is refused
    /// with `AbiMismatch`. On success the instance sits at the end of the
    /// stage list with a fresh UID, an empty argument list, revision zero,
    /// and a newly created cache.
    ///
    /// # Errors
    ///
    /// Any failure leaves the registry without a partial registration.
    pub fn load_stage(&mut self, directory: &Path, module_name: &str) -> Result<StageUid, PipelineError> {
        info!(target: "registry", module_name, directory = %directory.display(), "loading stage module");

        let mut module = self.loader.load(directory, module_name)?;
        let descriptor = module.descriptor();

        if let Err(mismatch) = descriptor.built_against.compare_critical(&self.core_build) {
            error!(target: "registry", module_name, %mismatch, "refusing incompatible module");
            return Err(PipelineError::abi_mismatch(format!("module {}: {}", module_name, mismatch)));
        }

        let uid = StageUid::new(NEXT_STAGE_UID.fetch_add(1, Ordering::Relaxed));
        let cache_name = format!("{}-{}", descriptor.name, uid);
        let cache = self.cache_root.create_cache(&cache_name)?;

        module.set_verbose(self.verbose);
        if let Err(e) = module.setup() {
            // Roll the cache back so the failed load leaves no trace.
            if let Err(destroy_err) = cache.destroy(true) {
                warn!(target: "registry", %destroy_err, "failed to remove cache of unloadable module");
            }
            return Err(e);
        }

        self.stages.push(StageInstance {
            uid,
            module,
            args: StageArgs::new(),
            arg_rev: 0,
            cache,
        });
        info!(target: "registry", module_name, %uid, cache = %cache_name, "stage loaded");
        Ok(uid)
    }

    pub fn count(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StageInstance> {
        self.stages.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut StageInstance> {
        self.stages.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageInstance> {
        self.stages.iter()
    }

    /// Sets one argument on the stage at `index`.
    ///
    /// The name must be among the module's declared valid arguments. Both
    /// adding and replacing bump the argument revision by exactly one.
    pub fn set_arg(&mut self, index: usize, name: &str, value: &str) -> Result<(), PipelineError> {
        let stage = self
            .stages
            .get_mut(index)
            .ok_or_else(|| PipelineError::invalid_input(format!("no stage at index {}", index)))?;

        if !stage.module.descriptor().accepts_arg(name) {
            return Err(PipelineError::invalid_input(format!(
                "stage {} does not accept argument '{}'",
                stage.module.descriptor().name,
                name
            )));
        }

        let mutation = stage.args.set(name, value);
        stage.arg_rev += 1;
        info!(
            target: "registry",
            stage = %stage.module.descriptor().name,
            uid = %stage.uid,
            name,
            value,
            ?mutation,
            arg_rev = stage.arg_rev,
            "argument set"
        );
        Ok(())
    }

    /// Checks whether the stage at `index` accepts `name` as an argument.
    pub fn has_arg(&self, index: usize, name: &str) -> bool {
        self.stages
            .get(index)
            .map(|s| s.module.descriptor().accepts_arg(name))
            .unwrap_or(false)
    }

    /// Delegates one input packet to the stage at `index`. An out-of-range
    /// index reports `Error`, the skip-this-stage status.
    pub fn feed(&mut self, index: usize, src: &Image, dst: &mut Image, progress: &mut dyn FnMut(u8)) -> StageStatus {
        match self.stages.get_mut(index) {
            Some(stage) => stage.feed(src, dst, progress),
            None => StageStatus::Error,
        }
    }

    /// Current `(uid, arg_rev)` identity of every stage, in order.
    pub fn fingerprints(&self) -> Vec<StageFingerprint> {
        self.stages.iter().map(StageInstance::fingerprint).collect()
    }

    /// Finds a stage's cache by cache name.
    pub fn cache_by_name_mut(&mut self, name: &str) -> Option<&mut Cache> {
        self.stages
            .iter_mut()
            .map(|s| &mut s.cache)
            .find(|c| c.name() == name)
    }

    /// Tears the registry down: runs every module's cleanup hook and
    /// destroys every cache, deleting files unless `preserve_cache` is set.
    pub fn cleanup(&mut self, preserve_cache: bool) {
        info!(target: "registry", preserve_cache, stages = self.stages.len(), "registry cleanup");
        for mut stage in self.stages.drain(..) {
            stage.module.cleanup();
            if let Err(e) = stage.cache.destroy(!preserve_cache) {
                warn!(target: "registry", error = %e, "failed to destroy stage cache");
            }
        }
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.stages)
            .field("verbose", &self.verbose)
            .finish()
    }
}
