// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Engine
//!
//! Streams a job's image through the registered stages in order, writing
//! each stage's output into that stage's cache, and skips every prefix of
//! the pipeline whose cached output is still trustworthy.
//!
//! ## Resume Point
//!
//! Against the job's snapshot of the last successful run, a stage index is
//! *changed* when its UID differs, its argument revision differs, or its
//! cache no longer holds a file for the job. The engine resumes at the
//! **earliest** changed index within the compared prefix - any change at
//! index `k` invalidates every cached output at indices `>= k`, so nothing
//! later can be reused. When nothing changed, the resume point is the full
//! compared length and the run is served from cache alone.
//!
//! ## Partial Failure
//!
//! A stage returning a non-`Done` status is logged and skipped; its input
//! image carries forward unchanged into the next stage and its cache gains
//! no entry for the job. The job can still finish `Success`. Resource and
//! consistency failures, by contrast, abort the run with the job marked
//! `Fail`.
//!
//! ## Observability
//!
//! The engine keeps one [`PipelineStatus`] (progress percentage, current
//! stage, current job) and fires registered callbacks synchronously at
//! stage boundaries and whenever a stage's progress reports change the
//! stored value. Callbacks must not call back into the engine.

use crate::application::services::stage_registry::{StageInstance, StageRegistry};
use image_pipeline_domain::{
    Image, ImageCodec, Job, JobId, JobStatus, PipelineError, PipelineSnapshot, StageFingerprint,
    StageStatus, StageUid,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Observable state of the engine.
#[derive(Debug, Clone, Default)]
pub struct PipelineStatus {
    /// Progress of the stage currently processing, `0..=100`.
    pub progress: u8,
    pub current_stage: Option<StageUid>,
    pub current_job: Option<JobId>,
}

/// Status callback signature. Plain function pointers: they are comparable
/// (so unregistration can match them) and cannot capture the engine they
/// would be forbidden from re-entering.
pub type StatusCallback = fn(&PipelineStatus);

/// The pipeline engine.
#[derive(Debug, Default)]
pub struct PipelineService {
    status: PipelineStatus,
    callbacks: Vec<StatusCallback>,
}

/// Picks the resume point from the previous snapshot and the observed
/// per-stage state. `observed` holds, for each compared index, the stage's
/// current fingerprint and whether its cache still has the job's file; the
/// caller truncates it to `min(prev.len(), stage_count)` entries.
///
/// Returns the earliest changed index, or `observed.len()` when the whole
/// compared prefix is intact. An empty snapshot always resumes at zero.
pub(crate) fn first_changed(prev: &PipelineSnapshot, observed: &[(StageFingerprint, bool)]) -> usize {
    if prev.is_empty() {
        return 0;
    }
    for (i, (current, cached)) in observed.iter().enumerate() {
        let recorded = match prev.get(i) {
            Some(f) => f,
            None => return i,
        };
        if current.uid != recorded.uid || current.arg_rev != recorded.arg_rev || !cached {
            debug!(target: "pipeline", first_changed = i, "resume point found");
            return i;
        }
    }
    observed.len()
}

impl PipelineService {
    pub fn new() -> Self {
        PipelineService {
            status: PipelineStatus::default(),
            callbacks: Vec::new(),
        }
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    /// Registers a status callback. Callbacks run synchronously on the
    /// engine thread, in registration order.
    pub fn register_callback(&mut self, callback: StatusCallback) {
        debug!(target: "pipeline", "registering status callback");
        self.callbacks.push(callback);
    }

    /// Unregisters every entry matching `callback`. Unregistering a
    /// function that was never registered succeeds as a no-op.
    #[allow(unpredictable_function_pointer_comparisons)]
    pub fn unregister_callback(&mut self, callback: StatusCallback) {
        debug!(target: "pipeline", "unregistering status callback");
        self.callbacks.retain(|cb| *cb != callback);
    }

    /// Feeds a job through the pipeline. On return the job's status is the
    /// canonical outcome: `Success` when a result image was materialised,
    /// `Fail` when the run aborted.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the pipeline has no stages (the job status is
    /// left untouched); otherwise any resource, codec, or consistency
    /// failure aborts the run with the job marked `Fail`. Stage failures
    /// are not errors - the failing stage is skipped.
    pub fn feed(
        &mut self,
        job: &mut Job,
        registry: &mut StageRegistry,
        codec: &dyn ImageCodec,
    ) -> Result<(), PipelineError> {
        if registry.is_empty() {
            return Err(PipelineError::invalid_input("pipeline has no stages"));
        }

        // Pessimistic until the result image is materialised.
        job.set_status(JobStatus::Fail);

        let stage_count = registry.count();
        let first = self.resume_point(job, registry);
        info!(target: "pipeline", job_id = %job.job_id(), first, stage_count, "feeding job");

        let mut working = if first > 0 {
            self.load_prelude(job, registry, codec, first)?
        } else {
            job.src_img().clone()
        };

        for index in first..stage_count {
            match self.run_stage(job, registry, codec, index, &working)? {
                Some(output) => working = output,
                // Failed stage: its input carries forward unchanged.
                None => continue,
            }
        }

        job.store_result(&working)?;
        job.update_snapshot(PipelineSnapshot::from_fingerprints(registry.fingerprints()));
        info!(target: "pipeline", job_id = %job.job_id(), "job finished");
        Ok(())
    }

    /// Computes the resume point for `job` against the live registry.
    fn resume_point(&self, job: &Job, registry: &StageRegistry) -> usize {
        let prev = job.snapshot();
        let compared = prev.len().min(registry.count());
        let observed: Vec<(StageFingerprint, bool)> = registry
            .iter()
            .take(compared)
            .map(|stage| (stage.fingerprint(), stage.cache().has(job.job_id().as_str())))
            .collect();
        first_changed(prev, &observed)
    }

    /// Loads the cached output of the last unchanged stage as the working
    /// input. A failed load aborts the job.
    fn load_prelude(
        &self,
        job: &Job,
        registry: &StageRegistry,
        codec: &dyn ImageCodec,
        first: usize,
    ) -> Result<Image, PipelineError> {
        let stage = registry
            .get(first - 1)
            .ok_or_else(|| PipelineError::internal_error("resume point outside the stage list"))?;
        let path = stage
            .cache()
            .path_of(job.job_id().as_str())
            .ok_or_else(|| {
                PipelineError::consistency_violation(format!(
                    "cache {} lost its entry for job {} between resume-point computation and load",
                    stage.cache().name(),
                    job.job_id()
                ))
            })?
            .to_path_buf();

        debug!(target: "pipeline", path = %path.display(), "loading image from cache");
        codec.load(&path).map_err(|e| {
            error!(target: "pipeline", job_id = %job.job_id(), error = %e, "cache prelude load failed");
            e
        })
    }

    /// Runs one stage. Returns the stage's output image, or `None` when
    /// the stage failed and is skipped.
    fn run_stage(
        &mut self,
        job: &Job,
        registry: &mut StageRegistry,
        codec: &dyn ImageCodec,
        index: usize,
        working: &Image,
    ) -> Result<Option<Image>, PipelineError> {
        let stage = registry
            .get_mut(index)
            .ok_or_else(|| PipelineError::internal_error("stage index outside the stage list"))?;

        // Stage boundary: reset progress and repoint the status.
        self.status.progress = 0;
        self.status.current_stage = Some(stage.uid());
        self.status.current_job = Some(job.job_id().clone());
        self.fire_callbacks();

        debug!(target: "pipeline", index, stage = %stage.descriptor().name, "feeding image data to stage");
        let mut output = Image::empty();
        let started = Instant::now();

        let status = {
            let PipelineService { status, callbacks } = self;
            let mut progress = |value: u8| apply_progress(status, callbacks.as_slice(), value);
            stage.feed(working, &mut output, &mut progress)
        };

        if status != StageStatus::Done {
            warn!(
                target: "pipeline",
                index,
                stage = %stage.descriptor().name,
                code = status.code(),
                "stage failed, skipping"
            );
            return Ok(None);
        }

        let elapsed = started.elapsed();
        let throughput_bps = if elapsed.as_secs_f64() > 0.0 {
            (working.byte_len() as f64 / elapsed.as_secs_f64()).round() as u64
        } else {
            0
        };
        debug!(
            target: "pipeline",
            index,
            elapsed_s = elapsed.as_secs_f64(),
            throughput_bps,
            "stage processed"
        );

        self.write_cache(job, stage, codec, &output)?;
        Ok(Some(output))
    }

    /// Persists a stage's output under the job's id, rolling the index
    /// entry back when the write fails.
    fn write_cache(
        &self,
        job: &Job,
        stage: &mut StageInstance,
        codec: &dyn ImageCodec,
        output: &Image,
    ) -> Result<(), PipelineError> {
        let fname = job.job_id().as_str();
        let path = stage.cache_mut().register(fname, true)?.fpath().to_path_buf();

        debug!(target: "pipeline", path = %path.display(), "cache image");
        if let Err(e) = codec.save(output, &path) {
            error!(target: "pipeline", error = %e, "failed to write cache file");
            if let Err(unreg) = stage.cache_mut().unregister(fname) {
                warn!(target: "pipeline", error = %unreg, "failed to unregister cache file");
            }
            return Err(e);
        }
        Ok(())
    }

    fn fire_callbacks(&self) {
        for callback in &self.callbacks {
            callback(&self.status);
        }
    }
}

/// Applies one progress report: clamps to 100, and fires the callbacks
/// only when the stored value actually changes.
fn apply_progress(status: &mut PipelineStatus, callbacks: &[StatusCallback], value: u8) {
    let clamped = value.min(100);
    if clamped != status.progress {
        status.progress = clamped;
        for callback in callbacks {
            callback(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_pipeline_domain::StageUid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fp(uid: u64, arg_rev: u64) -> StageFingerprint {
        StageFingerprint::new(StageUid::new(uid), arg_rev)
    }

    fn snapshot(fps: &[(u64, u64)]) -> PipelineSnapshot {
        PipelineSnapshot::from_fingerprints(fps.iter().map(|&(u, r)| fp(u, r)).collect())
    }

    #[test]
    fn test_first_changed_empty_snapshot_resumes_at_zero() {
        assert_eq!(first_changed(&PipelineSnapshot::empty(), &[]), 0);
        assert_eq!(first_changed(&PipelineSnapshot::empty(), &[(fp(0, 0), true)]), 0);
    }

    #[test]
    fn test_first_changed_intact_prefix_resumes_past_it() {
        let prev = snapshot(&[(0, 0), (1, 0)]);
        let observed = vec![(fp(0, 0), true), (fp(1, 0), true)];
        assert_eq!(first_changed(&prev, &observed), 2);
    }

    #[test]
    fn test_first_changed_detects_arg_revision_change() {
        let prev = snapshot(&[(0, 0), (1, 0)]);
        let observed = vec![(fp(0, 0), true), (fp(1, 1), true)];
        assert_eq!(first_changed(&prev, &observed), 1);
    }

    #[test]
    fn test_first_changed_detects_uid_change() {
        let prev = snapshot(&[(0, 0), (1, 0)]);
        let observed = vec![(fp(5, 0), true), (fp(1, 0), true)];
        assert_eq!(first_changed(&prev, &observed), 0);
    }

    #[test]
    fn test_first_changed_detects_missing_cache_file() {
        let prev = snapshot(&[(0, 0), (1, 0)]);
        let observed = vec![(fp(0, 0), true), (fp(1, 0), false)];
        assert_eq!(first_changed(&prev, &observed), 1);
    }

    /// Regression: with changes at several indices the earliest one wins.
    /// Resuming at any later index would reuse cache entries the earlier
    /// change already invalidated.
    #[test]
    fn test_first_changed_picks_earliest_mismatch() {
        let prev = snapshot(&[(0, 0), (1, 0), (2, 0)]);
        let observed = vec![(fp(0, 1), true), (fp(1, 2), true), (fp(2, 0), true)];
        assert_eq!(first_changed(&prev, &observed), 0);

        let observed = vec![(fp(0, 0), true), (fp(1, 2), false), (fp(2, 9), true)];
        assert_eq!(first_changed(&prev, &observed), 1);
    }

    #[test]
    fn test_first_changed_with_appended_stage_resumes_after_prefix() {
        // Snapshot has two stages, registry now has three; only the first
        // two are compared and both are intact.
        let prev = snapshot(&[(0, 0), (1, 0)]);
        let observed = vec![(fp(0, 0), true), (fp(1, 0), true)];
        assert_eq!(first_changed(&prev, &observed), 2);
    }

    #[test]
    fn test_apply_progress_clamps_and_fires_on_change_only() {
        static FIRED: AtomicUsize = AtomicUsize::new(0);
        fn count(_status: &PipelineStatus) {
            FIRED.fetch_add(1, Ordering::SeqCst);
        }

        let mut status = PipelineStatus::default();
        let callbacks: Vec<StatusCallback> = vec![count];

        FIRED.store(0, Ordering::SeqCst);
        apply_progress(&mut status, &callbacks, 40);
        assert_eq!(status.progress, 40);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);

        // Same value: no change, no callback.
        apply_progress(&mut status, &callbacks, 40);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);

        // Out-of-range values clamp to 100.
        apply_progress(&mut status, &callbacks, 250);
        assert_eq!(status.progress, 100);
        assert_eq!(FIRED.load(Ordering::SeqCst), 2);

        // Clamped repeat of 100: still no change.
        apply_progress(&mut status, &callbacks, 180);
        assert_eq!(FIRED.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregister_removes_all_matching_entries() {
        fn cb_a(_status: &PipelineStatus) {}
        fn cb_b(_status: &PipelineStatus) {}

        let mut engine = PipelineService::new();
        engine.register_callback(cb_a);
        engine.register_callback(cb_b);
        engine.register_callback(cb_a);
        assert_eq!(engine.callbacks.len(), 3);

        engine.unregister_callback(cb_a);
        assert_eq!(engine.callbacks.len(), 1);

        // Unregistering an unknown callback succeeds as a no-op.
        engine.unregister_callback(cb_a);
        assert_eq!(engine.callbacks.len(), 1);
    }
}
