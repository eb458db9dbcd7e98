// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end pipeline scenarios: cold runs, cache-served re-runs, resume
//! after argument changes and appended stages, partial stage failure, and
//! the cache write/prelude failure paths. Stages are scripted test modules
//! whose invocation counts the assertions can observe.

use image_pipeline::application::services::{JobStore, PipelineService, StageRegistry};
use image_pipeline::infrastructure::repositories::CacheRoot;
use image_pipeline::infrastructure::services::PngCodec;
use image_pipeline_domain::{
    BuildInfo, Image, ImageCodec, Job, JobId, JobStatus, ModuleLoader, PipelineError,
    StageDescriptor, StageFingerprint, StageInput, StageModule, StageStatus,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Shared handle observing (and steering) one scripted stage module.
#[derive(Clone)]
struct Script {
    delta: u8,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl Script {
    fn new(delta: u8) -> Self {
        Script {
            delta,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

/// Test stage module: adds a delta to every channel byte of every pixel.
/// The delta comes from the `delta` argument when set, the script default
/// otherwise.
struct ScriptedModule {
    descriptor: StageDescriptor,
    script: Script,
}

impl ScriptedModule {
    fn new(name: &str, script: Script) -> Self {
        ScriptedModule {
            descriptor: StageDescriptor {
                name: name.to_string(),
                description: "scripted test stage".to_string(),
                author: "tests".to_string(),
                year: "2025".to_string(),
                valid_args: vec!["delta".to_string()],
                built_against: BuildInfo::current(),
            },
            script,
        }
    }
}

impl StageModule for ScriptedModule {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    fn set_verbose(&mut self, _verbose: bool) {}

    fn setup(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn process(&mut self, input: &mut StageInput<'_>) -> StageStatus {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.fail.load(Ordering::SeqCst) {
            return StageStatus::Error;
        }

        let delta = input
            .arg("delta")
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(self.script.delta);

        input.dst.resize(input.src.width(), input.src.height());
        for (out, px) in input.dst.pixels_mut().iter_mut().zip(input.src.pixels()) {
            let mut channels = px.to_le_bytes();
            for c in &mut channels {
                *c = c.wrapping_add(delta);
            }
            *out = u32::from_le_bytes(channels);
        }
        (input.progress)(100);
        StageStatus::Done
    }

    fn cleanup(&mut self) {}
}

struct ScriptedLoader {
    scripts: HashMap<String, Script>,
}

impl ModuleLoader for ScriptedLoader {
    fn load(&self, _directory: &Path, module_name: &str) -> Result<Box<dyn StageModule>, PipelineError> {
        let script = self
            .scripts
            .get(module_name)
            .ok_or_else(|| PipelineError::not_found(format!("no scripted module {}", module_name)))?;
        Ok(Box::new(ScriptedModule::new(module_name, script.clone())))
    }
}

/// Codec whose saves always fail, for exercising the cache rollback path.
struct FailingSaveCodec(PngCodec);

impl ImageCodec for FailingSaveCodec {
    fn load(&self, path: &Path) -> Result<Image, PipelineError> {
        self.0.load(path)
    }

    fn save(&self, _img: &Image, path: &Path) -> Result<(), PipelineError> {
        Err(PipelineError::io_error(format!("refusing to write {}", path.display())))
    }
}

/// Applies a scripted stage's transform to expected pixel values.
fn shifted(pixels: &[u32], delta: u8) -> Vec<u32> {
    pixels
        .iter()
        .map(|px| {
            let mut channels = px.to_le_bytes();
            for c in &mut channels {
                *c = c.wrapping_add(delta);
            }
            u32::from_le_bytes(channels)
        })
        .collect()
}

struct Harness {
    _dir: TempDir,
    registry: StageRegistry,
    jobs: JobStore,
    engine: PipelineService,
    codec: PngCodec,
    scripts: HashMap<String, Script>,
    src_pixels: Vec<u32>,
    src_path: std::path::PathBuf,
}

impl Harness {
    /// Builds a registry with one scripted stage per `(name, delta)` pair
    /// and one registered job over a 2x2 source image.
    fn new(stages: &[(&str, u8)]) -> (Harness, JobId) {
        Harness::with_loaded(stages, stages.len())
    }

    /// Like [`Harness::new`], but only the first `loaded` modules are
    /// loaded into the registry up front; the rest stay known to the
    /// loader for later `load_stage` calls.
    fn with_loaded(stages: &[(&str, u8)], loaded: usize) -> (Harness, JobId) {
        let dir = TempDir::new().unwrap();
        let codec = PngCodec::new();

        let scripts: HashMap<String, Script> = stages
            .iter()
            .map(|(name, delta)| (name.to_string(), Script::new(*delta)))
            .collect();
        let loader = ScriptedLoader {
            scripts: scripts.clone(),
        };

        let root = CacheRoot::open(dir.path().join("cache"), 8).unwrap();
        let mut registry = StageRegistry::new(Box::new(loader), root, false);
        for (name, _) in &stages[..loaded] {
            registry.load_stage(Path::new("plugins"), name).unwrap();
        }

        let src_pixels = vec![
            u32::from_le_bytes([10, 20, 30, 255]),
            u32::from_le_bytes([0, 0, 0, 255]),
            u32::from_le_bytes([100, 150, 200, 255]),
            u32::from_le_bytes([250, 251, 252, 253]),
        ];
        let src_path = dir.path().join("src.png");
        codec
            .save(&Image::from_pixels(2, 2, src_pixels.clone()).unwrap(), &src_path)
            .unwrap();

        let mut jobs = JobStore::new();
        let job_id = jobs.create_job(&codec, &src_path).unwrap();

        (
            Harness {
                _dir: dir,
                registry,
                jobs,
                engine: PipelineService::new(),
                codec,
                scripts,
                src_pixels,
                src_path,
            },
            job_id,
        )
    }

    fn feed(&mut self, job_id: &JobId) -> Result<(), PipelineError> {
        let job = self.jobs.find_mut(job_id).unwrap();
        self.engine.feed(job, &mut self.registry, &self.codec)
    }

    fn job(&self, job_id: &JobId) -> &Job {
        self.jobs.find(job_id).unwrap()
    }

    fn calls(&self, name: &str) -> usize {
        self.scripts[name].calls()
    }

    fn stage_fingerprint(&self, index: usize) -> StageFingerprint {
        self.registry.get(index).unwrap().fingerprint()
    }

    fn cache_file(&self, index: usize, job_id: &JobId) -> std::path::PathBuf {
        self.registry
            .get(index)
            .unwrap()
            .cache()
            .path_of(job_id.as_str())
            .unwrap()
            .to_path_buf()
    }
}

#[test]
fn cold_run_executes_all_stages_and_fills_caches() {
    // S1: two stages, empty snapshot.
    let (mut h, job_id) = Harness::new(&[("a", 1), ("b", 2)]);

    h.feed(&job_id).unwrap();

    let job = h.job(&job_id);
    assert_eq!(job.status(), JobStatus::Success);
    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 1);

    for index in 0..2 {
        let stage = h.registry.get(index).unwrap();
        assert!(stage.cache().has(job_id.as_str()));
        assert!(stage.cache().path_of(job_id.as_str()).unwrap().is_file());
    }

    let expected: Vec<StageFingerprint> = vec![h.stage_fingerprint(0), h.stage_fingerprint(1)];
    assert_eq!(job.snapshot().iter().copied().collect::<Vec<_>>(), expected);
    assert!(expected.iter().all(|f| f.arg_rev == 0));

    assert_eq!(job.result_img().pixels(), shifted(&shifted(&h.src_pixels, 1), 2));
}

#[test]
fn hot_rerun_is_served_entirely_from_cache() {
    // S2: nothing changed between runs.
    let (mut h, job_id) = Harness::new(&[("a", 1), ("b", 2)]);
    h.feed(&job_id).unwrap();
    let first_result = h.job(&job_id).result_img().clone();
    let first_snapshot = h.job(&job_id).snapshot().clone();

    h.feed(&job_id).unwrap();

    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 1);
    let job = h.job(&job_id);
    assert_eq!(job.status(), JobStatus::Success);
    assert_eq!(job.result_img(), &first_result);
    assert_eq!(job.snapshot(), &first_snapshot);
}

#[test]
fn changing_last_stage_args_reruns_only_that_stage() {
    // S3: bump B's argument revision.
    let (mut h, job_id) = Harness::new(&[("a", 1), ("b", 2)]);
    h.feed(&job_id).unwrap();

    let a_file = h.cache_file(0, &job_id);
    let a_bytes_before = std::fs::read(&a_file).unwrap();

    h.registry.set_arg(1, "delta", "3").unwrap();
    h.feed(&job_id).unwrap();

    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 2);
    assert_eq!(std::fs::read(&a_file).unwrap(), a_bytes_before);

    let job = h.job(&job_id);
    assert_eq!(job.result_img().pixels(), shifted(&shifted(&h.src_pixels, 1), 3));
    let snapshot: Vec<StageFingerprint> = job.snapshot().iter().copied().collect();
    assert_eq!(snapshot[0].arg_rev, 0);
    assert_eq!(snapshot[1].arg_rev, 1);
    // Same cache file name, new contents.
    assert!(h.registry.get(1).unwrap().cache().has(job_id.as_str()));
}

#[test]
fn appending_a_stage_resumes_from_the_old_tail() {
    // S4: load stage C after a successful two-stage run.
    let (mut h, job_id) = Harness::with_loaded(&[("a", 1), ("b", 2), ("c", 4)], 2);
    h.feed(&job_id).unwrap();
    assert_eq!(h.job(&job_id).snapshot().len(), 2);

    h.registry.load_stage(Path::new("plugins"), "c").unwrap();
    h.feed(&job_id).unwrap();

    // A and B were served from cache; only C actually ran.
    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 1);
    assert_eq!(h.calls("c"), 1);

    let job = h.job(&job_id);
    assert_eq!(job.status(), JobStatus::Success);
    assert_eq!(job.snapshot().len(), 3);
    assert_eq!(
        job.result_img().pixels(),
        shifted(&shifted(&shifted(&h.src_pixels, 1), 2), 4)
    );
}

#[test]
fn middle_stage_failure_is_skipped_without_aborting_the_job() {
    // S6: three stages, the middle one fails.
    let (mut h, job_id) = Harness::new(&[("a", 1), ("b", 2), ("c", 4)]);
    h.scripts["b"].set_fail(true);

    h.feed(&job_id).unwrap();

    let job = h.job(&job_id);
    assert_eq!(job.status(), JobStatus::Success);
    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 1);
    assert_eq!(h.calls("c"), 1);

    // The failing stage's cache gained nothing; its input flowed on.
    assert!(!h.registry.get(1).unwrap().cache().has(job_id.as_str()));
    assert_eq!(job.result_img().pixels(), shifted(&shifted(&h.src_pixels, 1), 4));
}

#[test]
fn pipeline_is_deterministic_for_a_fixed_registry() {
    // Two jobs over the same source through the same registry state.
    let (mut h, job_a) = Harness::new(&[("a", 1), ("b", 2)]);
    let job_b = h.jobs.create_job(&h.codec, &h.src_path.clone()).unwrap();

    h.feed(&job_a).unwrap();
    h.feed(&job_b).unwrap();

    assert_eq!(
        h.job(&job_a).result_img(),
        h.job(&job_b).result_img()
    );
}

#[test]
fn empty_pipeline_feed_is_invalid_input() {
    let (mut h, job_id) = Harness::new(&[]);
    let err = h.feed(&job_id).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(h.job(&job_id).status(), JobStatus::Pending);
}

#[test]
fn failed_cache_write_rolls_back_the_index_entry() {
    let (mut h, job_id) = Harness::new(&[("a", 1)]);
    let failing = FailingSaveCodec(PngCodec::new());

    let job = h.jobs.find_mut(&job_id).unwrap();
    let err = h.engine.feed(job, &mut h.registry, &failing).unwrap_err();

    assert!(matches!(err, PipelineError::IoError(_)));
    assert_eq!(h.job(&job_id).status(), JobStatus::Fail);
    // The registration was rolled back: no index entry, index still a
    // subset of the on-disk file set.
    let cache = h.registry.get(0).unwrap().cache();
    assert!(!cache.has(job_id.as_str()));
    cache.verify_consistency().unwrap();
}

#[test]
fn prelude_load_failure_marks_the_job_failed() {
    // Cache index says the file is there; the disk disagrees.
    let (mut h, job_id) = Harness::new(&[("a", 1), ("b", 2)]);
    h.feed(&job_id).unwrap();

    std::fs::remove_file(h.cache_file(1, &job_id)).unwrap();
    let err = h.feed(&job_id).unwrap_err();

    assert!(matches!(err, PipelineError::IoError(_) | PipelineError::CodecError(_)));
    assert_eq!(h.job(&job_id).status(), JobStatus::Fail);
    // The scripted stages were never re-run.
    assert_eq!(h.calls("a"), 1);
    assert_eq!(h.calls("b"), 1);
}
