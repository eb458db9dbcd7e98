// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Drives the full stack - shell command parsing, core, builtin modules,
//! caches, codec - through a scripted command session.

use image_pipeline::infrastructure::config::AppConfig;
use image_pipeline::infrastructure::services::PngCodec;
use image_pipeline::infrastructure::stages::BuiltinLoader;
use image_pipeline::presentation::Shell;
use image_pipeline::{Core, CoreOptions};
use image_pipeline_domain::{Image, ImageCodec};
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

fn px(channels: [u8; 4]) -> u32 {
    u32::from_le_bytes(channels)
}

#[test]
fn scripted_session_processes_and_saves_a_job() {
    let dir = TempDir::new().unwrap();
    let codec = PngCodec::new();

    let src_path = dir.path().join("src.png");
    let src = Image::from_pixels(2, 1, vec![px([100, 150, 200, 255]), px([0, 10, 20, 30])]).unwrap();
    codec.save(&src, &src_path).unwrap();
    let out_path = dir.path().join("out.png");

    let config = AppConfig {
        cache_root: dir.path().join("cache"),
        cache_default_max_files: 4,
    };
    let core = Core::setup(
        &config,
        Box::new(BuiltinLoader::new()),
        Arc::new(PngCodec::new()),
        CoreOptions::default(),
    )
    .unwrap();
    let core = Arc::new(Mutex::new(core));

    let session = format!(
        "stage load plugins invert\n\
         stage load plugins brightness\n\
         stage set-arg 1 amount 10\n\
         job create {src}\n\
         job feed 0\n\
         stage list\n\
         job list\n\
         cache dump all\n\
         job save 0 {out}\n\
         help\n\
         exit\n",
        src = src_path.display(),
        out = out_path.display()
    );
    Shell::new(Arc::clone(&core)).run(Cursor::new(session));

    // invert then brightness(+10): RGB transformed with saturation, alpha
    // untouched by both stages.
    let result = codec.load(&out_path).unwrap();
    assert_eq!(
        result.pixels(),
        &[px([165, 115, 65, 255]), px([255, 255, 245, 30])]
    );

    {
        let core = core.lock();
        assert_eq!(core.registry().count(), 2);
        for stage in core.registry().iter() {
            assert!(stage.cache().has("0"));
            stage.cache().verify_consistency().unwrap();
        }
        assert_eq!(core.jobs().len(), 1);
    }

    let cache_root = config.cache_root.clone();
    match Arc::try_unwrap(core) {
        Ok(mutex) => mutex.into_inner().cleanup(),
        Err(_) => panic!("core still shared"),
    }
    // Default options delete every cache directory at teardown.
    assert_eq!(std::fs::read_dir(&cache_root).unwrap().count(), 0);
}

#[test]
fn unknown_and_malformed_commands_do_not_kill_the_session() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        cache_root: dir.path().join("cache"),
        cache_default_max_files: 4,
    };
    let core = Core::setup(
        &config,
        Box::new(BuiltinLoader::new()),
        Arc::new(PngCodec::new()),
        CoreOptions::default(),
    )
    .unwrap();
    let core = Arc::new(Mutex::new(core));

    let session = "frobnicate\n\
                   stage load plugins\n\
                   stage set-arg zero amount 1\n\
                   job feed 99\n\
                   stage load plugins invert\n\
                   exit\n";
    Shell::new(Arc::clone(&core)).run(Cursor::new(session));

    // The one well-formed command still took effect.
    assert_eq!(core.lock().registry().count(), 1);
}
