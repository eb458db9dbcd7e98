// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Interactive Shell
//!
//! A line-oriented command shell on stdin, running on its own thread.
//! Commands are matched against a prototype table where `%s` marks a
//! free-form token; the first fully matching prototype wins and extra
//! trailing tokens are discarded with a notice.
//!
//! Every command takes the coarse core lock for its whole duration -
//! including `job feed`, which holds it across the entire pipeline run.
//! Core entry points are not safe to call concurrently, and this lock is
//! what serialises the shell against the engine.

use crate::application::Core;
use image_pipeline_domain::{JobId, PipelineError};
use parking_lot::Mutex;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// One command prototype: the keyword/wildcard tokens and its help line.
struct CommandProto {
    tokens: &'static [&'static str],
    help: &'static str,
}

const PROTOTYPES: &[CommandProto] = &[
    CommandProto {
        tokens: &["stage", "load", "%s", "%s"],
        help: "stage load <directory> <module>  -------  Load the stage module <module> from <directory>.",
    },
    CommandProto {
        tokens: &["stage", "list"],
        help: "stage list  ----------------------------  List all loaded stage instances.",
    },
    CommandProto {
        tokens: &["stage", "set-arg", "%s", "%s", "%s"],
        help: "stage set-arg <index> <arg> <value>  ---  Set the argument <arg> to <value> for the stage at <index>.",
    },
    CommandProto {
        tokens: &["job", "create", "%s"],
        help: "job create <filepath>  -----------------  Create a job for the image at <filepath>.",
    },
    CommandProto {
        tokens: &["job", "feed", "%s"],
        help: "job feed <id>  -------------------------  Feed the job <id> through the pipeline.",
    },
    CommandProto {
        tokens: &["job", "save", "%s", "%s"],
        help: "job save <id> <filepath>  --------------  Save the result image of job <id> to <filepath>.",
    },
    CommandProto {
        tokens: &["job", "delete", "%s"],
        help: "job delete <id>  -----------------------  Delete the job <id>.",
    },
    CommandProto {
        tokens: &["job", "list"],
        help: "job list  ------------------------------  List all jobs.",
    },
    CommandProto {
        tokens: &["cache", "dump", "all"],
        help: "cache dump all  ------------------------  Dump information about every stage cache.",
    },
    CommandProto {
        tokens: &["cache", "file", "delete", "%s", "%s"],
        help: "cache file delete <cache> <fname>  -----  Delete the file <fname> from <cache>.",
    },
    CommandProto {
        tokens: &["help"],
        help: "help  ----------------------------------  Print this help.",
    },
    CommandProto {
        tokens: &["exit"],
        help: "exit  ----------------------------------  Exit the program.",
    },
];

/// Finds the first prototype every token of which matches.
fn match_prototype(tokens: &[&str]) -> Option<usize> {
    PROTOTYPES.iter().position(|proto| {
        tokens.len() >= proto.tokens.len()
            && proto
                .tokens
                .iter()
                .zip(tokens)
                .all(|(expected, actual)| *expected == "%s" || expected == actual)
    })
}

/// The interactive shell, holding the core behind its coarse lock.
pub struct Shell {
    core: Arc<Mutex<Core>>,
}

impl Shell {
    pub fn new(core: Arc<Mutex<Core>>) -> Self {
        Shell { core }
    }

    /// Spawns the shell loop on its own thread.
    pub fn spawn(self) -> Result<JoinHandle<()>, PipelineError> {
        thread::Builder::new()
            .name("shell".to_string())
            .spawn(move || self.run(io::stdin().lock()))
            .map_err(|e| PipelineError::internal_error(format!("failed to spawn shell thread: {}", e)))
    }

    /// Runs the command loop until `exit` or end of input.
    pub fn run(&self, input: impl BufRead) {
        debug!(target: "shell", "shell thread started");
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(target: "shell", error = %e, "failed to read command line");
                    break;
                }
            };
            if !self.dispatch(&line) {
                break;
            }
        }
        debug!(target: "shell", "shell thread finished");
    }

    /// Parses and executes one command line. Returns `false` on `exit`.
    pub fn dispatch(&self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return true;
        }

        let proto = match match_prototype(&tokens) {
            Some(p) => p,
            None => {
                println!("Unknown command. Type 'help' for the command list.");
                return true;
            }
        };
        for extra in &tokens[PROTOTYPES[proto].tokens.len()..] {
            println!("Trailing argument '{}' discarded.", extra);
        }

        match PROTOTYPES[proto].tokens {
            ["stage", "load", ..] => self.report(self.stage_load(tokens[2], tokens[3])),
            ["stage", "list"] => self.stage_list(),
            ["stage", "set-arg", ..] => self.report(self.stage_set_arg(tokens[2], tokens[3], tokens[4])),
            ["job", "create", ..] => self.report(self.job_create(tokens[2])),
            ["job", "feed", ..] => self.report(self.job_feed(tokens[2])),
            ["job", "save", ..] => self.report(self.job_save(tokens[2], tokens[3])),
            ["job", "delete", ..] => self.report(self.job_delete(tokens[2])),
            ["job", "list"] => self.job_list(),
            ["cache", "dump", "all"] => self.cache_dump_all(),
            ["cache", "file", "delete", ..] => self.report(self.cache_file_delete(tokens[3], tokens[4])),
            ["help"] => self.print_help(),
            ["exit"] => return false,
            _ => println!("Unknown command. Type 'help' for the command list."),
        }
        true
    }

    fn report(&self, result: Result<(), PipelineError>) {
        if let Err(e) = result {
            println!("Error: {}", e);
        }
    }

    fn stage_load(&self, directory: &str, module: &str) -> Result<(), PipelineError> {
        let uid = self.core.lock().load_stage(Path::new(directory), module)?;
        println!("Loaded stage module '{}' with uid {}.", module, uid);
        Ok(())
    }

    fn stage_list(&self) {
        let core = self.core.lock();
        println!();
        for (index, stage) in core.registry().iter().enumerate() {
            let descr = stage.descriptor();
            println!("[{}] {}:", index, descr.name);
            println!("    Descr:           {}", descr.description);
            println!("    Author:          {}", descr.author);
            println!("    Year:            {}", descr.year);
            println!("    Built against:   {}", descr.built_against);
            println!("    Args:");
            for (name, value) in stage.args().pairs() {
                println!("        {}: {}", name, value);
            }
            println!("    Cache name:      {}", stage.cache().name());
            println!("    Cache path:      {}", stage.cache().path().display());
            println!("    UID:             {}", stage.uid());
            println!("    Arg rev:         {}", stage.arg_rev());
        }
        println!();
    }

    fn stage_set_arg(&self, index: &str, name: &str, value: &str) -> Result<(), PipelineError> {
        let index: usize = index
            .parse()
            .map_err(|_| PipelineError::invalid_input(format!("'{}' is not a stage index", index)))?;
        self.core.lock().set_stage_arg(index, name, value)
    }

    fn job_create(&self, filepath: &str) -> Result<(), PipelineError> {
        let id = self.core.lock().create_job(Path::new(filepath))?;
        println!("Created job {} for {}.", id, filepath);
        Ok(())
    }

    fn job_feed(&self, id: &str) -> Result<(), PipelineError> {
        let status = self.core.lock().feed_job(&JobId::from(id))?;
        println!("Job {} finished with status {}.", id, status);
        Ok(())
    }

    fn job_save(&self, id: &str, filepath: &str) -> Result<(), PipelineError> {
        self.core.lock().save_job(&JobId::from(id), Path::new(filepath))?;
        println!("Saved result of job {} to {}.", id, filepath);
        Ok(())
    }

    fn job_delete(&self, id: &str) -> Result<(), PipelineError> {
        self.core.lock().delete_job(&JobId::from(id))?;
        println!("Deleted job {}.", id);
        Ok(())
    }

    fn job_list(&self) {
        let core = self.core.lock();
        for job in core.jobs().iter() {
            println!();
            println!("==== JOB ====");
            println!("    Filepath:   {}", job.filepath().display());
            println!("    ID:         {}", job.job_id());
            println!("    Status:     {}", job.status());
            print!("    Snapshot:   ");
            for fingerprint in job.snapshot().iter() {
                print!("({}, {}) ", fingerprint.uid, fingerprint.arg_rev);
            }
            println!();
        }
        println!();
    }

    fn cache_dump_all(&self) {
        let core = self.core.lock();
        for stage in core.registry().iter() {
            let cache = stage.cache();
            println!("Cache '{}':", cache.name());
            println!("  Path:      {}", cache.path().display());
            println!("  Max files: {}", cache.max_files());
            println!("  Files:");
            for entry in cache.entries() {
                println!("    {} : {} ({})", entry.fname(), entry.fpath().display(), entry.tstamp());
            }
        }
    }

    fn cache_file_delete(&self, cache_name: &str, fname: &str) -> Result<(), PipelineError> {
        self.core.lock().delete_cache_file(cache_name, fname)?;
        println!("Deleted {} from cache {}.", fname, cache_name);
        Ok(())
    }

    fn print_help(&self) {
        println!("Image pipeline shell commands:");
        for proto in PROTOTYPES {
            println!("  {}", proto.help);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_prototype_matching() {
        assert_eq!(match_prototype(&tokens("help")), Some(10));
        assert_eq!(match_prototype(&tokens("exit")), Some(11));
        assert!(match_prototype(&tokens("stage load plugins invert")).is_some());
        assert!(match_prototype(&tokens("cache dump all")).is_some());
    }

    #[test]
    fn test_prototype_rejects_incomplete_commands() {
        assert_eq!(match_prototype(&tokens("stage load plugins")), None);
        assert_eq!(match_prototype(&tokens("job")), None);
        assert_eq!(match_prototype(&tokens("frobnicate")), None);
    }

    #[test]
    fn test_wildcards_accept_any_token() {
        assert!(match_prototype(&tokens("job create /tmp/in.png")).is_some());
        assert!(match_prototype(&tokens("stage set-arg 0 amount 40")).is_some());
    }

    #[test]
    fn test_extra_tokens_still_match() {
        assert_eq!(match_prototype(&tokens("exit now")), Some(11));
    }
}
