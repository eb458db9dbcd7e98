// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! sysexits-style process exit codes and the mapping from domain errors
//! onto them.

use image_pipeline_domain::PipelineError;

/// Process exit codes, following sysexits conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Successful termination
    Ok = 0,
    /// Bad user input (EX_DATAERR)
    DataErr = 65,
    /// Configuration error (EX_CONFIG)
    Config = 78,
    /// Input/output error (EX_IOERR)
    IoErr = 74,
    /// Internal software error (EX_SOFTWARE)
    Software = 70,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps a domain error onto the exit code the process should report.
pub fn exit_code_for(error: &PipelineError) -> ExitCode {
    match error {
        PipelineError::InvalidInput(_) | PipelineError::NotFound(_) => ExitCode::DataErr,
        PipelineError::InvalidConfiguration(_) => ExitCode::Config,
        PipelineError::AbiMismatch(_) => ExitCode::DataErr,
        PipelineError::IoError(_)
        | PipelineError::CodecError(_)
        | PipelineError::ResourceExhausted(_)
        | PipelineError::ConsistencyViolation(_) => ExitCode::IoErr,
        PipelineError::StageFailed(_) | PipelineError::InternalError(_) => ExitCode::Software,
    }
}
