// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present MIPSim Contributors

//! Trace export
//!
//! Writes a session trace to disk as pretty JSON or postcard bytes. Export
//! is one-way; traces are never loaded back into a simulation.

use crate::error::{MipError, SerializationError};
use crate::trace::Trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// On-disk trace encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    #[default]
    Json,
    Postcard,
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceFormat::Json => write!(f, "json"),
            TraceFormat::Postcard => write!(f, "postcard"),
        }
    }
}

impl std::str::FromStr for TraceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(TraceFormat::Json),
            "postcard" => Ok(TraceFormat::Postcard),
            _ => Err(format!(
                "Invalid trace format: {}. Use 'json' or 'postcard'",
                s
            )),
        }
    }
}

/// Encodes a trace in the given format
pub fn encode_trace(trace: &Trace, format: TraceFormat) -> Result<Vec<u8>, SerializationError> {
    let bytes = match format {
        TraceFormat::Json => serde_json::to_vec_pretty(trace)?,
        TraceFormat::Postcard => postcard::to_allocvec(trace)?,
    };
    Ok(bytes)
}

/// Writes a trace to `path`, creating parent directories as needed
pub fn export_trace(trace: &Trace, path: &Path, format: TraceFormat) -> Result<usize, MipError> {
    let bytes = encode_trace(trace, format)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes)?;

    log::info!(
        "Exported {} trace events to {} ({}, {} bytes)",
        trace.len(),
        path.display(),
        format,
        bytes.len()
    );
    Ok(bytes.len())
}
