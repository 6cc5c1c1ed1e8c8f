// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * ChimeraScan - Pipeline Error Types
 * Error taxonomy with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::path::PathBuf;
use thiserror::Error;

/// Caller-facing pipeline errors.
///
/// Anything that happens inside a scan's background task never reaches the
/// caller as an error; it is persisted as a terminal scan status instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unknown scan id or a scan owned by someone else. The two cases are
    /// deliberately indistinguishable so existence is not leaked.
    #[error("scan not found")]
    NotFound,

    /// Target URL rejected before any subprocess was launched.
    #[error("invalid scan target: {0}")]
    InvalidTarget(String),

    /// Scanner subprocess errors (fatal for the scan).
    #[error("scanner process error: {0}")]
    Process(#[from] ProcessError),

    /// Persistence errors (fatal for the scan).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every report artifact writer failed; nothing durable was produced.
    #[error("no report artifact could be written")]
    ReportGeneration,
}

/// Scanner subprocess failures. A non-zero exit code is *not* represented
/// here: the scanner may exit non-zero after emitting valid findings.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start scanner process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to read scanner output: {0}")]
    Output(#[source] std::io::Error),

    #[error("scanner stdout was not captured")]
    MissingStdout,
}

/// Persistent store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("database query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("unrecognized scan status {0:?} in store")]
    InvalidStatus(String),
}

/// Inference call failures. Recoverable: the enrichment engine degrades the
/// affected field and the scan continues.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference service returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Per-artifact report failures. Recoverable: logged, remaining formats are
/// still attempted.
#[derive(Error, Debug)]
pub enum ReportWriteError {
    #[error("failed to render report: {0}")]
    Render(String),

    #[error("failed to write report artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
