// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scan and finding persistence.
//!
//! Lifecycle transitions are conditional writes: each one names the states
//! it may move from and reports whether it applied. Once `cancel_scan` has
//! applied, a delayed `complete_scan` from the same scan's task no longer
//! matches and is discarded.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::reporting::types::ReportPaths;
use crate::types::{Finding, ScanRecord};

#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Create the scan record in its initial `Queued` state.
    async fn insert_scan(&self, scan: &ScanRecord) -> Result<(), StoreError>;

    /// `Queued -> In Progress`, stamping the start time.
    async fn mark_in_progress(
        &self,
        scan_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// `In Progress -> Completed`. Status, finish time, raw output and the
    /// artifact paths land in one atomic write; a scan is never observable
    /// as `Completed` with the paths missing.
    async fn complete_scan(
        &self,
        scan_id: Uuid,
        finished_at: DateTime<Utc>,
        raw_output: &str,
        paths: &ReportPaths,
    ) -> Result<bool, StoreError>;

    /// Any non-terminal state -> `Failed`. No artifacts are recorded.
    async fn fail_scan(&self, scan_id: Uuid) -> Result<bool, StoreError>;

    /// `Queued`/`In Progress` -> `Canceled`.
    async fn cancel_scan(&self, scan_id: Uuid) -> Result<bool, StoreError>;

    /// Owner-scoped lookup. A scan owned by someone else yields the same
    /// `None` as a scan that does not exist.
    async fn get_scan(
        &self,
        scan_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ScanRecord>, StoreError>;

    /// Persist the enriched findings of a scan.
    async fn insert_findings(&self, scan_id: Uuid, findings: &[Finding])
        -> Result<(), StoreError>;
}
