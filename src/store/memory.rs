// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::ScanStore;
use crate::errors::StoreError;
use crate::reporting::types::ReportPaths;
use crate::types::{Finding, ScanRecord, ScanStatus};

/// In-process store with the same conditional-transition semantics as the
/// PostgreSQL implementation. Used for single-node runs without a database
/// and throughout the test suite.
#[derive(Default)]
pub struct MemoryScanStore {
    scans: RwLock<HashMap<Uuid, ScanRecord>>,
    findings: RwLock<HashMap<Uuid, Vec<Finding>>>,
}

impl MemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings_for(&self, scan_id: Uuid) -> Vec<Finding> {
        self.findings
            .read()
            .get(&scan_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScanStore for MemoryScanStore {
    async fn insert_scan(&self, scan: &ScanRecord) -> Result<(), StoreError> {
        self.scans.write().insert(scan.id, scan.clone());
        Ok(())
    }

    async fn mark_in_progress(
        &self,
        scan_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut scans = self.scans.write();
        match scans.get_mut(&scan_id) {
            Some(scan) if scan.status == ScanStatus::Queued => {
                scan.status = ScanStatus::InProgress;
                scan.started_at = Some(started_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_scan(
        &self,
        scan_id: Uuid,
        finished_at: DateTime<Utc>,
        raw_output: &str,
        paths: &ReportPaths,
    ) -> Result<bool, StoreError> {
        let mut scans = self.scans.write();
        match scans.get_mut(&scan_id) {
            Some(scan) if scan.status == ScanStatus::InProgress => {
                scan.status = ScanStatus::Completed;
                scan.finished_at = Some(finished_at);
                scan.raw_output = raw_output.to_string();
                scan.report_json_path = paths.json.as_ref().map(|p| p.display().to_string());
                scan.report_pdf_path = paths.pdf.as_ref().map(|p| p.display().to_string());
                scan.report_html_path = paths.html.as_ref().map(|p| p.display().to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail_scan(&self, scan_id: Uuid) -> Result<bool, StoreError> {
        let mut scans = self.scans.write();
        match scans.get_mut(&scan_id) {
            Some(scan) if !scan.status.is_terminal() => {
                scan.status = ScanStatus::Failed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_scan(&self, scan_id: Uuid) -> Result<bool, StoreError> {
        let mut scans = self.scans.write();
        match scans.get_mut(&scan_id) {
            Some(scan)
                if matches!(scan.status, ScanStatus::Queued | ScanStatus::InProgress) =>
            {
                scan.status = ScanStatus::Canceled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_scan(
        &self,
        scan_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ScanRecord>, StoreError> {
        Ok(self
            .scans
            .read()
            .get(&scan_id)
            .filter(|scan| scan.owner_id == owner_id)
            .cloned())
    }

    async fn insert_findings(
        &self,
        scan_id: Uuid,
        findings: &[Finding],
    ) -> Result<(), StoreError> {
        self.findings.write().insert(scan_id, findings.to_vec());
        Ok(())
    }
}
