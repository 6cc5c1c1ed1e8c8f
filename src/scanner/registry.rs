// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::process::Child;
use tracing::warn;
use uuid::Uuid;

/// Synchronized table of live scanner processes, keyed by scan id.
///
/// Owned by the pipeline; every scan has at most one tracked process.
/// Entries carry a cancel flag so a stop request is visible to the scan's
/// background task even before a process has been attached, or after the
/// process has already exited.
#[derive(Default)]
pub struct ProcessRegistry {
    scans: Mutex<HashMap<Uuid, ScanEntry>>,
}

#[derive(Default)]
struct ScanEntry {
    child: Option<Child>,
    canceled: bool,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a scan from submission time, before any process exists.
    pub fn register(&self, scan_id: Uuid) {
        self.scans.lock().insert(scan_id, ScanEntry::default());
    }

    /// Attach the live scanner process for a scan.
    ///
    /// Returns false when the scan was canceled before the process could be
    /// attached; in that case the child has already been killed here and the
    /// caller must treat the run as canceled.
    pub fn attach(&self, scan_id: Uuid, mut child: Child) -> bool {
        let mut scans = self.scans.lock();
        match scans.get_mut(&scan_id) {
            Some(entry) if !entry.canceled => {
                entry.child = Some(child);
                true
            }
            _ => {
                if let Err(err) = child.start_kill() {
                    warn!("failed to kill scanner process for {}: {}", scan_id, err);
                }
                false
            }
        }
    }

    /// Take the process back for reaping once its output has been drained.
    /// Returns None when a cancel request already claimed (and killed) it.
    pub fn take_child(&self, scan_id: Uuid) -> Option<Child> {
        self.scans
            .lock()
            .get_mut(&scan_id)
            .and_then(|entry| entry.child.take())
    }

    /// Kill the registered process, if any, and flag the scan as canceled.
    /// Returns whether the scan was being tracked at all.
    pub fn cancel(&self, scan_id: Uuid) -> bool {
        let mut scans = self.scans.lock();
        match scans.get_mut(&scan_id) {
            Some(entry) => {
                entry.canceled = true;
                if let Some(mut child) = entry.child.take() {
                    if let Err(err) = child.start_kill() {
                        warn!("failed to kill scanner process for {}: {}", scan_id, err);
                    }
                }
                true
            }
            None => false,
        }
    }

    pub fn is_canceled(&self, scan_id: Uuid) -> bool {
        self.scans
            .lock()
            .get(&scan_id)
            .map(|entry| entry.canceled)
            .unwrap_or(false)
    }

    /// Drop tracking for a scan once its background task finishes.
    pub fn unregister(&self, scan_id: Uuid) {
        self.scans.lock().remove(&scan_id);
    }

    pub fn tracked_scans(&self) -> usize {
        self.scans.lock().len()
    }
}
