// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{AiSeverity, Finding};

/// Aggregated, serializable view of one finished scan. Built once per scan
/// by [`build_report`] and never mutated; all three artifact formats render
/// from this value. Field order is the serialized order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target_url: String,
    pub scan_time: String,
    pub findings: Vec<Finding>,
    pub total_count: usize,
    pub severity_stats: SeverityStats,
}

/// Per-class finding counts, sourced from the AI-assigned severity. Classes
/// without findings stay at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityStats {
    pub info: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl SeverityStats {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut stats = Self::default();
        for severity in findings.iter().filter_map(|f| f.severity_ai) {
            match severity {
                AiSeverity::Info => stats.info += 1,
                AiSeverity::Low => stats.low += 1,
                AiSeverity::Medium => stats.medium += 1,
                AiSeverity::High => stats.high += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.info + self.low + self.medium + self.high
    }
}

/// Pure function of (target, findings, generation timestamp).
pub fn build_report(
    target_url: &str,
    findings: Vec<Finding>,
    generated_at: DateTime<Utc>,
) -> ScanReport {
    let severity_stats = SeverityStats::from_findings(&findings);
    ScanReport {
        target_url: target_url.to_string(),
        scan_time: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        total_count: findings.len(),
        severity_stats,
        findings,
    }
}

/// Artifact paths recorded for a scan. An absent entry means that format's
/// writer failed; the remaining formats are still valid.
#[derive(Debug, Clone, Default)]
pub struct ReportPaths {
    pub json: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl ReportPaths {
    pub fn all_failed(&self) -> bool {
        self.json.is_none() && self.pdf.is_none() && self.html.is_none()
    }
}
