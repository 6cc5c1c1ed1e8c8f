// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::formats::html::HtmlReportGenerator;
use super::formats::json::JsonReportGenerator;
use super::formats::pdf::PdfReportGenerator;
use super::types::{ReportPaths, ScanReport};
use crate::errors::ReportWriteError;
use crate::types::ReportFormat;

/// Renders and persists the three report artifacts for a finished scan.
///
/// The format writers are independent: a failed format is logged and skipped
/// while the remaining formats are still attempted, so a single bad writer
/// never blocks scan completion.
pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn write_all(
        &self,
        scan_id: Uuid,
        report: &ScanReport,
        generated_at: DateTime<Utc>,
    ) -> ReportPaths {
        let mut paths = ReportPaths::default();

        if let Err(err) = fs::create_dir_all(&self.reports_dir) {
            error!(
                "failed to create reports directory {:?}: {}",
                self.reports_dir, err
            );
            return paths;
        }

        let stamp = generated_at.timestamp();

        paths.json = self.write_format(
            scan_id,
            stamp,
            ReportFormat::Json,
            JsonReportGenerator::new().generate(report),
        );
        paths.pdf = self.write_format(
            scan_id,
            stamp,
            ReportFormat::Pdf,
            PdfReportGenerator::new().generate(report),
        );
        paths.html = self.write_format(
            scan_id,
            stamp,
            ReportFormat::Html,
            Ok(HtmlReportGenerator::new().generate(report)),
        );

        paths
    }

    fn write_format(
        &self,
        scan_id: Uuid,
        stamp: i64,
        format: ReportFormat,
        rendered: Result<Vec<u8>, ReportWriteError>,
    ) -> Option<PathBuf> {
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("{} report for scan {} not generated: {}", format, scan_id, err);
                return None;
            }
        };

        let path = self.artifact_path(scan_id, stamp, format);
        match fs::write(&path, bytes) {
            Ok(()) => {
                info!("{} report saved: {}", format, path.display());
                Some(path)
            }
            Err(err) => {
                error!("failed to write {} report {}: {}", format, path.display(), err);
                None
            }
        }
    }

    /// Remove already-written artifacts for a scan that did not end up
    /// `Completed`; no other terminal status may leave artifacts behind.
    pub fn discard(&self, paths: &ReportPaths) {
        for path in [&paths.json, &paths.pdf, &paths.html].into_iter().flatten() {
            if let Err(err) = fs::remove_file(path) {
                warn!(
                    "failed to remove report artifact {}: {}",
                    path.display(),
                    err
                );
            }
        }
    }

    fn artifact_path(&self, scan_id: Uuid, stamp: i64, format: ReportFormat) -> PathBuf {
        self.reports_dir.join(format!(
            "chimerascan_report_{}_{}.{}",
            scan_id,
            stamp,
            format.extension()
        ))
    }
}
