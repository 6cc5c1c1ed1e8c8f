// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * ChimeraScan - Scan Lifecycle Manager
 * Drives a scan from submission through enrichment to durable artifacts
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::enrichment::engine::EnrichmentEngine;
use crate::enrichment::provider::InferenceProvider;
use crate::errors::PipelineError;
use crate::reporting::engine::ReportWriter;
use crate::reporting::types::build_report;
use crate::scanner::parser::parse_scan_output;
use crate::scanner::registry::ProcessRegistry;
use crate::scanner::runner::ScanRunner;
use crate::store::ScanStore;
use crate::types::{ReportFormat, ScanRecord, ScanStatus, ScanStatusView};
use crate::validation::is_valid_target;

/// Orchestrates the scan lifecycle.
///
/// `submit` records a `Queued` scan and spawns one detached task per scan;
/// the submitting call never waits for it. Everything the task does is
/// observable only through status transitions and, on completion, artifact
/// downloads. Cancellation kills the subprocess and writes `Canceled`
/// synchronously; the conditional store transitions guarantee a delayed
/// completion from the task can never overwrite it.
pub struct ScanPipeline {
    store: Arc<dyn ScanStore>,
    registry: Arc<ProcessRegistry>,
    runner: ScanRunner,
    enrichment: EnrichmentEngine,
    reports: ReportWriter,
}

enum ScanOutcome {
    Completed { findings: usize },
    Canceled,
}

impl ScanPipeline {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ScanStore>,
        provider: Arc<dyn InferenceProvider>,
    ) -> Self {
        let registry = Arc::new(ProcessRegistry::new());
        Self {
            runner: ScanRunner::new(
                Some(config.scanner.binary_path.clone()),
                Arc::clone(&registry),
            ),
            enrichment: EnrichmentEngine::new(provider, config.inference.language.clone()),
            reports: ReportWriter::new(config.reports.dir.clone()),
            registry,
            store,
        }
    }

    /// Accept a scan and start its background task. Returns immediately;
    /// the new scan is observable as `Queued`.
    pub async fn submit(
        self: &Arc<Self>,
        target_url: String,
        owner_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Uuid, PipelineError> {
        let scan_id = Uuid::new_v4();
        let scan = ScanRecord {
            id: scan_id,
            target_url: target_url.clone(),
            status: ScanStatus::Queued,
            project_id,
            started_at: None,
            finished_at: None,
            raw_output: String::new(),
            report_json_path: None,
            report_pdf_path: None,
            report_html_path: None,
            created_at: Utc::now(),
            owner_id,
        };

        self.store.insert_scan(&scan).await?;
        self.registry.register(scan_id);

        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run_scan(scan_id, target_url).await;
        });

        Ok(scan_id)
    }

    /// Status and start time of an owned scan.
    pub async fn status(
        &self,
        scan_id: Uuid,
        owner_id: Uuid,
    ) -> Result<ScanStatusView, PipelineError> {
        let scan = self
            .store
            .get_scan(scan_id, owner_id)
            .await?
            .ok_or(PipelineError::NotFound)?;

        Ok(ScanStatusView {
            status: scan.status,
            started_at: scan.started_at,
        })
    }

    /// Stop an owned scan. Kills the registered subprocess and writes
    /// `Canceled` before returning; idempotent on scans that already
    /// reached a terminal state.
    pub async fn cancel(&self, scan_id: Uuid, owner_id: Uuid) -> Result<(), PipelineError> {
        let scan = self
            .store
            .get_scan(scan_id, owner_id)
            .await?
            .ok_or(PipelineError::NotFound)?;

        self.registry.cancel(scan_id);

        if self.store.cancel_scan(scan_id).await? {
            info!("scan {} canceled", scan_id);
        } else {
            info!(
                "cancel request for scan {} ignored, already {}",
                scan_id, scan.status
            );
        }

        Ok(())
    }

    /// Resolve the artifact path for one report format of an owned scan.
    /// A path that was never recorded, or whose file has gone missing,
    /// yields `NotFound`.
    pub async fn artifact_path(
        &self,
        scan_id: Uuid,
        owner_id: Uuid,
        format: ReportFormat,
    ) -> Result<PathBuf, PipelineError> {
        let scan = self
            .store
            .get_scan(scan_id, owner_id)
            .await?
            .ok_or(PipelineError::NotFound)?;

        let recorded = match format {
            ReportFormat::Json => scan.report_json_path,
            ReportFormat::Pdf => scan.report_pdf_path,
            ReportFormat::Html => scan.report_html_path,
        };

        let path = recorded
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or(PipelineError::NotFound)?;

        if !path.exists() {
            return Err(PipelineError::NotFound);
        }

        Ok(path)
    }

    async fn run_scan(self: Arc<Self>, scan_id: Uuid, target_url: String) {
        match self.execute(scan_id, &target_url).await {
            Ok(ScanOutcome::Completed { findings }) => {
                info!(
                    "scan {} completed for {} with {} findings",
                    scan_id, target_url, findings
                );
            }
            Ok(ScanOutcome::Canceled) => {
                info!("scan {} canceled", scan_id);
            }
            Err(err) => {
                error!("scan {} failed: {}", scan_id, err);
                if let Err(store_err) = self.store.fail_scan(scan_id).await {
                    error!(
                        "failed to record failure for scan {}: {}",
                        scan_id, store_err
                    );
                }
            }
        }

        self.registry.unregister(scan_id);
    }

    async fn execute(
        &self,
        scan_id: Uuid,
        target_url: &str,
    ) -> Result<ScanOutcome, PipelineError> {
        if !is_valid_target(target_url) {
            return Err(PipelineError::InvalidTarget(target_url.to_string()));
        }

        if !self.store.mark_in_progress(scan_id, Utc::now()).await? {
            // Canceled before the task got going; the status is already set.
            return Ok(ScanOutcome::Canceled);
        }

        info!("starting scan {} against {}", scan_id, target_url);

        let output = self.runner.run(scan_id, target_url).await?;
        if output.canceled || self.registry.is_canceled(scan_id) {
            return Ok(ScanOutcome::Canceled);
        }

        let mut findings = parse_scan_output(&output.stdout);
        info!("scan {} produced {} findings", scan_id, findings.len());

        let total = findings.len();
        if total > 0 {
            info!(
                "enriching {} findings via {} ({})",
                total,
                self.enrichment.provider().name(),
                self.enrichment.provider().model()
            );
        }
        for (index, finding) in findings.iter_mut().enumerate() {
            if self.registry.is_canceled(scan_id) {
                return Ok(ScanOutcome::Canceled);
            }
            info!("analyzing finding {}/{}", index + 1, total);
            self.enrichment.enrich(finding).await;
        }

        if self.registry.is_canceled(scan_id) {
            return Ok(ScanOutcome::Canceled);
        }

        self.store.insert_findings(scan_id, &findings).await?;

        let raw_output = serde_json::to_string(&findings).unwrap_or_else(|err| {
            warn!("failed to serialize raw output for scan {}: {}", scan_id, err);
            "[]".to_string()
        });

        let generated_at = Utc::now();
        let report = build_report(target_url, findings, generated_at);
        let paths = self.reports.write_all(scan_id, &report, generated_at);
        if paths.all_failed() {
            return Err(PipelineError::ReportGeneration);
        }

        match self
            .store
            .complete_scan(scan_id, Utc::now(), &raw_output, &paths)
            .await
        {
            Ok(true) => Ok(ScanOutcome::Completed { findings: total }),
            Ok(false) => {
                // A cancel request won the race; its status stands and the
                // artifacts of the discarded completion go with it.
                warn!(
                    "scan {} finished after cancellation, completion discarded",
                    scan_id
                );
                self.reports.discard(&paths);
                Ok(ScanOutcome::Canceled)
            }
            Err(err) => {
                self.reports.discard(&paths);
                Err(err.into())
            }
        }
    }
}
