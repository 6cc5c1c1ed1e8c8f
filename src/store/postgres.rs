// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * ChimeraScan - PostgreSQL Store
 * Scan lifecycle persistence with connection pooling
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;
use uuid::Uuid;

use super::ScanStore;
use crate::config::DatabaseConfig;
use crate::errors::StoreError;
use crate::reporting::types::ReportPaths;
use crate::types::{Finding, ScanRecord, ScanStatus};

pub struct PgScanStore {
    pool: Pool,
}

impl PgScanStore {
    /// Create a pooled store and verify the connection.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = Config::new();
        pg_config.url = Some(config.url.clone());
        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        pg_config.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create PostgreSQL pool")?;

        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;
        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        info!("PostgreSQL connected: pool_size={}", config.pool_size);

        Ok(Self { pool })
    }

    /// Create the scans and vulnerabilities tables.
    pub async fn init_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;

        client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS scans (
                    id UUID PRIMARY KEY,
                    target_url TEXT NOT NULL,
                    status VARCHAR(20) NOT NULL,
                    project_id UUID,
                    started_at TIMESTAMP WITH TIME ZONE,
                    finished_at TIMESTAMP WITH TIME ZONE,
                    raw_output TEXT NOT NULL DEFAULT '',
                    report_json_path TEXT,
                    report_pdf_path TEXT,
                    report_html_path TEXT,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL,
                    user_id UUID NOT NULL
                )
                "#,
                &[],
            )
            .await
            .context("Failed to create scans table")?;

        client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS vulnerabilities (
                    id UUID PRIMARY KEY,
                    scan_id UUID NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
                    template_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    severity VARCHAR(20) NOT NULL,
                    severity_ai VARCHAR(20),
                    description TEXT NOT NULL DEFAULT '',
                    description_translated TEXT NOT NULL DEFAULT '',
                    reference JSONB,
                    tags JSONB,
                    classification JSONB,
                    host TEXT NOT NULL DEFAULT '',
                    matched_at TEXT NOT NULL DEFAULT '',
                    ip TEXT NOT NULL DEFAULT '',
                    timestamp TIMESTAMP WITH TIME ZONE,
                    curl_command TEXT NOT NULL DEFAULT '',
                    request TEXT NOT NULL DEFAULT '',
                    response TEXT NOT NULL DEFAULT '',
                    metadata JSONB,
                    recommendation_ai TEXT NOT NULL DEFAULT '',
                    created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
                )
                "#,
                &[],
            )
            .await
            .context("Failed to create vulnerabilities table")?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_scans_user_id ON scans(user_id)",
                &[],
            )
            .await?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_vulns_scan_id ON vulnerabilities(scan_id)",
                &[],
            )
            .await?;

        info!("Database schema initialized");

        Ok(())
    }

    fn record_from_row(row: &tokio_postgres::Row) -> Result<ScanRecord, StoreError> {
        let status_raw: String = row.get("status");
        let status: ScanStatus = status_raw
            .parse()
            .map_err(|_| StoreError::InvalidStatus(status_raw))?;

        Ok(ScanRecord {
            id: row.get("id"),
            target_url: row.get("target_url"),
            status,
            project_id: row.get("project_id"),
            started_at: row.get("started_at"),
            finished_at: row.get("finished_at"),
            raw_output: row.get("raw_output"),
            report_json_path: row.get("report_json_path"),
            report_pdf_path: row.get("report_pdf_path"),
            report_html_path: row.get("report_html_path"),
            created_at: row.get("created_at"),
            owner_id: row.get("user_id"),
        })
    }
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn insert_scan(&self, scan: &ScanRecord) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let status = scan.status.as_str();

        client
            .execute(
                r#"
                INSERT INTO scans (
                    id, target_url, status, project_id, started_at, finished_at,
                    raw_output, report_json_path, report_pdf_path, report_html_path,
                    created_at, user_id
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
                &[
                    &scan.id,
                    &scan.target_url,
                    &status,
                    &scan.project_id,
                    &scan.started_at,
                    &scan.finished_at,
                    &scan.raw_output,
                    &scan.report_json_path,
                    &scan.report_pdf_path,
                    &scan.report_html_path,
                    &scan.created_at,
                    &scan.owner_id,
                ],
            )
            .await?;

        Ok(())
    }

    async fn mark_in_progress(
        &self,
        scan_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .execute(
                "UPDATE scans SET status = 'In Progress', started_at = $2 \
                 WHERE id = $1 AND status = 'Queued'",
                &[&scan_id, &started_at],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn complete_scan(
        &self,
        scan_id: Uuid,
        finished_at: DateTime<Utc>,
        raw_output: &str,
        paths: &ReportPaths,
    ) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let json = paths.json.as_ref().map(|p| p.display().to_string());
        let pdf = paths.pdf.as_ref().map(|p| p.display().to_string());
        let html = paths.html.as_ref().map(|p| p.display().to_string());

        let rows = client
            .execute(
                r#"
                UPDATE scans
                SET status = 'Completed', finished_at = $2, raw_output = $3,
                    report_json_path = $4, report_pdf_path = $5, report_html_path = $6
                WHERE id = $1 AND status = 'In Progress'
                "#,
                &[&scan_id, &finished_at, &raw_output, &json, &pdf, &html],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn fail_scan(&self, scan_id: Uuid) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .execute(
                "UPDATE scans SET status = 'Failed' \
                 WHERE id = $1 AND status IN ('Queued', 'In Progress')",
                &[&scan_id],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn cancel_scan(&self, scan_id: Uuid) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .execute(
                "UPDATE scans SET status = 'Canceled' \
                 WHERE id = $1 AND status IN ('Queued', 'In Progress')",
                &[&scan_id],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn get_scan(
        &self,
        scan_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ScanRecord>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, target_url, status, project_id, started_at, finished_at,
                       raw_output, report_json_path, report_pdf_path, report_html_path,
                       created_at, user_id
                FROM scans
                WHERE id = $1 AND user_id = $2
                "#,
                &[&scan_id, &owner_id],
            )
            .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn insert_findings(
        &self,
        scan_id: Uuid,
        findings: &[Finding],
    ) -> Result<(), StoreError> {
        if findings.is_empty() {
            return Ok(());
        }

        let client = self.pool.get().await?;
        let statement = client
            .prepare(
                r#"
                INSERT INTO vulnerabilities (
                    id, scan_id, template_id, name, severity, severity_ai,
                    description, description_translated, reference, tags,
                    classification, host, matched_at, ip, timestamp,
                    curl_command, request, response, metadata, recommendation_ai
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                          $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
                "#,
            )
            .await?;

        for finding in findings {
            let id = Uuid::new_v4();
            let severity = finding.info.severity.to_lowercase();
            let severity_ai = finding.severity_ai.map(|s| s.as_str());
            let reference = serde_json::to_value(&finding.info.reference)
                .unwrap_or(serde_json::Value::Null);
            let tags =
                serde_json::to_value(&finding.info.tags).unwrap_or(serde_json::Value::Null);
            let classification = serde_json::to_value(&finding.info.classification)
                .unwrap_or(serde_json::Value::Null);
            let metadata =
                serde_json::to_value(&finding.metadata).unwrap_or(serde_json::Value::Null);
            let timestamp = DateTime::parse_from_rfc3339(&finding.timestamp)
                .ok()
                .map(|t| t.with_timezone(&Utc));

            client
                .execute(
                    &statement,
                    &[
                        &id,
                        &scan_id,
                        &finding.template_id,
                        &finding.info.name,
                        &severity,
                        &severity_ai,
                        &finding.info.description,
                        &finding.description_translated,
                        &reference,
                        &tags,
                        &classification,
                        &finding.host,
                        &finding.matched_at,
                        &finding.ip,
                        &timestamp,
                        &finding.curl_command,
                        &finding.request,
                        &finding.response,
                        &metadata,
                        &finding.recommendation_ai,
                    ],
                )
                .await?;
        }

        Ok(())
    }
}
