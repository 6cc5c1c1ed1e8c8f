// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle state of a scan.
///
/// `Queued -> InProgress -> {Completed, Failed}`, with `Canceled` reachable
/// from `Queued` or `InProgress` through an explicit stop request. Terminal
/// states are never left again; the store enforces this with conditional
/// transition writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    Queued,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Failed,
    Canceled,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Queued => "Queued",
            ScanStatus::InProgress => "In Progress",
            ScanStatus::Completed => "Completed",
            ScanStatus::Failed => "Failed",
            ScanStatus::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Canceled
        )
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Queued" => Ok(ScanStatus::Queued),
            "In Progress" => Ok(ScanStatus::InProgress),
            "Completed" => Ok(ScanStatus::Completed),
            "Failed" => Ok(ScanStatus::Failed),
            "Canceled" => Ok(ScanStatus::Canceled),
            other => Err(format!("unknown scan status '{}'", other)),
        }
    }
}

/// Risk class assigned by the inference service, distinct from the scanner's
/// own raw severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiSeverity {
    Info,
    Low,
    Medium,
    High,
}

impl AiSeverity {
    /// Normalize a raw completion into a canonical class. Anything that is
    /// not exactly one of the four accepted words yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "info" => Some(AiSeverity::Info),
            "low" => Some(AiSeverity::Low),
            "medium" => Some(AiSeverity::Medium),
            "high" => Some(AiSeverity::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiSeverity::Info => "info",
            AiSeverity::Low => "low",
            AiSeverity::Medium => "medium",
            AiSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for AiSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issue reported by the scanner, immutable once parsed except for the
/// three AI enrichment fields appended afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "template-id")]
    pub template_id: String,
    pub info: FindingInfo,
    pub host: String,
    #[serde(rename = "matched-at")]
    pub matched_at: String,
    pub ip: String,
    pub timestamp: String,
    #[serde(rename = "curl-command")]
    pub curl_command: String,
    pub request: String,
    pub response: String,
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub severity_ai: Option<AiSeverity>,
    #[serde(default)]
    pub description_translated: String,
    #[serde(default)]
    pub recommendation_ai: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingInfo {
    pub name: String,
    pub severity: String,
    pub description: String,
    pub reference: Vec<String>,
    pub tags: Vec<String>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "cve-id")]
    pub cve_id: Vec<String>,
    #[serde(rename = "cwe-id")]
    pub cwe_id: Vec<String>,
}

/// Persistent record of one scan. Identity and owner are assigned by the
/// caller-facing layer and only read here; everything else is written by the
/// pipeline through the store's transition operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub target_url: String,
    pub status: ScanStatus,
    pub project_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub raw_output: String,
    pub report_json_path: Option<String>,
    pub report_pdf_path: Option<String>,
    pub report_html_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner_id: Uuid,
}

/// Status view returned to the caller for an owned scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanStatusView {
    pub status: ScanStatus,
    pub started_at: Option<DateTime<Utc>>,
}

/// Downloadable report artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Pdf,
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Html => "text/html",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "pdf" => Ok(ReportFormat::Pdf),
            "html" => Ok(ReportFormat::Html),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_status_round_trips_through_strings() {
        for status in [
            ScanStatus::Queued,
            ScanStatus::InProgress,
            ScanStatus::Completed,
            ScanStatus::Failed,
            ScanStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<ScanStatus>().unwrap(), status);
        }
        assert!("Running".parse::<ScanStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!ScanStatus::Queued.is_terminal());
        assert!(!ScanStatus::InProgress.is_terminal());
        assert!(ScanStatus::Completed.is_terminal());
        assert!(ScanStatus::Failed.is_terminal());
        assert!(ScanStatus::Canceled.is_terminal());
    }

    #[test]
    fn ai_severity_normalization() {
        assert_eq!(AiSeverity::parse("high"), Some(AiSeverity::High));
        assert_eq!(AiSeverity::parse("  Medium \n"), Some(AiSeverity::Medium));
        assert_eq!(AiSeverity::parse("INFO"), Some(AiSeverity::Info));
        assert_eq!(AiSeverity::parse("critical"), None);
        assert_eq!(AiSeverity::parse(""), None);
        assert_eq!(AiSeverity::parse("low risk"), None);
    }

    #[test]
    fn report_format_parsing() {
        assert_eq!("PDF".parse::<ReportFormat>().unwrap(), ReportFormat::Pdf);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xlsx".parse::<ReportFormat>().is_err());
    }
}
