// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Classification, Finding, FindingInfo};

/// One line of scanner output, as emitted on stdout. Fields the scanner may
/// omit or null out are optional here and defaulted during conversion; a
/// line that does not decode into this shape is dropped.
#[derive(Debug, Deserialize)]
struct NucleiEvent {
    #[serde(rename = "template-id")]
    template_id: Option<String>,
    info: Option<EventInfo>,
    host: Option<String>,
    #[serde(rename = "matched-at")]
    matched_at: Option<String>,
    ip: Option<String>,
    timestamp: Option<String>,
    #[serde(rename = "curl-command")]
    curl_command: Option<String>,
    request: Option<String>,
    response: Option<String>,
    metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct EventInfo {
    name: Option<String>,
    severity: Option<String>,
    description: Option<String>,
    reference: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    classification: Option<EventClassification>,
}

#[derive(Debug, Default, Deserialize)]
struct EventClassification {
    #[serde(rename = "cve-id")]
    cve_id: Option<Vec<String>>,
    #[serde(rename = "cwe-id")]
    cwe_id: Option<Vec<String>>,
}

impl From<NucleiEvent> for Finding {
    fn from(event: NucleiEvent) -> Self {
        let info = event.info.unwrap_or_default();
        let classification = info.classification.unwrap_or_default();

        Finding {
            template_id: event.template_id.unwrap_or_default(),
            info: FindingInfo {
                name: info.name.unwrap_or_default(),
                severity: info.severity.unwrap_or_default(),
                description: info.description.unwrap_or_default(),
                reference: info.reference.unwrap_or_default(),
                tags: info.tags.unwrap_or_default(),
                classification: Classification {
                    cve_id: classification.cve_id.unwrap_or_default(),
                    cwe_id: classification.cwe_id.unwrap_or_default(),
                },
            },
            host: event.host.unwrap_or_default(),
            matched_at: event.matched_at.unwrap_or_default(),
            ip: event.ip.unwrap_or_default(),
            timestamp: event.timestamp.unwrap_or_default(),
            curl_command: event.curl_command.unwrap_or_default(),
            request: event.request.unwrap_or_default(),
            response: event.response.unwrap_or_default(),
            metadata: event.metadata.unwrap_or_default(),
            severity_ai: None,
            description_translated: String::new(),
            recommendation_ai: String::new(),
        }
    }
}

/// Decode the scanner's newline-delimited JSON output into findings.
///
/// Blank lines are skipped and undecodable lines (the scanner's own
/// diagnostics among them) are silently dropped; parse errors never abort
/// the batch. Source order is preserved. Empty or all-invalid input yields
/// an empty vector, never an error.
pub fn parse_scan_output(output: &[u8]) -> Vec<Finding> {
    let text = String::from_utf8_lossy(output);
    let mut findings = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<NucleiEvent>(line) {
            Ok(event) => findings.push(event.into()),
            Err(err) => debug!("dropping unparsable scanner output line: {}", err),
        }
    }

    findings
}
