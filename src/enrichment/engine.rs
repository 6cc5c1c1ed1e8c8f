// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::sync::Arc;
use tracing::warn;

use super::provider::InferenceProvider;
use crate::types::{AiSeverity, Finding};

/// Enriches parsed findings through the inference service: a severity class,
/// a translated description, and remediation guidance per finding.
///
/// The three sub-calls are independent. A failed call degrades the affected
/// field (severity falls back to medium, text fields carry a visible error
/// marker) and never fails the scan.
pub struct EnrichmentEngine {
    provider: Arc<dyn InferenceProvider>,
    language: String,
}

impl EnrichmentEngine {
    pub fn new(provider: Arc<dyn InferenceProvider>, language: impl Into<String>) -> Self {
        Self {
            provider,
            language: language.into(),
        }
    }

    pub fn provider(&self) -> &dyn InferenceProvider {
        self.provider.as_ref()
    }

    /// Run the three enrichment sub-calls for one finding, in order:
    /// severity first so the remediation prompt can reference it, then the
    /// description translation (skipped when there is nothing to translate),
    /// then the remediation text.
    pub async fn enrich(&self, finding: &mut Finding) {
        finding.severity_ai = Some(self.classify_severity(finding).await);

        if !finding.info.description.is_empty() {
            finding.description_translated =
                self.translate_description(&finding.info.description).await;
        }

        finding.recommendation_ai = self.recommend_remediation(finding).await;
    }

    async fn classify_severity(&self, finding: &Finding) -> AiSeverity {
        let prompt = self.severity_prompt(finding);
        match self.provider.complete(&prompt).await {
            Ok(raw) => match AiSeverity::parse(&raw) {
                Some(severity) => severity,
                None => {
                    warn!(
                        "unrecognized severity answer {:?} for {}, defaulting to medium",
                        raw.trim(),
                        finding.template_id
                    );
                    AiSeverity::Medium
                }
            },
            Err(err) => {
                warn!(
                    "severity classification failed for {}: {}",
                    finding.template_id, err
                );
                AiSeverity::Medium
            }
        }
    }

    async fn translate_description(&self, description: &str) -> String {
        let prompt = format!(
            "Translate into {} concisely and with technical precision, no preamble: \"{}\"",
            self.language, description
        );

        match self.provider.complete(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!("description translation failed: {}", err);
                format!("AI error: {}", err)
            }
        }
    }

    async fn recommend_remediation(&self, finding: &Finding) -> String {
        let severity = finding.severity_ai.unwrap_or(AiSeverity::Medium);
        let prompt = format!(
            "Give very short remediation steps for this vulnerability. \
             No preamble, practical actions only.\n\n\
             Vulnerability: {}\n\
             Description: {}\n\
             Risk level: {}\n\n\
             Remediation:",
            finding.info.name, finding.info.description, severity
        );

        match self.provider.complete(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!(
                    "remediation generation failed for {}: {}",
                    finding.template_id, err
                );
                format!("AI error: {}", err)
            }
        }
    }

    fn severity_prompt(&self, finding: &Finding) -> String {
        format!(
            "Rate the risk level of this vulnerability. Answer with exactly one of: \
             info, low, medium, high.\n\
             Rules:\n\
             - info: only when there is nothing to fix and no threat at all\n\
             - low: when there is even a small chance of compromise or minimal risk\n\
             - medium: moderate risk that needs attention\n\
             - high: high risk, urgent fix required\n\n\
             Vulnerability: {}\n\
             Description: {}\n\
             Location: {}\n\
             Host: {}\n\
             CURL command: {}\n\
             Request: {}\n\
             Tags: {}\n\
             CVE classification: {}\n\
             CWE classification: {}\n\n\
             Answer with one word only:",
            finding.info.name,
            finding.info.description,
            finding.matched_at,
            finding.host,
            finding.curl_command,
            finding.request,
            finding.info.tags.join(", "),
            finding.info.classification.cve_id.join(", "),
            finding.info.classification.cwe_id.join(", ")
        )
    }
}
