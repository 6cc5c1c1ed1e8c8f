// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::types::ScanReport;
use crate::types::Finding;

pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, report: &ScanReport) -> Vec<u8> {
        self.generate_html(report).into_bytes()
    }

    fn generate_html(&self, report: &ScanReport) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ChimeraScan Report - {}</title>
    <style>
        {}
    </style>
</head>
<body>
    <div class="container">
        {}
        {}
        {}
        {}
    </div>
</body>
</html>"#,
            escape_html(&report.target_url),
            self.get_css(),
            self.generate_header(),
            self.generate_scan_info(report),
            self.generate_stats(report),
            self.generate_findings(report),
        )
    }

    fn get_css(&self) -> &'static str {
        r#"
        :root {
            --color-bg-primary: #0a0a15;
            --color-surface: rgba(255, 255, 255, 0.07);
            --color-accent: #7c4dff;
            --color-text-primary: #ffffff;
            --color-text-secondary: #b0b0d0;
            --color-success: #00e676;
            --color-warning: #ffaa00;
            --color-error: #ff5252;
            --color-info: #00b0ff;
        }

        body {
            font-family: 'Segoe UI', 'Roboto', 'Arial', sans-serif;
            margin: 0;
            padding: 0;
            background-color: var(--color-bg-primary);
            color: var(--color-text-primary);
            line-height: 1.6;
        }

        .container { max-width: 1200px; margin: 0 auto; padding: 20px; }

        .header-container {
            margin: 20px 0 30px 0;
            padding-bottom: 20px;
            border-bottom: 1px solid rgba(124, 77, 255, 0.3);
        }

        .header-container h1 { color: var(--color-accent); margin: 0 0 5px 0; font-size: 1.6rem; }
        .header-container p { color: var(--color-text-secondary); margin: 0; font-size: 0.9rem; }

        .report-header, .stats-section {
            background: var(--color-surface);
            padding: 25px;
            border-radius: 16px;
            margin-bottom: 25px;
            border: 1px solid rgba(124, 77, 255, 0.2);
        }

        .stats-section h3 { color: var(--color-accent); margin: 0 0 20px 0; text-align: center; }

        .header-info, .stats-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 15px;
        }

        .info-item, .stat-item {
            background: rgba(255, 255, 255, 0.03);
            padding: 12px 15px;
            border-radius: 12px;
            border: 1px solid rgba(124, 77, 255, 0.1);
        }

        .stat-item { text-align: center; }
        .stat-item .count { font-size: 1.5rem; margin-top: 5px; }
        .info-item strong { color: var(--color-accent); display: block; margin-bottom: 5px; font-size: 0.9rem; }

        .vulnerability {
            background: var(--color-surface);
            margin: 20px 0;
            padding: 25px;
            border-radius: 16px;
            border: 1px solid rgba(255, 255, 255, 0.1);
        }

        .vulnerability.info { border-left: 4px solid var(--color-info); }
        .vulnerability.low { border-left: 4px solid var(--color-success); }
        .vulnerability.medium { border-left: 4px solid var(--color-warning); }
        .vulnerability.high { border-left: 4px solid var(--color-error); }

        .vulnerability h3 { color: var(--color-text-primary); margin: 0 0 20px 0; font-size: 1.3rem; }

        .severity {
            font-weight: bold;
            padding: 4px 12px;
            border-radius: 20px;
            font-size: 0.85rem;
            display: inline-block;
            text-transform: uppercase;
            letter-spacing: 0.5px;
        }

        .info-sev { background: var(--color-info); color: white; }
        .low-sev { background: var(--color-success); color: black; }
        .medium-sev { background: var(--color-warning); color: white; }
        .high-sev { background: var(--color-error); color: white; }

        .section {
            margin: 20px 0;
            padding-bottom: 20px;
            border-bottom: 1px solid rgba(255, 255, 255, 0.05);
        }

        .section:last-child { border-bottom: none; }

        .code {
            background: rgba(0, 0, 0, 0.3);
            padding: 15px;
            border-radius: 12px;
            font-family: 'Courier New', monospace;
            font-size: 0.9rem;
            margin: 10px 0;
            border: 1px solid rgba(124, 77, 255, 0.2);
            overflow-x: auto;
            white-space: pre-wrap;
            word-wrap: break-word;
        }

        .recommendation {
            background: rgba(255, 168, 0, 0.1);
            padding: 20px;
            border-radius: 12px;
            border-left: 4px solid var(--color-warning);
            margin-top: 20px;
        }

        .recommendation strong { color: var(--color-warning); display: block; margin-bottom: 10px; font-size: 1.1rem; }

        h2 { color: var(--color-accent); margin: 30px 0 20px 0; text-align: center; font-size: 1.6rem; }
        ul { padding-left: 20px; margin: 10px 0; }
        li { margin: 5px 0; color: var(--color-text-secondary); }
        p { margin: 10px 0; color: var(--color-text-secondary); }
        strong { color: var(--color-text-primary); }
        "#
    }

    fn generate_header(&self) -> String {
        r#"<div class="header-container">
            <h1>ChimeraScan: DAST Scanner for Web Applications</h1>
            <p>Dynamic Application Security Testing Scanner</p>
        </div>"#
            .to_string()
    }

    fn generate_scan_info(&self, report: &ScanReport) -> String {
        format!(
            r#"<div class="report-header">
            <div class="header-info">
                <div class="info-item"><strong>Target URL:</strong> {}</div>
                <div class="info-item"><strong>Scan Time:</strong> {}</div>
                <div class="info-item"><strong>Total Findings:</strong> {}</div>
            </div>
        </div>"#,
            escape_html(&report.target_url),
            escape_html(&report.scan_time),
            report.total_count
        )
    }

    fn generate_stats(&self, report: &ScanReport) -> String {
        let stats = &report.severity_stats;
        format!(
            r#"<div class="stats-section">
            <h3>Findings by Risk Level</h3>
            <div class="stats-grid">
                <div class="stat-item"><strong>Info</strong><div class="count" style="color: var(--color-info);">{}</div></div>
                <div class="stat-item"><strong>Low</strong><div class="count" style="color: var(--color-success);">{}</div></div>
                <div class="stat-item"><strong>Medium</strong><div class="count" style="color: var(--color-warning);">{}</div></div>
                <div class="stat-item"><strong>High</strong><div class="count" style="color: var(--color-error);">{}</div></div>
            </div>
        </div>"#,
            stats.info, stats.low, stats.medium, stats.high
        )
    }

    fn generate_findings(&self, report: &ScanReport) -> String {
        if report.findings.is_empty() {
            return "<h2>No vulnerabilities found.</h2>".to_string();
        }

        let mut html = String::from("<h2>Detected Vulnerabilities</h2>\n");
        for (index, finding) in report.findings.iter().enumerate() {
            html.push_str(&self.generate_finding(index, finding));
            html.push('\n');
        }
        html
    }

    fn generate_finding(&self, index: usize, finding: &Finding) -> String {
        let severity = finding
            .severity_ai
            .map(|s| s.as_str())
            .unwrap_or("medium");

        let mut sections = String::new();

        sections.push_str(&format!(
            r#"<div class="section">
                <p><strong>Template ID:</strong> {}</p>
                <p><strong>Risk Level:</strong> <span class="severity {}-sev">{}</span></p>
                <p><strong>Host:</strong> {}</p>
                <p><strong>Matched At:</strong> {}</p>
            </div>"#,
            escape_html(&finding.template_id),
            severity,
            severity,
            escape_html(&finding.host),
            escape_html(&finding.matched_at),
        ));

        let mut details = String::new();
        if !finding.ip.is_empty() {
            details.push_str(&format!(
                "<p><strong>IP:</strong> {}</p>",
                escape_html(&finding.ip)
            ));
        }
        if !finding.timestamp.is_empty() {
            details.push_str(&format!(
                "<p><strong>Timestamp:</strong> {}</p>",
                escape_html(&finding.timestamp)
            ));
        }
        if !finding.description_translated.is_empty() {
            details.push_str(&format!(
                "<p><strong>Description:</strong> {}</p>",
                escape_html(&finding.description_translated)
            ));
        }
        if !details.is_empty() {
            sections.push_str(&format!(r#"<div class="section">{}</div>"#, details));
        }

        if !finding.info.reference.is_empty() {
            let items: String = finding
                .info
                .reference
                .iter()
                .map(|r| format!("<li>{}</li>", escape_html(r)))
                .collect();
            sections.push_str(&format!(
                r#"<div class="section"><p><strong>References:</strong></p><ul>{}</ul></div>"#,
                items
            ));
        }

        if !finding.info.tags.is_empty() {
            sections.push_str(&format!(
                r#"<div class="section"><p><strong>Tags:</strong> {}</p></div>"#,
                escape_html(&finding.info.tags.join(", "))
            ));
        }

        let classification = &finding.info.classification;
        if !classification.cve_id.is_empty() || !classification.cwe_id.is_empty() {
            let mut block = String::from("<p><strong>Classification:</strong></p>");
            if !classification.cve_id.is_empty() {
                block.push_str(&format!(
                    "<p><strong>CVE:</strong> {}</p>",
                    escape_html(&classification.cve_id.join(", "))
                ));
            }
            if !classification.cwe_id.is_empty() {
                block.push_str(&format!(
                    "<p><strong>CWE:</strong> {}</p>",
                    escape_html(&classification.cwe_id.join(", "))
                ));
            }
            sections.push_str(&format!(r#"<div class="section">{}</div>"#, block));
        }

        if !finding.curl_command.is_empty() {
            sections.push_str(&format!(
                r#"<div class="section"><p><strong>CURL Command:</strong></p><div class="code">{}</div></div>"#,
                escape_html(&finding.curl_command)
            ));
        }

        if !finding.request.is_empty() {
            sections.push_str(&format!(
                r#"<div class="section"><p><strong>Request:</strong></p><div class="code">{}</div></div>"#,
                escape_html(&finding.request)
            ));
        }

        if !finding.recommendation_ai.is_empty() {
            sections.push_str(&format!(
                r#"<div class="recommendation"><strong>Remediation:</strong><p>{}</p></div>"#,
                escape_html(&finding.recommendation_ai)
            ));
        }

        format!(
            r#"<div class="vulnerability {}">
            <h3>{}: {}</h3>
            {}
        </div>"#,
            severity,
            index + 1,
            escape_html(&finding.info.name),
            sections
        )
    }
}

impl Default for HtmlReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::types::build_report;
    use crate::types::{AiSeverity, Finding};
    use chrono::Utc;

    fn sample_finding() -> Finding {
        let mut finding: Finding = serde_json::from_value(serde_json::json!({
            "template-id": "xss-reflected",
            "info": {
                "name": "Reflected XSS",
                "severity": "high",
                "description": "Input is reflected unescaped.",
                "reference": ["https://owasp.org/xss"],
                "tags": ["xss"],
                "classification": {"cve-id": [], "cwe-id": ["CWE-79"]}
            },
            "host": "https://example.com",
            "matched-at": "https://example.com/search?q=<script>alert(1)</script>",
            "ip": "93.184.216.34",
            "timestamp": "",
            "curl-command": "curl 'https://example.com/search?q=<script>'",
            "request": "",
            "response": "",
            "metadata": {}
        }))
        .unwrap();
        finding.severity_ai = Some(AiSeverity::High);
        finding.description_translated = "Reflected input".to_string();
        finding.recommendation_ai = "Escape output".to_string();
        finding
    }

    #[test]
    fn zero_findings_render_notice() {
        let report = build_report("https://example.com", Vec::new(), Utc::now());
        let html = String::from_utf8(HtmlReportGenerator::new().generate(&report)).unwrap();

        assert!(html.contains("No vulnerabilities found."));
        assert!(!html.contains("class=\"vulnerability"));
    }

    #[test]
    fn findings_render_with_severity_badge() {
        let report = build_report("https://example.com", vec![sample_finding()], Utc::now());
        let html = String::from_utf8(HtmlReportGenerator::new().generate(&report)).unwrap();

        assert!(html.contains("class=\"vulnerability high\""));
        assert!(html.contains("severity high-sev"));
        assert!(html.contains("Reflected XSS"));
        assert!(html.contains("CWE-79"));
        assert!(html.contains("Remediation:"));
    }

    #[test]
    fn attacker_controlled_values_are_escaped() {
        let report = build_report("https://example.com", vec![sample_finding()], Utc::now());
        let html = String::from_utf8(HtmlReportGenerator::new().generate(&report)).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn empty_optional_fields_omit_their_labels() {
        let mut finding = sample_finding();
        finding.ip.clear();
        finding.curl_command.clear();
        finding.info.reference.clear();
        finding.recommendation_ai.clear();

        let report = build_report("https://example.com", vec![finding], Utc::now());
        let html = String::from_utf8(HtmlReportGenerator::new().generate(&report)).unwrap();

        assert!(!html.contains("<strong>IP:</strong>"));
        assert!(!html.contains("CURL Command:"));
        assert!(!html.contains("References:"));
        assert!(!html.contains("Remediation:"));
    }
}
