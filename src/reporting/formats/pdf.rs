// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use std::io::BufWriter;

use crate::errors::ReportWriteError;
use crate::reporting::types::ScanReport;
use crate::types::Finding;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 10.0;
const VALUE_COLUMN_MM: f64 = 50.0;

/// Vertical cursor position (mm from the page top) that forces a new page.
const PAGE_BREAK_MM: f64 = 250.0;

const BODY_WRAP_CHARS: usize = 95;
const MONO_WRAP_CHARS: usize = 100;

pub struct PdfReportGenerator;

impl PdfReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, report: &ScanReport) -> Result<Vec<u8>, ReportWriteError> {
        let mut page = PageWriter::new("ChimeraScan Report")?;

        page.heading("ChimeraScan: DAST Scanner for Web Applications", 16.0);
        page.space(4.0);

        page.heading("Scan Information:", 12.0);
        page.body_line(&format!("Target URL: {}", report.target_url));
        page.body_line(&format!("Scan Time: {}", report.scan_time));
        page.body_line(&format!("Total Findings: {}", report.total_count));
        page.space(4.0);

        page.heading("Severity Statistics:", 12.0);
        page.body_line(&format!("Info:    {}", report.severity_stats.info));
        page.body_line(&format!("Low:     {}", report.severity_stats.low));
        page.body_line(&format!("Medium:  {}", report.severity_stats.medium));
        page.body_line(&format!("High:    {}", report.severity_stats.high));
        page.space(8.0);

        if report.findings.is_empty() {
            page.heading("No vulnerabilities found.", 12.0);
        } else {
            page.heading("Detailed Findings:", 14.0);
            page.space(4.0);
            for (index, finding) in report.findings.iter().enumerate() {
                write_finding(&mut page, index, finding);
            }
        }

        page.footer(&format!("Generated by ChimeraScan on {}", report.scan_time));
        page.finish()
    }
}

impl Default for PdfReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn write_finding(page: &mut PageWriter, index: usize, finding: &Finding) {
    page.break_if_needed();
    page.heading(&format!("{}. {}", index + 1, finding.info.name), 12.0);

    let severity = finding
        .severity_ai
        .map(|s| s.as_str())
        .unwrap_or("medium");

    page.label_value("Template ID:", &finding.template_id);
    page.label_value("Severity:", severity);
    page.label_value("Host:", &finding.host);
    page.label_value("Matched At:", &finding.matched_at);
    page.label_value("IP:", &finding.ip);

    if !finding.timestamp.is_empty() {
        page.label_value("Timestamp:", &finding.timestamp);
    }

    if !finding.info.description.is_empty() {
        page.label_line("Description:");
        page.body_block(&finding.info.description);
    }

    if !finding.info.reference.is_empty() {
        page.label_line("References:");
        for reference in &finding.info.reference {
            page.body_line(&format!("  {}", reference));
        }
    }

    if !finding.info.tags.is_empty() {
        page.label_line("Tags:");
        page.body_block(&finding.info.tags.join(", "));
    }

    let classification = &finding.info.classification;
    if !classification.cve_id.is_empty() || !classification.cwe_id.is_empty() {
        page.label_line("Classification:");
        if !classification.cve_id.is_empty() {
            page.body_line(&format!("CVE: {}", classification.cve_id.join(", ")));
        }
        if !classification.cwe_id.is_empty() {
            page.body_line(&format!("CWE: {}", classification.cwe_id.join(", ")));
        }
    }

    if !finding.curl_command.is_empty() {
        page.label_line("Curl Command:");
        page.mono_block(&finding.curl_command);
    }

    if !finding.request.is_empty() {
        page.label_line("Request:");
        page.mono_block(&finding.request);
    }

    page.space(3.0);
    page.divider();
}

enum FontKind {
    Regular,
    Bold,
    Mono,
    Italic,
}

/// Tracks a vertical cursor measured from the page top and starts a fresh
/// page whenever the cursor passes the break threshold.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    italic: IndirectFontRef,
    y: f64,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ReportWriteError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;
        let mono = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(render_err)?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(render_err)?;

        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            mono,
            italic,
            y: 15.0,
        })
    }

    fn break_if_needed(&mut self) {
        if self.y > PAGE_BREAK_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = 15.0;
        }
    }

    fn write(&mut self, text: &str, size: f64, x: f64, kind: FontKind) {
        self.break_if_needed();
        let font = match kind {
            FontKind::Regular => self.regular.clone(),
            FontKind::Bold => self.bold.clone(),
            FontKind::Mono => self.mono.clone(),
            FontKind::Italic => self.italic.clone(),
        };
        self.layer.use_text(
            ascii_safe(text),
            size,
            Mm(x),
            Mm(PAGE_HEIGHT_MM - self.y),
            &font,
        );
    }

    fn heading(&mut self, text: &str, size: f64) {
        self.write(text, size, MARGIN_MM, FontKind::Bold);
        self.y += 8.0;
    }

    fn body_line(&mut self, text: &str) {
        self.write(text, 10.0, MARGIN_MM, FontKind::Regular);
        self.y += 6.0;
    }

    fn body_block(&mut self, text: &str) {
        for line in wrap_text(text, BODY_WRAP_CHARS) {
            self.body_line(&line);
        }
    }

    fn label_line(&mut self, label: &str) {
        self.write(label, 10.0, MARGIN_MM, FontKind::Bold);
        self.y += 6.0;
    }

    fn label_value(&mut self, label: &str, value: &str) {
        self.write(label, 10.0, MARGIN_MM, FontKind::Bold);
        self.write(value, 10.0, VALUE_COLUMN_MM, FontKind::Regular);
        self.y += 6.0;
    }

    fn mono_block(&mut self, text: &str) {
        for line in wrap_text(text, MONO_WRAP_CHARS) {
            self.write(&line, 8.0, MARGIN_MM, FontKind::Mono);
            self.y += 5.0;
        }
    }

    fn space(&mut self, mm: f64) {
        self.y += mm;
    }

    fn divider(&mut self) {
        self.break_if_needed();
        let y = Mm(PAGE_HEIGHT_MM - self.y);
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), y), false),
                (Point::new(Mm(PAGE_WIDTH_MM - 2.0 * MARGIN_MM), y), false),
            ],
            is_closed: false,
            has_fill: false,
            has_stroke: true,
            is_clipping_path: false,
        };
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.78, 0.78, 0.78, None)));
        self.layer.set_outline_thickness(0.3);
        self.layer.add_shape(line);
        self.y += 10.0;
    }

    // Fixed position near the page bottom, outside normal cursor flow.
    fn footer(&self, text: &str) {
        self.layer.use_text(
            ascii_safe(text),
            8.0,
            Mm(60.0),
            Mm(PAGE_HEIGHT_MM - 280.0),
            &self.italic,
        );
    }

    fn finish(self) -> Result<Vec<u8>, ReportWriteError> {
        let mut buffer = BufWriter::new(Vec::new());
        self.doc.save(&mut buffer).map_err(render_err)?;
        buffer
            .into_inner()
            .map_err(|err| ReportWriteError::Render(err.to_string()))
    }
}

fn render_err(err: impl std::fmt::Display) -> ReportWriteError {
    ReportWriteError::Render(err.to_string())
}

/// Built-in PDF fonts only cover a latin subset; anything outside it is
/// replaced.
fn ascii_safe(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c
            } else {
                '?'
            }
        })
        .collect()
}

/// Word-wrap to a character width, hard-splitting oversized tokens (raw
/// requests and URLs routinely exceed any line width).
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut current = String::new();
        let mut count = 0usize;

        for word in raw.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_chars {
                if count > 0 {
                    lines.push(std::mem::take(&mut current));
                    count = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(max_chars) {
                    lines.push(chunk.iter().collect());
                }
                continue;
            }

            if count > 0 && count + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut current));
                count = 0;
            }

            if count > 0 {
                current.push(' ');
                count += 1;
            }
            current.push_str(word);
            count += word_len;
        }

        if count > 0 {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::types::build_report;
    use crate::types::{AiSeverity, Finding};
    use chrono::Utc;

    fn sample_finding(name: &str) -> Finding {
        let mut finding: Finding = serde_json::from_value(serde_json::json!({
            "template-id": "weak-tls",
            "info": {
                "name": name,
                "severity": "high",
                "description": "The server accepts weak cipher suites during the TLS handshake.",
                "reference": ["https://ref.example/tls"],
                "tags": ["ssl", "tls"],
                "classification": {"cve-id": ["CVE-2016-2183"], "cwe-id": ["CWE-326"]}
            },
            "host": "https://example.com",
            "matched-at": "https://example.com:443",
            "ip": "93.184.216.34",
            "timestamp": "2026-01-15T10:00:00Z",
            "curl-command": "curl -k https://example.com",
            "request": "GET / HTTP/1.1\nHost: example.com",
            "response": "",
            "metadata": {}
        }))
        .unwrap();
        finding.severity_ai = Some(AiSeverity::High);
        finding
    }

    #[test]
    fn empty_report_renders_notice() {
        let report = build_report("https://example.com", Vec::new(), Utc::now());
        let bytes = PdfReportGenerator::new().generate(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn many_findings_paginate() {
        let findings: Vec<Finding> = (0..40)
            .map(|i| sample_finding(&format!("Finding number {}", i)))
            .collect();
        let report = build_report("https://example.com", findings, Utc::now());

        let bytes = PdfReportGenerator::new().generate(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let empty = PdfReportGenerator::new()
            .generate(&build_report("https://example.com", Vec::new(), Utc::now()))
            .unwrap();
        assert!(bytes.len() > empty.len());
    }

    #[test]
    fn wrapping_handles_oversized_tokens() {
        let token = "A".repeat(250);
        let lines = wrap_text(&token, 100);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.chars().count() <= 100));
    }

    #[test]
    fn wrapping_preserves_words() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn non_latin_text_is_replaced_not_dropped() {
        assert_eq!(ascii_safe("abc"), "abc");
        assert_eq!(ascii_safe("п").len(), 1);
    }
}
