// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::ReportWriteError;
use crate::reporting::types::ScanReport;

pub struct JsonReportGenerator;

impl JsonReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, report: &ScanReport) -> Result<Vec<u8>, ReportWriteError> {
        let mut json = serde_json::to_vec_pretty(report)
            .map_err(|err| ReportWriteError::Render(err.to_string()))?;
        json.push(b'\n');
        Ok(json)
    }
}

impl Default for JsonReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::types::build_report;
    use chrono::Utc;

    #[test]
    fn stable_field_order_with_indentation() {
        let report = build_report("https://example.com", Vec::new(), Utc::now());
        let bytes = JsonReportGenerator::new().generate(&report).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("{\n  \"target_url\""));
        let target_pos = text.find("\"target_url\"").unwrap();
        let time_pos = text.find("\"scan_time\"").unwrap();
        let findings_pos = text.find("\"findings\"").unwrap();
        let count_pos = text.find("\"total_count\"").unwrap();
        let stats_pos = text.find("\"severity_stats\"").unwrap();
        assert!(target_pos < time_pos && time_pos < findings_pos);
        assert!(findings_pos < count_pos && count_pos < stats_pos);
        assert!(text.ends_with("}\n"));
    }
}
