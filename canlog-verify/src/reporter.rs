//! 报告生成器模块
//!
//! 把校验结果渲染为控制台表格和结果总结

use crate::record_validator::{RecordStatus, ValidationReport};

/// 状态表头，与 `RecordStatus` 的列宽一致
pub fn status_header() -> String {
    format!(
        "{:<12} {:<12} {:<12} {:<12} {:<12}",
        "ID", "Time Diff", "Heartbeat", "Expected HB", "Status"
    )
}

/// 报告生成器
pub struct ReportGenerator {
    report_title: String,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new("Frame validation")
    }
}

impl ReportGenerator {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            report_title: title.into(),
        }
    }

    /// 生成逐帧状态表
    pub fn generate_status_table(&self, statuses: &[RecordStatus]) -> String {
        let mut table = String::new();
        table.push_str(&status_header());
        table.push('\n');
        for status in statuses {
            table.push_str(&status.to_string());
            table.push('\n');
        }
        table
    }

    /// 生成结果总结
    pub fn generate_summary(&self, report: &ValidationReport) -> String {
        let mut summary = String::new();
        summary.push_str(&format!("{} summary:\n", self.report_title));

        if report.is_clean() {
            summary.push_str("All frames passed validation.\n");
            return summary;
        }

        let failed = report.statuses.iter().filter(|s| !s.ok).count();
        summary.push_str(&format!(
            "Found {} issue(s) in {} of {} frame(s):\n",
            report.findings.len(),
            failed,
            report.statuses.len()
        ));
        for finding in &report.findings {
            summary.push_str(&finding.to_string());
            summary.push('\n');
        }
        summary
    }

    /// 状态表 + 空行 + 总结
    pub fn generate_report(&self, report: &ValidationReport) -> String {
        let mut out = self.generate_status_table(&report.statuses);
        out.push('\n');
        out.push_str(&self.generate_summary(report));
        out
    }
}
