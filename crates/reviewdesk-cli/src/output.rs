//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use reviewdesk_domain::api::{BatchResult, ExportManifest, RecordPage, StatsResponse};
use reviewdesk_domain::{AuditEntry, DomainEvent, ExtractionRecord, RecordStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one page of records.
    pub fn format_page(&self, page: &RecordPage) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
            OutputFormat::Quiet => Ok(ids(&page.records)),
            OutputFormat::Table => {
                if page.records.is_empty() {
                    return Ok(self.colorize("No records found.", "yellow"));
                }
                let mut out = self.records_table(&page.records);
                out.push_str(&format!(
                    "\nShowing {}-{} of {}",
                    page.offset + 1,
                    page.offset + page.records.len(),
                    page.total
                ));
                Ok(out)
            }
        }
    }

    fn records_table(&self, records: &[ExtractionRecord]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["ID", "Type", "Source", "Status", "Confidence", "Updated"]);

        for record in records {
            builder.push_record([
                record.id.to_string(),
                record.source.record_type.to_string(),
                record.source.source_file.clone(),
                self.status(record.status),
                format!("{:.0}%", record.confidence_score * 100.0),
                record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a record with its audit trail.
    pub fn format_record(&self, record: &ExtractionRecord, trail: &[AuditEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "record": record,
                "audit": trail,
            }))?),
            OutputFormat::Quiet => Ok(record.id.to_string()),
            OutputFormat::Table => {
                let mut out = String::new();
                out.push_str(&format!("Record:     {}\n", record.id));
                out.push_str(&format!(
                    "Source:     {} ({})\n",
                    record.source.source_file, record.source.record_type
                ));
                out.push_str(&format!("Status:     {}\n", self.status(record.status)));
                out.push_str(&format!(
                    "Confidence: {:.0}%\n",
                    record.confidence_score * 100.0
                ));
                if let Some(reviewer) = &record.reviewed_by {
                    out.push_str(&format!("Reviewer:   {}\n", reviewer));
                }
                if let Some(notes) = &record.review_notes {
                    out.push_str(&format!("Notes:      {}\n", notes));
                }

                out.push_str("\nData:\n");
                for (field, value) in record.final_data() {
                    let shown = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.push_str(&format!("  {}: {}\n", field, shown));
                }

                if !trail.is_empty() {
                    out.push_str("\nHistory:\n");
                    for entry in trail {
                        let from = entry
                            .from_status
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        out.push_str(&format!(
                            "  {}  {:<7} {} -> {}  {}\n",
                            entry.at.format("%Y-%m-%d %H:%M"),
                            entry.action,
                            from,
                            entry.to_status,
                            entry.actor.as_deref().unwrap_or("")
                        ));
                    }
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    /// Format a single changed record.
    pub fn format_updated(&self, action: &str, record: &ExtractionRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
            OutputFormat::Quiet => Ok(record.id.to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "{} {} ({})",
                action,
                record.id,
                record.status
            ))),
        }
    }

    /// Format record statistics.
    pub fn format_stats(&self, stats: &StatsResponse) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats.total.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Status", "Count"]);
                for (status, count) in &stats.by_status {
                    builder.push_record([status.clone(), count.to_string()]);
                }
                builder.push_record(["total".to_string(), stats.total.to_string()]);

                let mut table = builder.build();
                table.with(Style::rounded());

                let mut out = table.to_string();
                if let Some(avg) = stats.average_confidence {
                    out.push_str(&format!("\nAverage confidence: {:.0}%", avg * 100.0));
                }
                Ok(out)
            }
        }
    }

    /// One-line statistics summary.
    pub fn stats_line(&self, stats: &StatsResponse) -> String {
        format!(
            "{} pending, {} approved, {} rejected, {} exported",
            stats.pending_count, stats.approved_count, stats.rejected_count, stats.exported_count
        )
    }

    /// Format a batch outcome.
    pub fn format_batch(&self, result: &BatchResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Quiet => Ok(result
                .succeeded_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                let summary = format!("Batch {}: {}", result.operation, result.summary());
                if result.error_count == 0 {
                    lines.push(self.success(&summary));
                } else {
                    lines.push(self.warning(&summary));
                }
                for id in &result.skipped_ids {
                    lines.push(format!("  skipped {} (no longer reviewable)", id));
                }
                for item in &result.errors {
                    lines.push(self.error(&format!("{}: {}", item.record_id, item.error)));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format an export manifest.
    pub fn format_export(&self, manifest: &ExportManifest) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(manifest)?),
            OutputFormat::Quiet => Ok(ids(&manifest.records)),
            OutputFormat::Table => Ok(self.success(&format!(
                "Selected {} record(s) for {}, {} newly exported",
                manifest.records.len(),
                manifest.format,
                manifest.exported_ids.len()
            ))),
        }
    }

    /// Format one live notification.
    pub fn format_event(&self, event: &DomainEvent) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(event)?),
            OutputFormat::Quiet => Ok(event.id.to_string()),
            OutputFormat::Table => {
                let tag = format!("[{}]", event.event_type);
                let color = match event.event_type.as_str() {
                    "error" => "red",
                    t if t.ends_with("rejected") => "yellow",
                    t if t.ends_with("approved") || t == "export_complete" => "green",
                    _ => "cyan",
                };
                Ok(format!(
                    "{} {} {}",
                    event.timestamp.format("%H:%M:%S"),
                    self.colorize(&tag, color),
                    event.message
                ))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: RecordStatus) -> String {
        let color = match status {
            RecordStatus::Pending => "yellow",
            RecordStatus::Edited => "cyan",
            RecordStatus::Approved => "green",
            RecordStatus::Rejected => "red",
            RecordStatus::Exported => "magenta",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn ids(records: &[ExtractionRecord]) -> String {
    records
        .iter()
        .map(|r| r.id.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reviewdesk_domain::api::BatchItemError;
    use reviewdesk_domain::{EventType, RecordId, RecordType, SourceDocument};
    use serde_json::json;

    fn record() -> ExtractionRecord {
        ExtractionRecord::new(
            SourceDocument {
                source_file: "invoice_7.pdf".to_string(),
                record_type: RecordType::Invoice,
            },
            json!({"vendor": "Acme", "total": 99}).as_object().cloned().unwrap(),
            0.87,
            Utc::now(),
        )
        .unwrap()
    }

    fn page(records: Vec<ExtractionRecord>) -> RecordPage {
        RecordPage {
            total: records.len(),
            records,
            offset: 0,
            limit: 50,
            has_more: false,
        }
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_page(&page(vec![record()])).unwrap();
        assert!(output.contains("Source"));
        assert!(output.contains("invoice_7.pdf"));
        assert!(output.contains("87%"));
        assert!(output.contains("Showing 1-1 of 1"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let r = record();
        let output = formatter.format_page(&page(vec![r.clone()])).unwrap();
        assert_eq!(output, r.id.to_string());
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_page(&page(vec![record()])).unwrap();
        let parsed: RecordPage = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.total, 1);
    }

    #[test]
    fn test_empty_page() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_page(&page(vec![])).unwrap();
        assert!(output.contains("No records found"));
    }

    #[test]
    fn test_record_detail_shows_data_and_history() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let r = record();
        let trail = vec![AuditEntry::for_creation(&r)];
        let output = formatter.format_record(&r, &trail).unwrap();

        assert!(output.contains("vendor: Acme"));
        assert!(output.contains("total: 99"));
        assert!(output.contains("History:"));
        assert!(output.contains("create"));
    }

    #[test]
    fn test_batch_with_errors() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let failed = RecordId::new();
        let result = BatchResult {
            operation: "approve".to_string(),
            approved_count: 1,
            error_count: 1,
            succeeded_ids: vec![RecordId::new()],
            errors: vec![BatchItemError {
                record_id: failed,
                error: "Record not found".to_string(),
                code: "not_found".to_string(),
            }],
            ..Default::default()
        };

        let output = formatter.format_batch(&result).unwrap();
        assert!(output.contains("⚠ Batch approve: 1 succeeded, 1 failed, 0 skipped"));
        assert!(output.contains(&failed.to_string()));
    }

    #[test]
    fn test_event_line() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let event = DomainEvent::batch(EventType::BatchApproved, &[RecordId::new()]);
        let output = formatter.format_event(&event).unwrap();
        assert!(output.contains("[batch_approved]"));
        assert!(output.contains(&event.message));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
