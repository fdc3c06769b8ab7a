//! Output and display management

use crate::analysis::{self, DeviceSummary};
use crate::config::{OutputConfig, OutputFormat};
use crate::fetch::{cell_text, columns, TestRecord};
use crate::session::Session;
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use protocol::TestType;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Print the current result set, followed by the current error if any
    pub fn render(&self, session: &Session, format: OutputFormat) -> Result<()> {
        let records = session.results();
        match format {
            OutputFormat::Table => print!("{}", format_table(records)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        }

        self.print_error(session);
        Ok(())
    }

    /// Print per-device statistics instead of the records themselves
    pub fn render_summary(&self, session: &Session, format: OutputFormat) -> Result<()> {
        let summary = analysis::summarize(session.test_type(), session.results());
        match format {
            OutputFormat::Table => print!("{}", format_summary(session.test_type(), &summary)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        }

        self.print_error(session);
        Ok(())
    }

    fn print_error(&self, session: &Session) {
        if let Some(err) = session.last_error() {
            let message = format!("{} query failed: {}", session.test_type(), err);
            if self.config.use_colors {
                eprintln!("{}", message.as_str().red());
            } else {
                eprintln!("{}", message);
            }
        }
    }

    /// Print the filterable fields of `test_type` and the keys they accept
    pub fn print_fields(&self, test_type: TestType) {
        let heading = format!("{} filters", test_type.label());
        if self.config.use_colors {
            println!("{}", heading.as_str().bold());
        } else {
            println!("{}", heading);
        }

        for &field in test_type.fields() {
            let keys: Vec<String> = field
                .kind()
                .operators()
                .iter()
                .map(|&op| protocol::parameter_key(field, op))
                .collect();
            println!("  {:<20} {}", field.label(), keys.join(", "));
        }
    }

    /// Default export path inside the configured export directory
    pub fn export_path(&self, test_type: TestType) -> PathBuf {
        Path::new(&self.config.export_directory).join(format!(
            "livelab_{}_{}.csv",
            test_type,
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    }
}

/// Plain-text table: one column per field seen, in first-seen order
pub fn format_table(records: &[TestRecord]) -> String {
    if records.is_empty() {
        return "No matching test records\n".to_string();
    }

    let columns = columns(records);
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| columns.iter().map(|c| cell_text(r.get(c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let line = |cells: &[String], out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(&columns[..], &mut out);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    line(&rule[..], &mut out);
    for row in &rows {
        line(&row[..], &mut out);
    }
    let _ = writeln!(out, "{} record(s)", records.len());

    out
}

/// Per-device table: metric min/avg/max, or down counts for ping
pub fn format_summary(test_type: TestType, summary: &[DeviceSummary]) -> String {
    if summary.is_empty() {
        return "No matching test records\n".to_string();
    }

    let mut out = String::new();
    match test_type.metric() {
        Some(metric) => {
            let _ = writeln!(
                out,
                "{:<16} {:>8} {:>10} {:>10} {:>10}",
                "Device",
                "Records",
                format!("Min {}", metric),
                format!("Avg {}", metric),
                format!("Max {}", metric)
            );
            for row in summary {
                let (min, avg, max) = match row.metric {
                    Some(s) => (
                        format!("{:.2}", s.min),
                        format!("{:.2}", s.avg),
                        format!("{:.2}", s.max),
                    ),
                    None => ("-".to_string(), "-".to_string(), "-".to_string()),
                };
                let _ = writeln!(
                    out,
                    "{:<16} {:>8} {:>10} {:>10} {:>10}",
                    row.device, row.records, min, avg, max
                );
            }
        }
        None => {
            let _ = writeln!(out, "{:<16} {:>8} {:>8}", "Device", "Records", "Down");
            for row in summary {
                let _ = writeln!(out, "{:<16} {:>8} {:>8}", row.device, row.records, row.down);
            }
        }
    }

    out
}

/// Export records as CSV
pub fn export_csv(records: &[TestRecord], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {:?}", output_path))?;

    let columns = columns(records);

    // Write header
    writer.write_record(&columns)?;

    // Write records
    for record in records {
        writer.write_record(columns.iter().map(|c| cell_text(record.get(c))))?;
    }

    writer.flush()?;

    Ok(())
}
