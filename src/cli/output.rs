//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::error::ImportError;
use crate::openapi::{ApiSpec, SecurityKind};
use crate::pipeline::PipelineReport;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Step row for table display.
#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Step")]
    name: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

/// Operation row for table display.
#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Method")]
    verb: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "System name")]
    system_name: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the report of a completed import.
    #[must_use]
    pub fn format_report(&self, report: &PipelineReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    fn format_report_text(report: &PipelineReport) -> String {
        let mut output = String::new();

        let service = match (&report.service_system_name, report.service_id) {
            (Some(name), Some(id)) => format!("{name} (id {id})"),
            (None, Some(id)) => format!("id {id}"),
            _ => String::from("unknown service"),
        };
        let _ = writeln!(output, "\n{} Imported into {service}", "✓".green());
        let _ = writeln!(output, "   Run: {}", report.run_id);
        let _ = writeln!(
            output,
            "   Started: {}",
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        output.push('\n');

        let rows: Vec<StepRow> = report
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| StepRow {
                index: i + 1,
                name: step.name.to_string(),
                duration: format!("{} ms", step.duration_ms),
            })
            .collect();
        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let _ = writeln!(
            output,
            "\n{} operations imported in {} steps",
            report.operations.to_string().green(),
            report.steps.len()
        );
        output
    }

    /// Formats the summary of an offline validation.
    #[must_use]
    pub fn format_validation(&self, spec: &ApiSpec, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&ValidationJson::new(spec, result)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_validation_text(spec, result),
        }
    }

    fn format_validation_text(spec: &ApiSpec, result: &ValidationResult) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\n{} {} is valid ({})",
            "✓".green(),
            spec.title().bold(),
            spec.version()
        );
        let _ = writeln!(output, "   Base path: {}", spec.base_path());
        if let Some(url) = spec.private_base_url() {
            let _ = writeln!(output, "   Backend: {url}");
        }
        let _ = writeln!(output, "   Security: {}", security_label(spec));
        output.push('\n');

        if spec.operations().is_empty() {
            output.push_str("   No operations defined.\n");
        } else {
            let rows: Vec<OperationRow> = spec
                .operations()
                .iter()
                .map(|op| OperationRow {
                    verb: op.verb.to_string(),
                    path: Self::truncate(&op.path, 50),
                    system_name: op.system_name(),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        if !result.warnings.is_empty() {
            let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
            for warning in &result.warnings {
                let _ = writeln!(output, "   - {warning}");
            }
        }

        output
    }

    /// Formats an error for display.
    #[must_use]
    pub fn format_error(&self, error: &ImportError) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": error.to_string() });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {error}", "✗".red()),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

fn security_label(spec: &ApiSpec) -> String {
    spec.security().map_or_else(
        || String::from("none"),
        |security| match &security.kind {
            SecurityKind::ApiKey { name, .. } => format!("api key '{name}' ({})", security.id),
            SecurityKind::OAuth2 { .. } => format!("oauth2 ({})", security.id),
        },
    )
}

// JSON serialization helpers

#[derive(Serialize)]
struct ValidationJson<'a> {
    title: &'a str,
    version: String,
    base_path: &'a str,
    private_base_url: Option<&'a str>,
    security: Option<&'a crate::openapi::Security>,
    operations: Vec<OperationJson<'a>>,
    warnings: &'a [String],
}

#[derive(Serialize)]
struct OperationJson<'a> {
    method: &'static str,
    path: &'a str,
    system_name: String,
}

impl<'a> ValidationJson<'a> {
    fn new(spec: &'a ApiSpec, result: &'a ValidationResult) -> Self {
        Self {
            title: spec.title(),
            version: spec.version().to_string(),
            base_path: spec.base_path(),
            private_base_url: spec.private_base_url(),
            security: spec.security(),
            operations: spec
                .operations()
                .iter()
                .map(|op| OperationJson {
                    method: op.verb.as_str(),
                    path: &op.path,
                    system_name: op.system_name(),
                })
                .collect(),
            warnings: &result.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::pipeline::StepRecord;

    fn report() -> PipelineReport {
        PipelineReport {
            run_id: Uuid::nil(),
            started_at: Utc::now(),
            finished_at: Some(Utc::now()),
            steps: vec![
                StepRecord {
                    name: "create service",
                    duration_ms: 12,
                },
                StepRecord {
                    name: "bump proxy version",
                    duration_ms: 3,
                },
            ],
            service_id: Some(42),
            service_system_name: Some("petstore".into()),
            operations: 2,
        }
    }

    fn petstore() -> ApiSpec {
        ApiSpec::from_document(&json!({
            "swagger": "2.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "host": "petstore.example.com",
            "schemes": ["https"],
            "paths": { "/pets": { "get": { "operationId": "listPets" } } }
        }))
        .expect("valid definition")
    }

    #[test]
    fn test_report_text() {
        let output = OutputFormatter::new(OutputFormat::Text).format_report(&report());
        assert!(output.contains("petstore (id 42)"));
        assert!(output.contains("create service"));
        assert!(output.contains("bump proxy version"));
        assert!(output.contains("12 ms"));
    }

    #[test]
    fn test_report_json() {
        let output = OutputFormatter::new(OutputFormat::Json).format_report(&report());
        let value: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(value["service_id"], 42);
        assert_eq!(value["run_id"], Uuid::nil().to_string());
        assert_eq!(value["steps"][0]["name"], "create service");
    }

    #[test]
    fn test_validation_summary() {
        let spec = petstore();
        let result = ValidationResult {
            errors: Vec::new(),
            warnings: vec!["no operations".into()],
        };

        let text = OutputFormatter::new(OutputFormat::Text).format_validation(&spec, &result);
        assert!(text.contains("Petstore"));
        assert!(text.contains("/pets"));
        assert!(text.contains("listpets"));
        assert!(text.contains("https://petstore.example.com"));
        assert!(text.contains("no operations"));

        let json = OutputFormatter::new(OutputFormat::Json).format_validation(&spec, &result);
        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["operations"][0]["method"], "GET");
        assert_eq!(value["operations"][0]["system_name"], "listpets");
        assert_eq!(value["security"], Value::Null);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("/pets", 10), "/pets");
        assert_eq!(OutputFormatter::truncate("/pets/{petId}/photos", 10), "/pets/{...");
    }
}
