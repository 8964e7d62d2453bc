//! Terminal Output
//!
//! Human-readable colored output and a single JSON document for scripted
//! runs. Nothing here decides anything: it only renders an [`AnalysisRun`]
//! and, when a report was uploaded, the delivery result.
//!
//! ### JSON Output
//! With `json_output` enabled a run prints exactly one object:
//! ```json
//! {
//!   "status": "report",
//!   "parsed": { "records": 3, "malformed_lines": 1, "total_lines": 4 },
//!   "window": "Peak Hours (2024-05-01)",
//!   "report_path": "./adguard_analysis_all_clients_2024-05-01.xlsx",
//!   "total_queries": 3,
//!   "top_domains": [ { "Domain": "a.com", "Access_Count": 2 } ]
//! }
//! ```
//! `status` is one of `report`, `no_activity` or `no_activity_for_target`.

use crate::aggregator::ScopeSummary;
use crate::analyzer::{AnalysisRun, RunOutcome};
use colored::Colorize;
use serde_json::{json, Value};

/// Result of uploading a finished report.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Delivered { url: String, bytes: usize },
    Failed { error: String },
}

pub struct DisplayManager {
    json_output: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl DisplayManager {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Print a run, and the delivery result when there is one.
    pub fn display_run(&self, run: &AnalysisRun, delivery: Option<&DeliveryStatus>) {
        if self.json_output {
            let mut output = Self::run_json(run);
            if let Some(status) = delivery {
                output["delivery"] = Self::delivery_json(status);
            }
            match serde_json::to_string_pretty(&output) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing run to JSON: {}", e),
            }
            return;
        }

        self.print_run(run);
        if let Some(status) = delivery {
            self.print_delivery(status);
        }
    }

    /// JSON document describing a run.
    pub fn run_json(run: &AnalysisRun) -> Value {
        let parsed = json!({
            "records": run.stats.records,
            "malformed_lines": run.stats.malformed_lines,
            "total_lines": run.stats.total_lines,
        });

        match &run.outcome {
            RunOutcome::Report { path, aggregation } => json!({
                "status": "report",
                "parsed": parsed,
                "window": aggregation.window_label,
                "scope": aggregation.scope.to_string(),
                "report_path": path.display().to_string(),
                "total_queries": aggregation.total_queries(),
                "top_domains": aggregation.top_domains,
                "time_blocks": aggregation.time_blocks,
            }),
            RunOutcome::NoActivity {
                window,
                reference_date,
            } => json!({
                "status": "no_activity",
                "parsed": parsed,
                "window": window.to_string(),
                "reference_date": reference_date.map(|d| d.to_string()),
            }),
            RunOutcome::NoActivityForTarget {
                client_ip,
                window_label,
            } => json!({
                "status": "no_activity_for_target",
                "parsed": parsed,
                "window": window_label,
                "client_ip": client_ip,
            }),
        }
    }

    fn delivery_json(status: &DeliveryStatus) -> Value {
        match status {
            DeliveryStatus::Delivered { url, bytes } => json!({
                "delivered": true,
                "url": url,
                "bytes": bytes,
            }),
            DeliveryStatus::Failed { error } => json!({
                "delivered": false,
                "error": error,
            }),
        }
    }

    fn print_run(&self, run: &AnalysisRun) {
        println!("\n{}", "=".repeat(60).bright_cyan());
        println!("{}", "AdGuard Query Log Analysis".bright_white().bold());
        println!("{}", "=".repeat(60).bright_cyan());

        println!(
            "\n{} {} records parsed • {} malformed lines skipped",
            "📄".bright_yellow(),
            run.stats.records.to_string().bright_white().bold(),
            run.stats.malformed_lines.to_string().bright_yellow()
        );

        match &run.outcome {
            RunOutcome::NoActivity {
                window,
                reference_date,
            } => {
                let day = reference_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "the log".to_string());
                println!(
                    "\n{} No activity in the {} window for {}. No report written.",
                    "⚠".bright_yellow(),
                    window,
                    day
                );
            }
            RunOutcome::NoActivityForTarget {
                client_ip,
                window_label,
            } => {
                println!(
                    "\n{} No activity for {} during {}. No report written.",
                    "⚠".bright_yellow(),
                    client_ip.bright_white().bold(),
                    window_label
                );
            }
            RunOutcome::Report { path, aggregation } => {
                println!(
                    "\n{} {} • {} • {} queries",
                    "📅".bright_blue(),
                    aggregation.window_label.bright_white().bold(),
                    aggregation.scope.to_string().bright_cyan(),
                    aggregation.total_queries().to_string().bright_white().bold()
                );

                match &aggregation.summary {
                    ScopeSummary::Target(target) => {
                        println!(
                            "   Avg response: {} ms • Most accessed: {} • Busiest hour: {}",
                            format!("{:.2}", target.avg_response_ms).bright_green(),
                            target.most_accessed_domain.bright_cyan(),
                            target.busiest_hour.bright_white()
                        );
                    }
                    ScopeSummary::Clients(clients) => {
                        println!("   Clients: {}", clients.len().to_string().bright_white().bold());
                    }
                }

                if !aggregation.top_domains.is_empty() {
                    println!("\n{} Top domains:", "🌐".bright_blue());
                    for (rank, entry) in aggregation.top_domains.iter().enumerate() {
                        println!(
                            "   {:>2}. {} ({})",
                            rank + 1,
                            entry.domain.bright_cyan(),
                            entry.access_count.to_string().bright_white()
                        );
                    }
                }

                println!(
                    "\n{} Report saved to {}",
                    "✅".bright_green(),
                    path.display().to_string().bright_white().bold()
                );
            }
        }
        println!();
    }

    fn print_delivery(&self, status: &DeliveryStatus) {
        match status {
            DeliveryStatus::Delivered { url, bytes } => println!(
                "{} Uploaded {} bytes to {}",
                "📤".bright_green(),
                bytes,
                url.bright_white()
            ),
            DeliveryStatus::Failed { error } => println!(
                "{} Upload failed, report kept on disk: {}",
                "✗".bright_red(),
                error
            ),
        }
    }
}
