//! Human and JSON reports for validation results

use std::path::Path;
use std::time::Duration;

use crate::cli::VerbosityLevel;
use crate::validator::{
    FileValidationResult, PerformanceMetrics, ValidationResults, ValidationStatus,
};

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    /// Colors are enabled when stdout is a terminal
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self::with_colors(verbosity, atty::is(atty::Stream::Stdout))
    }

    pub fn with_colors(verbosity: VerbosityLevel, show_colors: bool) -> Self {
        Self {
            verbosity,
            show_colors,
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        match self.verbosity {
            VerbosityLevel::Quiet => {
                if results.has_errors() {
                    output.push_str(&format!(
                        "Errors: {} Invalid: {}\n",
                        results.error_files, results.invalid_files
                    ));
                }
            }
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                for file_result in &results.file_results {
                    if self.verbosity == VerbosityLevel::Verbose || !file_result.status.is_valid() {
                        output.push_str(&self.format_file_result(file_result));
                        output.push('\n');
                    }
                }
                if !results.file_results.is_empty() {
                    output.push('\n');
                }
                output.push_str(&self.format_summary(results));
            }
        }

        output
    }

    pub fn format_file_result(&self, result: &FileValidationResult) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        match &result.status {
            ValidationStatus::Valid => {
                format!(
                    "{}  {} ({})",
                    self.colorize("✓ VALID", "32"),
                    path_display,
                    duration_str
                )
            }
            ValidationStatus::Invalid { path, line, reason } => {
                let mut output = format!(
                    "{}  {} ({}) - {}",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    duration_str,
                    path
                );
                if *line > 0 {
                    output.push_str(&format!(" (line {})", line));
                }
                output.push_str(&format!("\n    {}", reason));
                output
            }
            ValidationStatus::Error { message } => {
                format!(
                    "{}  {} ({}) - {}",
                    self.colorize("⚠ ERROR", "33"),
                    path_display,
                    duration_str,
                    message
                )
            }
            ValidationStatus::Skipped { reason } => {
                format!(
                    "{}  {} - {}",
                    self.colorize("- SKIPPED", "36"),
                    path_display,
                    reason
                )
            }
        }
    }

    fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid_files
        ));

        if results.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid_files
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.error_files
            ));
        }
        if results.skipped_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped_files
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.performance_metrics.total_duration)
        ));

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&self.format_performance_metrics(&results.performance_metrics));
        }

        output
    }

    fn format_performance_metrics(&self, metrics: &PerformanceMetrics) -> String {
        let mut output = String::new();
        output.push_str("\nPerformance Metrics:\n");
        output.push_str(&format!(
            "  Discovery: {}\n",
            format_duration(metrics.discovery_duration)
        ));
        output.push_str(&format!(
            "  Validation: {}\n",
            format_duration(metrics.validation_duration)
        ));
        output.push_str(&format!(
            "  Throughput: {:.1} files/sec\n",
            metrics.throughput_files_per_second
        ));
        output.push_str(&format!("  Threads: {}\n", metrics.threads));
        output
    }

    /// One-line report for a packet written by `demo`
    pub fn format_packet_written(&self, path: &Path, valid: bool) -> Option<String> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }
        let status = if valid {
            self.colorize("✓ VALID", "32")
        } else {
            self.colorize("✗ INVALID", "31")
        };
        Some(format!("{}  wrote {}", status, path.display()))
    }
}

/// Validation results as JSON
pub fn format_json(results: &ValidationResults, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(results)
    } else {
        serde_json::to_string(results)
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
