// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes, and receives deploy events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::deploy::{Operation, Outcome, StackResult, Summary};
use crate::events::{DeployEvent, EventSink};
use crate::types::{OutputMap, StackName, StackStatus};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                self.print_json(&JsonEvent::new("success", message, self.duration()), false);
            }
        }
    }

    /// Print a warning (partial failures).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => {
                self.print_json(&JsonEvent::new("warning", message, self.duration()), true);
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                self.print_json(&JsonEvent::new("error", message, self.duration()), true);
            }
        }
    }

    /// Report how a group operation ended.
    pub fn summary(&self, summary: &Summary) {
        let verb = match summary.operation() {
            Operation::Deploy => "deploy",
            Operation::Delete => "delete",
        };

        match summary.outcome() {
            Outcome::Success => self.success(&format!(
                "{} of {} stacks completed without error",
                summary.succeeded(),
                summary.total()
            )),
            Outcome::Partial(fraction) => self.warning(&format!(
                "{}% of stacks failed to {verb} properly. Please check the logs or the AWS console.",
                failed_percent(fraction)
            )),
            Outcome::Failure => self.error(&format!(
                "the {verb} process reported errors. Please check the logs or the AWS console."
            )),
        }

        if self.mode == OutputMode::Normal {
            for (name, result) in summary.results() {
                match result {
                    StackResult::Succeeded(outcome) => println!("  {name}: {outcome}"),
                    StackResult::Failed(e) => println!("  {name}: failed ({e})"),
                    StackResult::Skipped => println!("  {name}: skipped"),
                }
            }
        }
    }

    /// Report one stack's remote status and outputs.
    pub fn stack_status(
        &self,
        stack: &StackName,
        exists: bool,
        status: Option<&StackStatus>,
        outputs: Option<&OutputMap>,
    ) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                match (exists, status) {
                    (false, _) => println!("{stack}: does not exist"),
                    (true, Some(status)) => println!("{stack}: {status}"),
                    (true, None) => println!("{stack}: status unknown"),
                }
                if self.mode == OutputMode::Normal {
                    for (key, value) in outputs.into_iter().flatten() {
                        println!("    {key} = {value}");
                    }
                }
            }
            OutputMode::Json => {
                let report = StackReport {
                    stack: stack.as_str(),
                    exists,
                    status,
                    outputs,
                };
                if let Ok(json) = serde_json::to_string(&report) {
                    println!("{json}");
                }
            }
        }
    }

    fn print_json(&self, event: &JsonEvent<'_>, to_stderr: bool) {
        if let Ok(json) = serde_json::to_string(event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

/// Whole percent of stacks that did not succeed, e.g. 0.75 succeeded -> 25.
pub fn failed_percent(fraction: f64) -> u32 {
    ((1.0 - fraction) * 100.0).round() as u32
}

impl EventSink for Output {
    fn emit(&self, event: &DeployEvent) {
        tracing::debug!(stack = %event.stack(), event = event.name(), "deploy event");
        match self.mode {
            OutputMode::Normal => match event {
                DeployEvent::Failed { .. } => eprintln!("{}", event.message()),
                _ => println!("{}", event.message()),
            },
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let message = event.message();
                let mut json = JsonEvent::new(event.name(), message.trim(), self.duration());
                json.stack = Some(event.stack().as_str());
                self.print_json(&json, false);
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, message: &'a str, duration_secs: Option<f64>) -> Self {
        Self {
            event,
            message,
            stack: None,
            timestamp: Utc::now(),
            duration_secs,
        }
    }
}

#[derive(Serialize)]
struct StackReport<'a> {
    stack: &'a str,
    exists: bool,
    status: Option<&'a StackStatus>,
    outputs: Option<&'a OutputMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_percent_rounds() {
        assert_eq!(failed_percent(0.75), 25);
        assert_eq!(failed_percent(2.0 / 3.0), 33);
        assert_eq!(failed_percent(1.0), 0);
    }

    #[test]
    fn json_event_serializes_stack_when_present() {
        let mut event = JsonEvent::new("creating", "creating app...", None);
        event.stack = Some("app");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "creating");
        assert_eq!(json["stack"], "app");
        assert!(json.get("duration_secs").is_none());
    }
}
