//! Console output: live trace lines and the final run report.

use addrprobe_core::{DiagnosticRecord, LogSink, RunReport, Termination, TraceEvent, TraceSink};

use crate::errors::{CliError, EXIT_DATA_ERROR, EXIT_PASS};

/// Destination of one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// Standard output.
    Out(String),
    /// Standard error.
    Err(String),
}

/// Console rendering of a trace event, if it has one.
///
/// Data-error diagnostics go to stderr. Read samples (only emitted for
/// verbose runs) go to stdout.
#[must_use]
pub fn console_line(event: &TraceEvent) -> Option<ConsoleLine> {
    match *event {
        TraceEvent::DataError(record) => Some(ConsoleLine::Err(record.to_string())),
        TraceEvent::ReadSample {
            address,
            expected,
            observed,
            ..
        } => Some(ConsoleLine::Out(format!(
            "addr {address:08x} dat_r {expected:08x} -> {observed:08x}"
        ))),
        _ => None,
    }
}

/// Sink printing [`console_line`] output and forwarding every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    quiet_stdout: bool,
}

impl ConsoleSink {
    /// Creates a sink; with `quiet_stdout` every line goes to stderr so stdout
    /// stays machine-readable.
    #[must_use]
    pub const fn new(quiet_stdout: bool) -> Self {
        Self { quiet_stdout }
    }
}

impl TraceSink for ConsoleSink {
    fn on_event(&mut self, event: TraceEvent) {
        match console_line(&event) {
            Some(ConsoleLine::Out(line)) if !self.quiet_stdout => println!("{line}"),
            Some(ConsoleLine::Out(line) | ConsoleLine::Err(line)) => eprintln!("{line}"),
            None => {}
        }
        LogSink.on_event(event);
    }
}

/// Process exit code for a terminated run.
#[must_use]
pub const fn exit_code(report: &RunReport) -> i32 {
    match report.termination {
        Termination::Completed => EXIT_PASS,
        Termination::WatchdogTimeout { .. } => EXIT_DATA_ERROR,
    }
}

/// Human-readable report.
#[must_use]
pub fn render_text(report: &RunReport, address_width: u32) -> String {
    let verdict = match report.termination {
        Termination::Completed => "PASS",
        Termination::WatchdogTimeout { .. } => "FAIL (watchdog timeout)",
    };
    let counters = report.counters;
    let mut lines = vec![format!(
        "{verdict} after {} cycles: {} writes, {} reads, {} mismatches",
        report.cycles, counters.writes, counters.reads, counters.mismatches
    )];
    lines.extend(report.faults.iter().map(|latched| {
        let record = DiagnosticRecord::new(latched.stage, latched.fault, address_width);
        format!("  {record}")
    }));
    lines.join("\n")
}

/// JSON report.
///
/// # Errors
///
/// Returns [`CliError::Render`] if serialization fails.
pub fn render_json(report: &RunReport) -> Result<String, CliError> {
    serde_json::to_string_pretty(report).map_err(CliError::Render)
}
