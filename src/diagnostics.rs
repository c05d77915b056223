//! Training diagnostics: loss, wall time and resident memory at a fixed
//! reporting cadence, plus an end-of-run summary. Purely observational;
//! nothing here feeds back into the optimization.

use std::time::Duration;

/// Snapshot handed to the sink every reporting interval.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: usize,
    pub loss: f64,
    pub elapsed: Duration,
    pub resident_memory_mb: Option<f64>,
}

/// End-of-run totals.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub iterations_run: usize,
    pub final_loss: f64,
    pub total_time: Duration,
    pub peak_memory_mb: Option<f64>,
}

/// Receiver for training telemetry.
pub trait DiagnosticsSink {
    fn report(&mut self, report: &IterationReport);
    fn summary(&mut self, summary: &TrainingSummary);
}

/// Prints one line per report to stdout.
pub struct StdoutDiagnostics;

impl DiagnosticsSink for StdoutDiagnostics {
    fn report(&mut self, r: &IterationReport) {
        match r.resident_memory_mb {
            Some(mb) => println!(
                "[Iter {}] Loss: {:.5e}, elapsed: {:.2?}, RSS: {:.1} MB",
                r.iteration, r.loss, r.elapsed, mb
            ),
            None => println!(
                "[Iter {}] Loss: {:.5e}, elapsed: {:.2?}",
                r.iteration, r.loss, r.elapsed
            ),
        }
    }

    fn summary(&mut self, s: &TrainingSummary) {
        println!(
            "Training finished: {} iterations, final loss {:.5e}, total time {:.2?}",
            s.iterations_run, s.final_loss, s.total_time
        );
        if let Some(mb) = s.peak_memory_mb {
            println!("Peak resident memory: {mb:.1} MB");
        }
    }
}

/// Discards everything; for tests and benchmarks.
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn report(&mut self, _: &IterationReport) {}
    fn summary(&mut self, _: &TrainingSummary) {}
}

/// Resident set size of the current process in megabytes, if the platform
/// exposes it.
#[cfg(target_os = "linux")]
pub fn resident_memory_mb() -> Option<f64> {
    // statm reports pages; assumes the common 4 KiB page size.
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: f64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * 4096.0 / (1024.0 * 1024.0))
}

#[cfg(not(target_os = "linux"))]
pub fn resident_memory_mb() -> Option<f64> {
    None
}
