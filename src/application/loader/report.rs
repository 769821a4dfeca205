//! Load results and the operator-facing summary

use std::time::Duration;

use tracing::info;

use crate::domain::entities::ModuleKind;

/// Outcome of one load attempt. Immutable after creation.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Display label, creator-qualified if applicable
    pub name: String,
    pub kind: ModuleKind,
    pub success: bool,
    /// Nothing new happened (every command definition lost a conflict)
    pub skipped: bool,
    pub elapsed_ms: u64,
    pub error: Option<String>,
    pub command_count: usize,
    pub interaction_handler_count: usize,
    /// Skip and malformed-definition notes
    pub messages: Vec<String>,
}

impl LoadResult {
    pub fn succeeded(name: impl Into<String>, kind: ModuleKind, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            kind,
            success: true,
            skipped: false,
            elapsed_ms: elapsed.as_millis() as u64,
            error: None,
            command_count: 0,
            interaction_handler_count: 0,
            messages: Vec::new(),
        }
    }

    pub fn failed(
        name: impl Into<String>,
        kind: ModuleKind,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            success: false,
            skipped: false,
            elapsed_ms: elapsed.as_millis() as u64,
            error: Some(error.into()),
            command_count: 0,
            interaction_handler_count: 0,
            messages: Vec::new(),
        }
    }

    pub fn with_counts(mut self, commands: usize, handlers: usize) -> Self {
        self.command_count = commands;
        self.interaction_handler_count = handlers;
        self
    }

    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages = messages;
        self
    }

    pub fn into_skipped(mut self) -> Self {
        self.success = false;
        self.skipped = true;
        self
    }

    /// One-line status for the verbose summary
    pub fn detail_line(&self) -> String {
        let status = if self.success {
            "ok"
        } else if self.skipped {
            "skipped"
        } else {
            "failed"
        };
        format!(
            "{} [{}] {} in {}ms (commands: {}, handlers: {})",
            self.name,
            self.kind,
            status,
            self.elapsed_ms,
            self.command_count,
            self.interaction_handler_count
        )
    }
}

/// Aggregated counts and timings for operator reporting.
///
/// The summary is the only artifact that outlives individual results, and it
/// resets after each report.
#[derive(Default)]
pub struct LoadSummary {
    results: Vec<LoadResult>,
    phases: Vec<(String, Duration)>,
}

/// Per-kind counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LoadSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: LoadResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, results: Vec<LoadResult>) {
        self.results.extend(results);
    }

    pub fn record_phase(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.phases.push((label.into(), elapsed));
    }

    pub fn counts(&self, kind: ModuleKind) -> KindCounts {
        let mut counts = KindCounts::default();
        for r in self.results.iter().filter(|r| r.kind == kind) {
            if r.success {
                counts.succeeded += 1;
            } else if r.skipped {
                counts.skipped += 1;
            } else {
                counts.failed += 1;
            }
        }
        counts
    }

    pub fn results(&self) -> &[LoadResult] {
        &self.results
    }

    /// Log the summary, with per-module detail under verbose, then reset.
    pub fn report(&mut self, verbose: bool) {
        for kind in [ModuleKind::Feature, ModuleKind::Command] {
            let c = self.counts(kind);
            if c.succeeded + c.skipped + c.failed == 0 {
                continue;
            }
            info!(
                "{} modules: {} loaded, {} skipped, {} failed",
                kind, c.succeeded, c.skipped, c.failed
            );
        }
        for (label, elapsed) in &self.phases {
            info!("{} took {}ms", label, elapsed.as_millis());
        }
        // Detail lines go out at info level so they survive the default
        // env-filter when the operator asked for them
        if verbose {
            for r in &self.results {
                info!("{}", r.detail_line());
                if let Some(e) = &r.error {
                    info!("{}: {}", r.name, e);
                }
                for m in &r.messages {
                    info!("{}: {}", r.name, m);
                }
            }
        }
        self.reset();
    }

    pub fn reset(&mut self) {
        self.results.clear();
        self.phases.clear();
    }
}
