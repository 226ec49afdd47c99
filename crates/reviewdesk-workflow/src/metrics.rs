//! Metrics collection for workflow operations

use reviewdesk_domain::ActionKind;
use serde::Serialize;
use std::collections::HashMap;

/// Counters for review activity since startup (or the last reset)
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowMetrics {
    /// Successful transitions per action
    pub transitions: HashMap<ActionKind, usize>,

    /// Records created
    pub created: usize,

    /// Batch runs completed
    pub batch_runs: usize,

    /// Per-item failures captured inside batches
    pub batch_errors: usize,

    /// Ids skipped by batches because they were no longer eligible
    pub batch_skipped: usize,

    /// Optimistic precondition mismatches
    pub conflicts: usize,

    /// Export runs completed
    pub exports: usize,
}

impl WorkflowMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful transition
    pub fn record_transition(&mut self, action: ActionKind) {
        *self.transitions.entry(action).or_insert(0) += 1;
    }

    /// Record a created record
    pub fn record_created(&mut self) {
        self.created += 1;
    }

    /// Record a finished batch
    pub fn record_batch(&mut self, errors: usize, skipped: usize) {
        self.batch_runs += 1;
        self.batch_errors += errors;
        self.batch_skipped += skipped;
    }

    /// Record a precondition mismatch
    pub fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    /// Record a finished export
    pub fn record_export(&mut self) {
        self.exports += 1;
    }

    /// Total successful transitions across all actions
    pub fn total_transitions(&self) -> usize {
        self.transitions.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Workflow Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Records created: {}", self.created),
            format!("Transitions: {}", self.total_transitions()),
        ];

        for action in ActionKind::ALL {
            if let Some(count) = self.transitions.get(&action) {
                lines.push(format!("  {}: {}", action, count));
            }
        }

        lines.push(format!(
            "Batches: {} ({} errors, {} skipped)",
            self.batch_runs, self.batch_errors, self.batch_skipped
        ));
        lines.push(format!("Conflicts: {}", self.conflicts));
        lines.push(format!("Exports: {}", self.exports));

        lines.join("\n")
    }
}
