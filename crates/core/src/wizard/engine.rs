use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::fields::Snapshot;
use crate::wizard::plan::{StepDescriptor, StepPlan};
use crate::wizard::validation::{validate_step, ValidationReport};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    Advanced { from: u32, to: u32 },
    Blocked { report: ValidationReport },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StepTransitionError {
    /// Final-step "next" intent belongs to the submission path, not the step
    /// controller; routing it here is caller misuse.
    #[error("cannot advance past final step {step}; submit instead")]
    AdvancePastFinalStep { step: u32 },
}

/// Finite state machine over step indices 1..=N with validation-gated
/// forward transitions and unguarded backward transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepController {
    plan: StepPlan,
    current: u32,
    display_report: ValidationReport,
}

impl StepController {
    pub fn new(plan: StepPlan) -> Self {
        Self { plan, current: 1, display_report: ValidationReport::default() }
    }

    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    pub fn current_step(&self) -> u32 {
        self.current
    }

    pub fn total_steps(&self) -> u32 {
        self.plan.total_steps()
    }

    pub fn is_final_step(&self) -> bool {
        self.current == self.plan.total_steps()
    }

    pub fn descriptor(&self) -> &StepDescriptor {
        // Plan construction guarantees contiguous 1-based indices, and the
        // controller never leaves the 1..=N range.
        self.plan
            .descriptor(self.current)
            .unwrap_or_else(|| &self.plan.steps()[0])
    }

    /// The error set recorded at the last failed gate, kept for display.
    pub fn display_report(&self) -> &ValidationReport {
        &self.display_report
    }

    pub fn clear_field_errors(&mut self, field: &str) {
        self.display_report.clear_field(field);
    }

    pub fn record_report(&mut self, report: ValidationReport) {
        self.display_report = report;
    }

    /// Validates the current step against the snapshot. On a clean report the
    /// step moves forward; otherwise the report is stored for display and the
    /// step stays put.
    pub fn advance(&mut self, snapshot: &Snapshot) -> Result<AdvanceOutcome, StepTransitionError> {
        if self.is_final_step() {
            return Err(StepTransitionError::AdvancePastFinalStep { step: self.current });
        }

        let report = validate_step(self.descriptor(), snapshot);
        if report.is_clean() {
            let from = self.current;
            self.current = (self.current + 1).min(self.plan.total_steps());
            self.display_report = ValidationReport::default();
            Ok(AdvanceOutcome::Advanced { from, to: self.current })
        } else {
            self.display_report = report.clone();
            Ok(AdvanceOutcome::Blocked { report })
        }
    }

    /// Unconditional backward transition. Never validates and never touches
    /// field values; stale display errors are dropped because they refer to
    /// the step being left.
    pub fn retreat(&mut self) -> u32 {
        self.current = self.current.saturating_sub(1).max(1);
        self.display_report = ValidationReport::default();
        self.current
    }
}
