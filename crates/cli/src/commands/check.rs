use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use intake_core::{validate_step, FieldViolation, WizardSession};

use crate::commands::{answers, CommandResult};

#[derive(Debug, Serialize)]
struct CheckReport {
    command: &'static str,
    status: &'static str,
    steps: Vec<StepCheck>,
}

#[derive(Debug, Serialize)]
struct StepCheck {
    index: u32,
    label: String,
    valid: bool,
    violations: BTreeMap<String, Vec<FieldViolation>>,
}

/// Validates an answers file against one step gate or every gate. The gates
/// run against a single snapshot, exactly as the wizard would evaluate them.
pub fn run(file: &Path, step: Option<u32>) -> CommandResult {
    let answers = match answers::load(file) {
        Ok(answers) => answers,
        Err(error) => return CommandResult::failure("check", "answers", error.to_string(), 2),
    };

    let mut session = WizardSession::standard();
    if let Err(error) = answers::apply(&mut session, &answers) {
        return CommandResult::failure("check", "answers", error.to_string(), 2);
    }

    let plan = session.plan().clone();
    let snapshot = session.snapshot();

    if let Some(index) = step {
        if plan.descriptor(index).is_none() {
            return CommandResult::failure(
                "check",
                "unknown_step",
                format!("step {index} is out of range 1..={}", plan.total_steps()),
                2,
            );
        }
    }

    let mut checks = Vec::new();
    for descriptor in plan.steps() {
        if step.is_some_and(|index| index != descriptor.index) {
            continue;
        }
        let report = validate_step(descriptor, &snapshot);
        checks.push(StepCheck {
            index: descriptor.index,
            label: descriptor.label.clone(),
            valid: report.is_clean(),
            violations: report.violations,
        });
    }

    let all_valid = checks.iter().all(|check| check.valid);
    let report = CheckReport {
        command: "check",
        status: if all_valid { "ok" } else { "invalid" },
        steps: checks,
    };
    let output = serde_json::to_string_pretty(&report)
        .unwrap_or_else(|error| format!("check report serialization failed: {error}"));

    CommandResult { exit_code: u8::from(!all_valid), output }
}
