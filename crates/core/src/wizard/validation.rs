use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::fields::{FieldKind, FieldValue, Snapshot};
use crate::wizard::plan::{FieldSpec, StepDescriptor};

pub const CODE_REQUIRED_FIELD_MISSING: &str = "REQUIRED_FIELD_MISSING";
pub const CODE_INVALID_EMAIL_FORMAT: &str = "INVALID_EMAIL_FORMAT";
pub const CODE_UNSUPPORTED_OPTION: &str = "UNSUPPORTED_OPTION";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Per-field violations for one step, produced fresh on every validation
/// call. A field absent from the map has no error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: BTreeMap<String, Vec<FieldViolation>>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self { valid: true, violations: BTreeMap::new() }
    }
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.valid
    }

    pub fn field_has_errors(&self, field: &str) -> bool {
        self.violations.contains_key(field)
    }

    pub fn push(&mut self, field: &str, violation: FieldViolation) {
        self.violations.entry(field.to_owned()).or_default().push(violation);
        self.valid = false;
    }

    /// Drops the displayed violations for one field. Used by the session when
    /// the user edits a scalar field, so its inline message disappears
    /// immediately; the next gate recomputes everything from scratch.
    pub fn clear_field(&mut self, field: &str) {
        self.violations.remove(field);
        self.valid = self.violations.is_empty();
    }
}

/// Pure step validation: maps (step descriptor, snapshot) to a fresh error
/// set. No side effects, no I/O, and no reliance on previously displayed
/// errors.
pub fn validate_step(descriptor: &StepDescriptor, snapshot: &Snapshot) -> ValidationReport {
    let mut report = ValidationReport::default();

    for spec in &descriptor.fields {
        let blank = snapshot.is_blank(&spec.name);

        if blank {
            if spec.requirement.is_required() {
                report.push(&spec.name, required_violation(spec));
            }
            continue;
        }

        match spec.kind {
            FieldKind::Email => {
                if let Some(value) = snapshot.text(&spec.name) {
                    if !email_shape_is_valid(value) {
                        report.push(&spec.name, email_violation(spec));
                    }
                }
            }
            FieldKind::SingleChoice => {
                if let Some(value) = snapshot.text(&spec.name) {
                    let trimmed = value.trim();
                    if !spec.options.iter().any(|option| option == trimmed) {
                        report.push(&spec.name, option_violation(spec, trimmed));
                    }
                }
            }
            FieldKind::MultiSelect => {
                if let Some(FieldValue::Tokens(tokens)) = snapshot.value(&spec.name) {
                    for token in tokens {
                        if !spec.options.iter().any(|option| option == token) {
                            report.push(&spec.name, option_violation(spec, token));
                        }
                    }
                }
            }
            FieldKind::Text => {}
        }
    }

    report
}

fn required_violation(spec: &FieldSpec) -> FieldViolation {
    let suggestion = if spec.options.is_empty() {
        None
    } else {
        Some(format!("Choose from: {}", spec.options.join(", ")))
    };
    FieldViolation {
        code: CODE_REQUIRED_FIELD_MISSING.to_owned(),
        message: format!("{} is required", spec.label),
        suggestion,
    }
}

fn email_violation(spec: &FieldSpec) -> FieldViolation {
    FieldViolation {
        code: CODE_INVALID_EMAIL_FORMAT.to_owned(),
        message: format!("{} must look like name@example.com", spec.label),
        suggestion: None,
    }
}

fn option_violation(spec: &FieldSpec, value: &str) -> FieldViolation {
    FieldViolation {
        code: CODE_UNSUPPORTED_OPTION.to_owned(),
        message: format!("{} has an unsupported option `{value}`", spec.label),
        suggestion: Some(format!("Choose from: {}", spec.options.join(", "))),
    }
}

/// `local@domain.tld` shape: non-empty local part, a dotted domain with a
/// non-empty trailing label, and no whitespace anywhere.
fn email_shape_is_valid(raw: &str) -> bool {
    let value = raw.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !host.starts_with('.') && !tld.is_empty()
}
