use intake_core::{FieldKind, StepPlan};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let plan = StepPlan::standard();
    let mut lines = vec![format!("standard intake plan ({} steps):", plan.total_steps())];

    for step in plan.steps() {
        lines.push(format!("{}. {}", step.index, step.label));
        for spec in &step.fields {
            let marker = if spec.requirement.is_required() { "required" } else { "optional" };
            let kind = match spec.kind {
                FieldKind::Text => "text",
                FieldKind::Email => "email",
                FieldKind::SingleChoice => "choice",
                FieldKind::MultiSelect => "multi-select",
            };
            let options = if spec.options.is_empty() {
                String::new()
            } else {
                format!(" [{}]", spec.options.join("|"))
            };
            lines.push(format!("   - {} ({kind}, {marker}){options}", spec.name));
        }
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

#[cfg(test)]
mod tests {
    use crate::commands::steps;

    #[test]
    fn steps_lists_every_step_with_requirement_markers() {
        let result = steps::run();
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("1. Contact"));
        assert!(result.output.contains("6. Project details"));
        assert!(result.output.contains("email (email, required)"));
        assert!(result.output.contains("company (text, optional)"));
        assert!(result.output.contains("timeline (choice, required)"));
    }
}
