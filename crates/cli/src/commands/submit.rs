use std::path::Path;

use serde::Serialize;

use intake_client::HttpQuoteTransport;
use intake_core::config::{AppConfig, LoadOptions};
use intake_core::{
    AdvanceOutcome, SubmitOutcome, TracingNotificationSink, ValidationReport, WizardSession,
};

use crate::commands::{answers, CommandResult};

#[derive(Debug, Serialize)]
struct SubmitAccepted {
    command: &'static str,
    status: &'static str,
    request_id: String,
    endpoint_status: u16,
}

#[derive(Debug, Serialize)]
struct GateBlocked {
    command: &'static str,
    status: &'static str,
    step: u32,
    label: String,
    report: ValidationReport,
}

/// Walks a fresh wizard session forward through every gate using the answers
/// file, then performs the one outbound submission. Exit codes: 0 delivered,
/// 1 blocked by validation, 2 usage/config error, 3 delivery failed.
pub fn run(file: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("submit", "config_validation", error.to_string(), 2)
        }
    };

    let answers = match answers::load(file) {
        Ok(answers) => answers,
        Err(error) => return CommandResult::failure("submit", "answers", error.to_string(), 2),
    };

    let mut session = WizardSession::standard();
    if let Err(error) = answers::apply(&mut session, &answers) {
        return CommandResult::failure("submit", "answers", error.to_string(), 2);
    }

    while session.current_step() < session.total_steps() {
        match session.advance() {
            Ok(AdvanceOutcome::Advanced { .. }) => {}
            Ok(AdvanceOutcome::Blocked { report }) => {
                return blocked_result(&session, report);
            }
            Err(error) => {
                return CommandResult::failure("submit", "wizard", error.to_string(), 2)
            }
        }
    }

    let transport = match HttpQuoteTransport::from_config(&config.intake) {
        Ok(transport) => transport,
        Err(error) => return CommandResult::failure("submit", "transport", error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                2,
            )
        }
    };

    let sink = TracingNotificationSink;
    let outcome = runtime.block_on(session.submit(&transport, &sink));

    match outcome {
        Ok(SubmitOutcome::Delivered(receipt)) => {
            let payload = SubmitAccepted {
                command: "submit",
                status: "ok",
                request_id: receipt.request_id.0,
                endpoint_status: receipt.status,
            };
            CommandResult {
                exit_code: 0,
                output: serde_json::to_string(&payload)
                    .unwrap_or_else(|error| format!("submit report serialization failed: {error}")),
            }
        }
        Ok(SubmitOutcome::Failed(error)) => {
            CommandResult::failure("submit", "delivery", error.to_string(), 3)
        }
        Ok(SubmitOutcome::Rejected(report)) => blocked_result(&session, report),
        Err(error) => CommandResult::failure("submit", "wizard", error.to_string(), 2),
    }
}

fn blocked_result(session: &WizardSession, report: ValidationReport) -> CommandResult {
    let payload = GateBlocked {
        command: "submit",
        status: "blocked",
        step: session.current_step(),
        label: session.descriptor().label.clone(),
        report,
    };
    CommandResult {
        exit_code: 1,
        output: serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|error| format!("submit report serialization failed: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::commands::submit;

    #[test]
    fn incomplete_answers_block_at_the_first_failing_gate() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("answers.toml");
        fs::write(&path, "name = \"Jane Doe\"\n").expect("write answers");

        let result = submit::run(&path);
        assert_eq!(result.exit_code, 1, "output: {}", result.output);

        let payload: serde_json::Value =
            serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload["status"], "blocked");
        assert_eq!(payload["step"], 1);
        assert!(payload["report"]["violations"]["email"].is_array());
    }

    #[test]
    fn unreadable_answers_file_is_a_usage_error() {
        let result = submit::run(std::path::Path::new("missing-answers.toml"));
        assert_eq!(result.exit_code, 2);
    }
}
