use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::Value;

use intake_core::{FieldAccessError, WizardError, WizardSession};

#[derive(Debug, Error)]
pub enum AnswersError {
    #[error("could not read answers file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse answers file `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("answers file `{0}` must be a flat TOML table")]
    NotATable(PathBuf),
    #[error("unknown answers key `{key}`; known fields: {}", .known.join(", "))]
    UnknownField { key: String, known: Vec<String> },
    #[error("answer `{key}` must be a string or an array of strings")]
    UnsupportedValue { key: String },
    #[error("could not apply answer `{key}`: {message}")]
    Apply { key: String, message: String },
}

/// Loads a flat TOML answers file: `key = "value"` feeds `set_field`, and
/// `key = ["a", "b"]` toggles each token into the multi-select field.
pub fn load(path: &Path) -> Result<toml::Table, AnswersError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| AnswersError::Read { path: path.to_path_buf(), source })?;
    let value = raw
        .parse::<Value>()
        .map_err(|source| AnswersError::Parse { path: path.to_path_buf(), source })?;
    match value {
        Value::Table(table) => Ok(table),
        _ => Err(AnswersError::NotATable(path.to_path_buf())),
    }
}

pub fn apply(session: &mut WizardSession, answers: &toml::Table) -> Result<(), AnswersError> {
    for (key, value) in answers {
        match value {
            Value::String(text) => {
                session
                    .set_field(key, text.as_str())
                    .map_err(|error| map_error(session, key, error))?;
            }
            Value::Array(items) => {
                for item in items {
                    let Value::String(token) = item else {
                        return Err(AnswersError::UnsupportedValue { key: key.clone() });
                    };
                    session
                        .toggle_member(key, token.as_str())
                        .map_err(|error| map_error(session, key, error))?;
                }
            }
            _ => return Err(AnswersError::UnsupportedValue { key: key.clone() }),
        }
    }
    Ok(())
}

fn map_error(session: &WizardSession, key: &str, error: WizardError) -> AnswersError {
    match error {
        WizardError::Field(FieldAccessError::UnknownField(_)) => AnswersError::UnknownField {
            key: key.to_owned(),
            known: session.plan().field_specs().map(|spec| spec.name.clone()).collect(),
        },
        other => AnswersError::Apply { key: key.to_owned(), message: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use intake_core::WizardSession;
    use tempfile::TempDir;

    use crate::commands::answers::{apply, load, AnswersError};

    fn write_answers(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("answers.toml");
        fs::write(&path, content).expect("write answers");
        (dir, path)
    }

    #[test]
    fn strings_and_arrays_feed_the_session() {
        let (_dir, path) = write_answers(
            r#"
name = "Jane Doe"
project_type = ["website", "ecommerce"]
"#,
        );
        let answers = load(&path).expect("load answers");
        let mut session = WizardSession::standard();

        apply(&mut session, &answers).expect("apply answers");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.text("name"), Some("Jane Doe"));
        let tokens = snapshot.tokens("project_type").expect("tokens");
        assert!(tokens.contains("website"));
        assert!(tokens.contains("ecommerce"));
    }

    #[test]
    fn unknown_keys_fail_fast_and_list_known_fields() {
        let (_dir, path) = write_answers("favourite_color = \"teal\"\n");
        let answers = load(&path).expect("load answers");
        let mut session = WizardSession::standard();

        let error = apply(&mut session, &answers).expect_err("unknown key");
        let AnswersError::UnknownField { key, known } = error else {
            panic!("expected UnknownField");
        };
        assert_eq!(key, "favourite_color");
        assert!(known.iter().any(|name| name == "email"));
    }

    #[test]
    fn non_string_values_are_rejected() {
        let (_dir, path) = write_answers("name = 42\n");
        let answers = load(&path).expect("load answers");
        let mut session = WizardSession::standard();

        let error = apply(&mut session, &answers).expect_err("numeric answer");
        assert!(matches!(error, AnswersError::UnsupportedValue { .. }));
    }
}
