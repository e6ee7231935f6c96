use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::wizard::plan::StepPlan;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    SingleChoice,
    MultiSelect,
}

impl FieldKind {
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::MultiSelect)
    }
}

/// A field holds either one scalar string or a set of selected tokens.
/// The set representation makes duplicate tokens unrepresentable and keeps
/// payload serialization deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Tokens(BTreeSet<String>),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Tokens(tokens) => tokens.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Tokens(_) => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Text(_) => None,
            Self::Tokens(tokens) => Some(tokens),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldAccessError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` is a {actual:?} field and cannot be edited as {requested:?}")]
    KindMismatch { field: String, actual: FieldKind, requested: FieldKind },
}

/// The single mutable record of all form values for one wizard session.
///
/// Write constraints are not enforced here; the validation engine checks
/// content at gate time. The store only rejects structural misuse: unknown
/// field names and edits that do not match the field's kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldStore {
    kinds: BTreeMap<String, FieldKind>,
    values: BTreeMap<String, FieldValue>,
}

impl FieldStore {
    pub fn for_plan(plan: &StepPlan) -> Self {
        let mut kinds = BTreeMap::new();
        let mut values = BTreeMap::new();
        for spec in plan.field_specs() {
            kinds.insert(spec.name.clone(), spec.kind);
            let initial = match spec.kind {
                FieldKind::MultiSelect => FieldValue::Tokens(BTreeSet::new()),
                _ => FieldValue::Text(String::new()),
            };
            values.insert(spec.name.clone(), initial);
        }
        Self { kinds, values }
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.kinds.get(name).copied()
    }

    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), FieldAccessError> {
        match self.values.get_mut(name) {
            Some(FieldValue::Text(slot)) => {
                *slot = value.into();
                Ok(())
            }
            Some(FieldValue::Tokens(_)) => Err(FieldAccessError::KindMismatch {
                field: name.to_owned(),
                actual: FieldKind::MultiSelect,
                requested: FieldKind::Text,
            }),
            None => Err(FieldAccessError::UnknownField(name.to_owned())),
        }
    }

    /// Toggle semantics: presence is binary per token, so calling this twice
    /// with the same token restores the original set.
    pub fn toggle_member(
        &mut self,
        name: &str,
        token: impl Into<String>,
    ) -> Result<ToggleOutcome, FieldAccessError> {
        match self.values.get_mut(name) {
            Some(FieldValue::Tokens(tokens)) => {
                let token = token.into();
                if tokens.remove(&token) {
                    Ok(ToggleOutcome::Removed)
                } else {
                    tokens.insert(token);
                    Ok(ToggleOutcome::Added)
                }
            }
            Some(FieldValue::Text(_)) => Err(FieldAccessError::KindMismatch {
                field: name.to_owned(),
                actual: self.kinds.get(name).copied().unwrap_or(FieldKind::Text),
                requested: FieldKind::MultiSelect,
            }),
            None => Err(FieldAccessError::UnknownField(name.to_owned())),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { values: self.values.clone() }
    }
}

/// An immutable copy of the full field set at a point in time, used for
/// validation and for submission payload construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(FieldValue::as_text)
    }

    pub fn tokens(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.values.get(name).and_then(FieldValue::as_tokens)
    }

    /// A missing field counts as blank; stores built from a plan always carry
    /// every owned field, so this only matters for hand-built snapshots.
    pub fn is_blank(&self, name: &str) -> bool {
        self.values.get(name).map(FieldValue::is_blank).unwrap_or(true)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// JSON object whose keys are exactly the field names and whose values
    /// are the corresponding strings or string arrays. This is the outbound
    /// submission body, nothing more.
    pub fn payload(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (name, value) in &self.values {
            let entry = match value {
                FieldValue::Text(text) => Value::String(text.clone()),
                FieldValue::Tokens(tokens) => {
                    Value::Array(tokens.iter().map(|token| Value::String(token.clone())).collect())
                }
            };
            object.insert(name.clone(), entry);
        }
        Value::Object(object)
    }
}
