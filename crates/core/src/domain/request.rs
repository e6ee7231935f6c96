use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::fields::Snapshot;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("QR-{}", Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One complete quote request as handed to the transport. The HTTP body is
/// `fields.payload()` alone; the id travels out-of-band (request header) and
/// `submitted_at` exists for logging and receipts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: RequestId,
    pub submitted_at: DateTime<Utc>,
    pub fields: Snapshot,
}

impl QuoteRequest {
    pub fn new(fields: Snapshot) -> Self {
        Self { id: RequestId::generate(), submitted_at: Utc::now(), fields }
    }

    pub fn payload(&self) -> serde_json::Value {
        self.fields.payload()
    }
}
