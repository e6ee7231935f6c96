use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::request::{QuoteRequest, RequestId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub request_id: RequestId,
    pub status: u16,
    pub completed_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn accepted(request_id: RequestId, status: u16) -> Self {
        Self { request_id, status, completed_at: Utc::now() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("quote intake endpoint returned status {status}")]
    Status { status: u16 },
    #[error("network failure while delivering quote request: {0}")]
    Network(String),
    #[error("quote request delivery timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("invalid quote intake endpoint `{0}`")]
    InvalidEndpoint(String),
}

/// The one outbound seam of the wizard: carries a complete quote request to
/// the intake endpoint. Implementations perform exactly one attempt per
/// call; retry policy lives with the user, who may resubmit at will.
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    async fn deliver(&self, request: &QuoteRequest) -> Result<DeliveryReceipt, DeliveryError>;
}
