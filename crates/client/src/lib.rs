//! HTTP delivery for quote requests.
//!
//! `HttpQuoteTransport` is the one concrete [`QuoteTransport`]: a single POST
//! of the snapshot payload to the configured intake endpoint. Any 2xx status
//! is acceptance; everything else is a delivery failure for the wizard to
//! surface and retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use intake_core::config::IntakeConfig;
use intake_core::delivery::{DeliveryError, DeliveryReceipt, QuoteTransport};
use intake_core::domain::request::QuoteRequest;

#[derive(Debug, Error)]
pub enum TransportBuildError {
    #[error("could not construct http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpQuoteTransport {
    client: Client,
    endpoint_url: String,
    auth_token: Option<SecretString>,
    timeout_secs: u64,
}

impl HttpQuoteTransport {
    pub fn from_config(config: &IntakeConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            auth_token: config.auth_token.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

#[async_trait]
impl QuoteTransport for HttpQuoteTransport {
    async fn deliver(&self, request: &QuoteRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let mut outbound = self
            .client
            .post(&self.endpoint_url)
            .header("x-request-id", request.id.0.as_str())
            .json(&request.payload());
        if let Some(token) = &self.auth_token {
            outbound = outbound.bearer_auth(token.expose_secret());
        }

        let response = outbound
            .send()
            .await
            .map_err(|error| classify_send_error(&error, &self.endpoint_url, self.timeout_secs))?;

        let status = response.status().as_u16();
        let receipt = receipt_for_status(request, status)?;
        tracing::debug!(
            event_name = "client.delivery_accepted",
            request_id = %request.id,
            status,
            "intake endpoint accepted quote request"
        );
        Ok(receipt)
    }
}

fn receipt_for_status(
    request: &QuoteRequest,
    status: u16,
) -> Result<DeliveryReceipt, DeliveryError> {
    if (200..300).contains(&status) {
        Ok(DeliveryReceipt::accepted(request.id.clone(), status))
    } else {
        Err(DeliveryError::Status { status })
    }
}

fn classify_send_error(
    error: &reqwest::Error,
    endpoint_url: &str,
    timeout_secs: u64,
) -> DeliveryError {
    if error.is_timeout() {
        DeliveryError::Timeout { secs: timeout_secs }
    } else if error.is_builder() {
        DeliveryError::InvalidEndpoint(endpoint_url.to_owned())
    } else {
        DeliveryError::Network(error.to_string())
    }
}
