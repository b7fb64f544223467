//! REST client for the Paystack transaction API.
//!
//! Only the two calls the booking flow needs are wrapped:
//! `POST /transaction/initialize` and `GET /transaction/verify/{reference}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::payments::provider::{
    InitializePayload, InitializedTransaction, PaymentProvider, ProviderError, TransactionStatus,
    VerifiedTransaction,
};

/// HTTP client for one Paystack account
pub struct PaystackClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Envelope Paystack wraps every response in
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

impl PaystackClient {
    /// * `base_url` - API root without trailing slash, e.g. `https://api.paystack.co`
    /// * `timeout` - Per-request bound applied by the HTTP client
    pub fn new(base_url: String, secret_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            secret_key,
        })
    }

    fn map_send_error(err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Request(err.to_string())
        }
    }

    /// Check the HTTP status and Paystack's own `status` flag, then return `data`
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        let http_status = response.status();
        let body = response.text().await.map_err(Self::map_send_error)?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !http_status.is_success() => {
                return Err(ProviderError::Rejected {
                    status: http_status.as_u16(),
                    message: body,
                })
            }
            Err(e) => return Err(ProviderError::Malformed(e.to_string())),
        };

        if !http_status.is_success() || !envelope.status {
            return Err(ProviderError::Rejected {
                status: http_status.as_u16(),
                message: envelope.message,
            });
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Malformed("response has no data".to_string()))
    }
}

#[async_trait]
impl PaymentProvider for PaystackClient {
    async fn initialize(&self, payload: InitializePayload) -> Result<InitializedTransaction, ProviderError> {
        let body = json!({
            "email": payload.email,
            "amount": payload.amount_minor,
            "reference": payload.reference,
            "callback_url": payload.callback_url,
            "metadata": payload.metadata,
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let data: InitializeData = Self::parse_response(response).await?;
        Ok(InitializedTransaction {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, ProviderError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let data: Value = Self::parse_response(response).await?;
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .map(TransactionStatus::parse)
            .ok_or_else(|| ProviderError::Malformed("transaction has no status".to_string()))?;

        Ok(VerifiedTransaction { status, raw: data })
    }
}
