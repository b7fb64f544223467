// Payment provider seam: the reconciliation path only sees this trait

use async_trait::async_trait;
use serde_json::Value;

/// Transaction to open on the provider's hosted checkout
#[derive(Debug, Clone)]
pub struct InitializePayload {
    pub email: String,
    /// Amount in minor currency units (kobo, cents)
    pub amount_minor: i64,
    pub reference: String,
    pub callback_url: String,
    pub metadata: Value,
}

/// Hosted checkout opened by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Provider-side outcome of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Other(String),
}

impl TransactionStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => TransactionStatus::Success,
            "failed" => TransactionStatus::Failed,
            "abandoned" => TransactionStatus::Abandoned,
            other => TransactionStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Abandoned => "abandoned",
            TransactionStatus::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of asking the provider about a reference
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub status: TransactionStatus,
    /// Provider payload, kept for logging
    pub raw: Value,
}

/// Errors from talking to the payment provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered with a non-2xx status or `status: false`
    #[error("provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider did not answer in time")]
    Timeout,

    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn initialize(&self, payload: InitializePayload) -> Result<InitializedTransaction, ProviderError>;

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, ProviderError>;
}
