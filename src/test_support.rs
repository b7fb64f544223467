// Shared fixtures for unit and HTTP tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{Role, TokenService};
use crate::bookings::Property;
use crate::payments::provider::{
    InitializePayload, InitializedTransaction, PaymentProvider, ProviderError, TransactionStatus,
    VerifiedTransaction,
};
use crate::store::{InMemoryStore, Stores};
use crate::{create_router, AppState};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

/// A four-guest property at 50 per night
pub fn sample_property(host_id: Uuid) -> Property {
    Property {
        id: Uuid::new_v4(),
        host_id,
        title: "Seaside loft".to_string(),
        price: dec!(50),
        capacity: 4,
        location: Some("Lisbon".to_string()),
        image_urls: vec!["https://img.example.com/loft.jpg".to_string()],
    }
}

/// Scripted payment provider
pub struct FakeProvider {
    verify_status: Mutex<TransactionStatus>,
    delay: Mutex<Duration>,
    initialized: Mutex<Vec<InitializePayload>>,
    verify_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            verify_status: Mutex::new(TransactionStatus::Success),
            delay: Mutex::new(Duration::ZERO),
            initialized: Mutex::new(Vec::new()),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_verify_status(&self, status: TransactionStatus) {
        *self.verify_status.lock().unwrap() = status;
    }

    /// Delay applied to every call before it answers
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn last_initialize(&self) -> Option<InitializePayload> {
        self.initialized.lock().unwrap().last().cloned()
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialized.lock().unwrap().len()
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn initialize(&self, payload: InitializePayload) -> Result<InitializedTransaction, ProviderError> {
        self.initialized.lock().unwrap().push(payload.clone());
        self.wait().await;

        let access_code = format!("ac_{}", self.initialize_calls());
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.test/{}", access_code),
            access_code,
            reference: payload.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, ProviderError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        let status = self.verify_status.lock().unwrap().clone();
        Ok(VerifiedTransaction {
            raw: json!({ "reference": reference, "status": status.as_str() }),
            status,
        })
    }
}

/// Router wired to an in-memory store and a fake provider
pub fn test_app(store: Arc<InMemoryStore>, provider: Arc<FakeProvider>, provider_timeout: Duration) -> (Router, Arc<TokenService>) {
    let tokens = Arc::new(TokenService::new(TEST_SECRET));
    let state = AppState::new(
        &Stores::in_memory(store),
        provider,
        tokens.clone(),
        provider_timeout,
        "http://localhost:3000".to_string(),
    );
    (create_router(state), tokens)
}

/// `Authorization` header value for a user with the given role
pub fn bearer(tokens: &TokenService, user_id: Uuid, role: Role) -> String {
    let token = tokens
        .issue_access_token(user_id, &format!("{}@example.com", role), role)
        .unwrap();
    format!("Bearer {}", token)
}
