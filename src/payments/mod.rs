pub mod error;
pub mod handlers;
pub mod models;
pub mod paystack;
pub mod provider;
pub mod service;

pub use error::*;
pub use handlers::*;
pub use models::*;
pub use paystack::PaystackClient;
pub use provider::PaymentProvider;
pub use service::*;
