pub mod availability;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod models;
pub mod price_calculator;
pub mod service;
pub mod status_machine;

pub use availability::*;
pub use error::*;
pub use handlers::*;
pub use locks::*;
pub use models::*;
pub use price_calculator::*;
pub use service::*;
pub use status_machine::*;
