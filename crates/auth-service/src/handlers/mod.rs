//! HTTP request handlers for the auth service.

pub mod health;
pub mod metrics;
pub mod session;
pub mod validate;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use session::{login, logout};
pub use validate::validate;
