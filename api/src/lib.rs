//! HTTP surface for a ChronoLog session
//!
//! One `SessionController` per process, exposed as JSON over axum. The
//! server is what a frontend talks to; the wallet itself sits behind the
//! controller's provider.

pub mod api;
pub mod error;

pub use api::server::{create_app, start_server};
pub use error::ApiError;
