//! Remote model gateway adapters.

pub mod http;

pub use http::HttpModelGateway;
