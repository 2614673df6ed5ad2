//! HTTP client functionality for Volley
//!
//! Every virtual user posts through the same [`HttpManager`], which wraps
//! one pooled `reqwest` client. The [`InvocationClient`] trait is the seam
//! the load driver depends on, so runs can be exercised against fakes.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use client::{HttpManager, InvocationClient};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::{InvocationRequest, InvocationResponse};
