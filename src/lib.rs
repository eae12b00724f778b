//! Proxy Validator
//!
//! Checks HTTP/HTTPS proxies concurrently by requesting an IP echo endpoint
//! through each one, and reports live valid/invalid counts and throughput.

pub mod display;
pub mod error;
pub mod proxy;

pub use error::CheckError;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
