//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DelegationParams`]: poll interval, wait budget, approval and probe caching
//! - [`RetryPolicy`]: bounded backoff for transient backend errors

pub mod delegation_params;
pub mod retry_policy;

pub use delegation_params::DelegationParams;
pub use retry_policy::RetryPolicy;
