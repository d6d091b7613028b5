//! Request validation and security-gate pipeline.
//!
//! Every mutating API call passes through [`gate::Gate`] before its handler
//! runs: content-type check, JSON parse, sanitization, rate limiting, CSRF
//! verification (where applicable), and field validation. Handlers never see
//! raw, unvalidated input.

pub mod csrf;
pub mod gate;
pub mod handlers;
pub mod rate_limit;
pub mod sanitize;
pub mod validate;
