//! The request gate: one ordered pass/fail pipeline for every mutating call.
//!
//! Per-request state machine, terminal at first failure:
//! content-type check, JSON parse, sanitize, rate check (daily then endpoint
//! scope), CSRF check unless the route is exempt, then field validation.
//! Only a fully admitted, sanitized payload ever reaches a handler.
//!
//! The gate is deliberately framework-decoupled: it consumes a plain
//! [`GateInput`] and returns `Result<Value, AppError>`; the Axum types only
//! appear in the [`Gate::input`] adapter.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::errors::AppError;
use crate::security::csrf::{cookie_value, CsrfStore, CSRF_HEADER, SESSION_COOKIE};
use crate::security::rate_limit::{RateLimiter, RateScope};
use crate::security::sanitize::sanitize_value;
use crate::security::validate::{check_fields, FieldRule};

/// Declarative per-route policy consumed uniformly by the gate.
///
/// The CSRF exemption flag is part of the route contract: exempt routes are
/// protected by strict validation plus rate limiting instead (or are invoked
/// cross-origin by the payment widget), and the list must not be generalized.
pub struct EndpointPolicy {
    pub scope: RateScope,
    pub csrf_exempt: bool,
    pub fields: &'static [FieldRule],
}

/// Framework-independent view of an incoming request.
pub struct GateInput<'a> {
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
    /// Rate-limit bucket key, derived from the source address.
    pub client: String,
    /// Verified session id (bad cookie signatures resolve to `None`).
    pub session: Option<String>,
    pub csrf_token: Option<&'a str>,
}

/// Owns the two shared mutable resources of the pipeline: the rate-limit
/// counter table and the CSRF token store. Injected via `AppState`.
pub struct Gate {
    limiter: RateLimiter,
    csrf: CsrfStore,
}

impl Gate {
    pub fn new(session_secret: String) -> Self {
        Self {
            limiter: RateLimiter::new(),
            csrf: CsrfStore::new(session_secret),
        }
    }

    pub fn csrf(&self) -> &CsrfStore {
        &self.csrf
    }

    /// Builds a [`GateInput`] from Axum request parts.
    pub fn input<'a>(
        &self,
        addr: &SocketAddr,
        headers: &'a HeaderMap,
        body: &'a [u8],
    ) -> GateInput<'a> {
        let session = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| cookie_value(raw, SESSION_COOKIE))
            .and_then(|value| self.csrf.session_from_cookie(value));

        GateInput {
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            body,
            client: addr.ip().to_string(),
            session,
            csrf_token: headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()),
        }
    }

    /// Runs the full pipeline. On success the handler receives the sanitized,
    /// validated payload; on failure nothing downstream runs.
    pub fn admit(&self, policy: &EndpointPolicy, input: &GateInput<'_>) -> Result<Value, AppError> {
        let is_json = input
            .content_type
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));
        if !is_json {
            return Err(AppError::InvalidContentType);
        }

        let payload: Value = serde_json::from_slice(input.body).map_err(|_| AppError::Parse)?;

        let payload = sanitize_value(&payload);

        for scope in [&RateScope::DAILY, &policy.scope] {
            self.limiter
                .check(&input.client, scope)
                .map_err(|e| AppError::RateLimited {
                    retry_after: e.retry_after.as_secs().max(1),
                })?;
        }

        if !policy.csrf_exempt {
            let verified = match (&input.session, input.csrf_token) {
                (Some(session), Some(token)) => self.csrf.verify(session, token),
                _ => false,
            };
            if !verified {
                tracing::warn!(client = %input.client, "CSRF verification failed");
                return Err(AppError::Forbidden);
            }
        }

        check_fields(policy.fields, &payload)?;

        Ok(payload)
    }
}
