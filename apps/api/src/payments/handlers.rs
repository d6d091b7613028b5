//! Axum route handlers for the payment endpoints.
//!
//! Both routes are CSRF-exempt by contract: they are invoked cross-origin by
//! the payment widget, and are instead guarded by strict field validation
//! plus the `payment` rate scope. Do not generalize this exemption.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::payments::gateway::GatewayError;
use crate::security::gate::EndpointPolicy;
use crate::security::rate_limit::RateScope;
use crate::security::validate::{FieldFormat, FieldRule};
use crate::state::AppState;

const PROCESS_PAYMENT: EndpointPolicy = EndpointPolicy {
    scope: RateScope::PAYMENT,
    csrf_exempt: true,
    fields: &[
        FieldRule {
            name: "reference",
            format: FieldFormat::Reference,
            max_len: 100,
        },
        FieldRule {
            name: "email",
            format: FieldFormat::Email,
            max_len: 254,
        },
        FieldRule {
            name: "phone",
            format: FieldFormat::Phone,
            max_len: 20,
        },
        FieldRule {
            name: "gateway",
            format: FieldFormat::Reference,
            max_len: 32,
        },
    ],
};

const INITIATE_PAYMENT: EndpointPolicy = EndpointPolicy {
    scope: RateScope::PAYMENT,
    csrf_exempt: true,
    fields: &[
        FieldRule {
            name: "email",
            format: FieldFormat::Email,
            max_len: 254,
        },
        FieldRule {
            name: "amount",
            format: FieldFormat::Amount,
            max_len: 0,
        },
        FieldRule {
            name: "currency",
            format: FieldFormat::Currency,
            max_len: 3,
        },
    ],
};

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub reference: String,
    pub email: String,
    pub phone: String,
    pub gateway: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessPaymentResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub email: String,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub checkout_url: String,
}

/// POST /api/process-payment
///
/// Verifies a completed transaction against the gateway. Any non-success
/// gateway status (or a gateway error response) is a verification failure.
pub async fn handle_process_payment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProcessPaymentResponse>, AppError> {
    let input = state.gate.input(&addr, &headers, &body);
    let payload = state.gate.admit(&PROCESS_PAYMENT, &input)?;
    let request: ProcessPaymentRequest =
        serde_json::from_value(payload).map_err(|_| AppError::Parse)?;

    let outcome = state
        .gateway
        .verify(request.reference.trim())
        .await
        .map_err(|e| match e {
            GatewayError::Http(e) => AppError::Upstream(e.to_string()),
            GatewayError::Api { status, .. } if status >= 500 => {
                AppError::Upstream(format!("gateway returned {status}"))
            }
            // A definitive gateway answer about this reference: not verified.
            GatewayError::Api { status, .. } => {
                warn!(gateway = %request.gateway, status, "Verification lookup failed");
                AppError::PaymentDeclined
            }
        })?;

    if !outcome.success {
        warn!(
            gateway = %request.gateway,
            status = %outcome.status,
            "Payment not verified"
        );
        return Err(AppError::PaymentDeclined);
    }

    info!(gateway = %request.gateway, "Payment verified");
    Ok(Json(ProcessPaymentResponse {
        success: true,
        message: "Payment verified".to_string(),
    }))
}

/// POST /api/initiate-payment
///
/// Creates a checkout session and returns the URL the front end redirects to.
pub async fn handle_initiate_payment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InitiatePaymentResponse>, AppError> {
    let input = state.gate.input(&addr, &headers, &body);
    let payload = state.gate.admit(&INITIATE_PAYMENT, &input)?;
    let request: InitiatePaymentRequest =
        serde_json::from_value(payload).map_err(|_| AppError::Parse)?;

    let checkout = state
        .gateway
        .initialize(
            request.email.trim(),
            request.amount,
            &request.currency.trim().to_uppercase(),
        )
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    info!(reference = %checkout.reference, "Checkout initialized");
    Ok(Json(InitiatePaymentResponse {
        success: true,
        checkout_url: checkout.checkout_url,
    }))
}
