/// Payment gateway client: the single point of entry for all Paystack calls.
///
/// ARCHITECTURAL RULE: no other module may call the gateway directly. The
/// [`PaymentGateway`] trait is the seam; handlers hold an `Arc<dyn
/// PaymentGateway>` so tests can inject a mock.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const PAYSTACK_API_URL: &str = "https://api.paystack.co";

/// Bounded timeout so a slow gateway cannot hold a server resource
/// indefinitely. No retry: a failed verification is surfaced to the caller,
/// who may resubmit.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// Result of verifying a transaction reference.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// True only when the gateway reports the transaction as "success".
    pub success: bool,
    pub status: String,
}

/// A newly initialized checkout session.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub checkout_url: String,
    pub reference: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Verifies a transaction reference. A gateway-side error response is an
    /// `Api` error; the caller decides how to surface it.
    async fn verify(&self, reference: &str) -> Result<VerificationOutcome, GatewayError>;

    /// Initializes a checkout for `amount` in major units of `currency`.
    async fn initialize(
        &self,
        email: &str,
        amount: f64,
        currency: &str,
    ) -> Result<Checkout, GatewayError>;
}

// Paystack wire types.

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    data: VerifyData,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    gateway_response: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    email: &'a str,
    /// Amount in subunits (e.g. kobo, cents).
    amount: u64,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    data: InitializeData,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

/// Paystack client over reqwest with a bounded timeout.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaystackClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, PAYSTACK_API_URL.to_string())
    }

    /// Test seam: point the client at a local stub server.
    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            secret_key,
            base_url,
        }
    }

    async fn error_from(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        GatewayError::Api { status, message }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn verify(&self, reference: &str) -> Result<VerificationOutcome, GatewayError> {
        // The reference has already passed identifier validation, so it is
        // safe to interpolate into the path.
        let url = format!("{}/transaction/verify/{}", self.base_url, reference.trim());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: VerifyResponse = response.json().await?;
        debug!(
            status = %body.data.status,
            gateway_response = ?body.data.gateway_response,
            "Verification response received"
        );

        Ok(VerificationOutcome {
            success: body.data.status == "success",
            status: body.data.status,
        })
    }

    async fn initialize(
        &self,
        email: &str,
        amount: f64,
        currency: &str,
    ) -> Result<Checkout, GatewayError> {
        let request = InitializeRequest {
            email,
            amount: (amount * 100.0).round() as u64,
            currency,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: InitializeResponse = response.json().await?;
        Ok(Checkout {
            checkout_url: body.data.authorization_url,
            reference: body.data.reference,
        })
    }
}
