use std::sync::Arc;

use crate::config::Config;
use crate::documents::renderer::DocumentRenderer;
use crate::payments::gateway::PaymentGateway;
use crate::security::gate::Gate;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The request gate owns the two shared mutable resources of the
    /// pipeline: rate-limit counters and CSRF tokens. Cleared on restart.
    pub gate: Arc<Gate>,
    /// Pluggable gateway client. Default: PaystackClient. Tests inject a mock.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Pluggable renderer. Default: BasicRenderer.
    pub renderer: Arc<dyn DocumentRenderer>,
}
