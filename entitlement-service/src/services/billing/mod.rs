//! Billing provider abstractions.
//!
//! A trait-based seam over the provider API so the reconciler can be driven
//! by the real Stripe client in production and a mock in tests.

pub mod mock;
pub mod stripe;

pub use mock::MockBillingProvider;
pub use stripe::StripeClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for billing provider operations.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Billing provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// The metadata the provider carries on every subscription. `company_id` is
/// the only trusted link between a provider subscription and a tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionMetadata {
    pub company_id: Option<String>,
    pub tier: Option<String>,
}

/// Subscription object as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub metadata: SubscriptionMetadata,
    pub customer: Option<String>,
    /// End of the current billing period, seconds since the epoch.
    pub current_period_end: Option<i64>,
}

/// Webhook event envelope. The payload object is kept raw; each reconciler
/// branch decodes only the shape it needs.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

/// Invoice payload fields the reconciler needs.
#[derive(Debug, Deserialize)]
pub struct InvoiceObject {
    /// Reference to the subscription the invoice was issued for.
    pub subscription: Option<String>,
}

/// Outbound provider API surface consumed by the reconciler.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Fetch the full subscription object; event payloads may be partial.
    async fn fetch_subscription(&self, id: &str) -> Result<ProviderSubscription, BillingError>;
}
