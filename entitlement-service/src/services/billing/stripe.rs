//! Stripe billing provider client.
//!
//! Only the subscription fetch used by the reconciler is implemented here;
//! checkout and portal flows are not part of this service.

use crate::config::BillingConfig;
use crate::services::billing::{BillingError, BillingProvider, ProviderSubscription};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: BillingConfig,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(config: BillingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if the provider is configured (API key is set).
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.expose_secret().is_empty()
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn fetch_subscription(&self, id: &str) -> Result<ProviderSubscription, BillingError> {
        if !self.is_configured() {
            return Err(BillingError::NotConfigured(
                "billing API key is not set".to_string(),
            ));
        }

        let url = format!("{}/subscriptions/{}", self.config.api_base_url, id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| BillingError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::NetworkError(e.to_string()))?;

        tracing::debug!(status = %status, subscription_id = %id, "Provider subscription fetch");

        if status.is_success() {
            let subscription: ProviderSubscription = serde_json::from_str(&body)
                .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
            Ok(subscription)
        } else {
            let detail = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.error.error_type.unwrap_or_else(|| "unknown".to_string()),
                        e.error.message.unwrap_or_default()
                    )
                })
                .unwrap_or(body);
            tracing::error!(
                subscription_id = %id,
                status = %status,
                detail = %detail,
                "Provider subscription fetch failed"
            );
            Err(BillingError::ApiError(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config(api_key: &str) -> BillingConfig {
        BillingConfig {
            api_base_url: "https://api.stripe.com/v1".to_string(),
            api_key: Secret::new(api_key.to_string()),
            webhook_secret: Secret::new("whsec_test".to_string()),
            price_id_starter: None,
            price_id_team: None,
            price_id_business: None,
            price_id_enterprise: None,
        }
    }

    #[test]
    fn test_is_configured() {
        assert!(StripeClient::new(test_config("sk_test_123")).is_configured());
        assert!(!StripeClient::new(test_config("")).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_fetch_fails_without_network() {
        let client = StripeClient::new(test_config(""));
        let err = client.fetch_subscription("sub_123").await.unwrap_err();
        assert!(matches!(err, BillingError::NotConfigured(_)));
    }
}
