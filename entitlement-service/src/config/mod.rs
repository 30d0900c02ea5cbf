use crate::models::Tier;
use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub billing: BillingConfig,
    pub rate_limit: RateLimitConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

/// Billing provider (Stripe) configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct BillingConfig {
    pub api_base_url: String,
    pub api_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub price_id_starter: Option<String>,
    pub price_id_team: Option<String>,
    pub price_id_business: Option<String>,
    pub price_id_enterprise: Option<String>,
}

impl BillingConfig {
    /// Provider price identifier for a tier.
    ///
    /// A missing price id for a requested tier is a configuration error at
    /// checkout-initiation time, not a recoverable condition.
    pub fn price_id(&self, tier: Tier) -> Result<&str> {
        let price_id = match tier {
            Tier::Starter => &self.price_id_starter,
            Tier::Team => &self.price_id_team,
            Tier::Business => &self.price_id_business,
            Tier::Enterprise => &self.price_id_enterprise,
        };
        price_id
            .as_deref()
            .ok_or_else(|| anyhow!("Billing price id not configured for tier {}", tier.as_str()))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ENTITLEMENT_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ENTITLEMENT_SERVICE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url = env::var("ENTITLEMENT_DATABASE_URL")
            .map_err(|_| anyhow!("ENTITLEMENT_DATABASE_URL must be set"))?;
        let db_name =
            env::var("ENTITLEMENT_DATABASE_NAME").unwrap_or_else(|_| "fleettrack_db".to_string());

        let jwt_secret = env::var("ENTITLEMENT_JWT_SECRET")
            .map_err(|_| anyhow!("ENTITLEMENT_JWT_SECRET must be set"))?;

        let billing_api_base_url = env::var("BILLING_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.stripe.com/v1".to_string());
        let billing_api_key = env::var("BILLING_API_KEY").unwrap_or_default();
        let billing_webhook_secret = env::var("BILLING_WEBHOOK_SECRET").unwrap_or_default();

        let window_ms = env::var("ENTITLEMENT_RATE_LIMIT_WINDOW_MS")
            .unwrap_or_else(|_| "60000".to_string())
            .parse()?;
        let max_requests = env::var("ENTITLEMENT_RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret),
            },
            billing: BillingConfig {
                api_base_url: billing_api_base_url,
                api_key: Secret::new(billing_api_key),
                webhook_secret: Secret::new(billing_webhook_secret),
                price_id_starter: env::var("BILLING_PRICE_ID_STARTER").ok(),
                price_id_team: env::var("BILLING_PRICE_ID_TEAM").ok(),
                price_id_business: env::var("BILLING_PRICE_ID_BUSINESS").ok(),
                price_id_enterprise: env::var("BILLING_PRICE_ID_ENTERPRISE").ok(),
            },
            rate_limit: RateLimitConfig {
                window_ms,
                max_requests,
            },
            service_name: "entitlement-service".to_string(),
        })
    }
}
