//! Mock billing provider for tests and local development.

use crate::services::billing::{BillingError, BillingProvider, ProviderSubscription};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct MockBillingProvider {
    subscriptions: DashMap<String, ProviderSubscription>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subscription(&self, subscription: ProviderSubscription) {
        self.subscriptions
            .insert(subscription.id.clone(), subscription);
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn fetch_subscription(&self, id: &str) -> Result<ProviderSubscription, BillingError> {
        self.subscriptions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| BillingError::ApiError(format!("No such subscription: {}", id)))
    }
}
