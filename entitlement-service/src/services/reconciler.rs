//! Billing event reconciler.
//!
//! Converges locally stored subscription state with the provider's event
//! stream. Delivery is at-least-once and unordered, so every branch computes
//! an absolute target state from the subscription object's current field
//! values and merge-writes it; applying the same event twice converges to
//! the same record.
//!
//! Branches that cannot resolve a tenant from `metadata.company_id` are
//! deliberate no-ops: the tenant is never guessed from other fields, and the
//! event is still acknowledged. Genuine failures (provider fetch, store
//! write, malformed payload) propagate so the transport can redeliver.

use crate::models::{CompanyPatch, SubscriptionSource, SubscriptionStatus, Tier};
use crate::services::billing::{BillingProvider, InvoiceObject, ProviderSubscription, WebhookEvent};
use crate::services::store::EntitlementStore;
use anyhow::{anyhow, Context, Result};
use mongodb::bson::DateTime;
use std::sync::Arc;

pub struct Reconciler {
    store: Arc<dyn EntitlementStore>,
    billing: Arc<dyn BillingProvider>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn EntitlementStore>, billing: Arc<dyn BillingProvider>) -> Self {
        Self { store, billing }
    }

    /// Apply one verified webhook event. Unrecognized event types are
    /// acknowledged without side effects.
    pub async fn apply(&self, event: &WebhookEvent) -> Result<()> {
        match event.event_type.as_str() {
            "invoice.paid" => self.on_invoice_paid(&event.data.object).await,
            "customer.subscription.updated" => {
                self.on_subscription_updated(&event.data.object).await
            }
            "customer.subscription.deleted" => {
                self.on_subscription_deleted(&event.data.object).await
            }
            other => {
                tracing::debug!(event_type = %other, "Ignoring unhandled billing event type");
                Ok(())
            }
        }
    }

    /// An invoice was paid. The invoice payload only references the
    /// subscription, so the full object is fetched fresh from the provider
    /// before computing the target state.
    async fn on_invoice_paid(&self, object: &serde_json::Value) -> Result<()> {
        let invoice: InvoiceObject = serde_json::from_value(object.clone())
            .context("Malformed invoice payload in invoice.paid event")?;

        let Some(subscription_id) = invoice.subscription else {
            tracing::info!("invoice.paid without a subscription reference, skipping");
            return Ok(());
        };

        let subscription = self
            .billing
            .fetch_subscription(&subscription_id)
            .await
            .map_err(|e| anyhow!("Failed to fetch subscription {}: {}", subscription_id, e))?;

        let Some(company_id) = subscription.metadata.company_id.clone() else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Subscription has no company_id metadata, skipping"
            );
            return Ok(());
        };

        let patch = CompanyPatch {
            subscription_status: Some(SubscriptionStatus::Active),
            subscription_type: Some(SubscriptionSource::Stripe),
            subscription_tier: parse_tier(&subscription),
            subscription_expiry_date: period_end(&subscription),
            stripe_subscription_id: Some(subscription.id.clone()),
            stripe_customer_id: subscription.customer.clone(),
        };

        self.store.merge_company(&company_id, patch).await?;

        tracing::info!(
            company_id = %company_id,
            subscription_id = %subscription.id,
            "Subscription activated from paid invoice"
        );
        Ok(())
    }

    /// The subscription changed. An active provider status maps to `active`;
    /// any other provider status (`past_due`, `unpaid`, ...) is passed
    /// through verbatim so the UI can surface it.
    async fn on_subscription_updated(&self, object: &serde_json::Value) -> Result<()> {
        let subscription: ProviderSubscription = serde_json::from_value(object.clone())
            .context("Malformed subscription payload in update event")?;

        let Some(company_id) = subscription.metadata.company_id.clone() else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Subscription update has no company_id metadata, skipping"
            );
            return Ok(());
        };

        let status = if subscription.status == "active" {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Provider(subscription.status.clone())
        };

        let patch = CompanyPatch {
            subscription_status: Some(status),
            subscription_type: Some(SubscriptionSource::Stripe),
            subscription_tier: parse_tier(&subscription),
            subscription_expiry_date: period_end(&subscription),
            stripe_subscription_id: Some(subscription.id.clone()),
            stripe_customer_id: subscription.customer.clone(),
        };

        self.store.merge_company(&company_id, patch).await?;

        tracing::info!(
            company_id = %company_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Subscription state updated"
        );
        Ok(())
    }

    /// The subscription was cancelled at the provider.
    async fn on_subscription_deleted(&self, object: &serde_json::Value) -> Result<()> {
        let subscription: ProviderSubscription = serde_json::from_value(object.clone())
            .context("Malformed subscription payload in delete event")?;

        let Some(company_id) = subscription.metadata.company_id.clone() else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Subscription delete has no company_id metadata, skipping"
            );
            return Ok(());
        };

        let patch = CompanyPatch {
            subscription_status: Some(SubscriptionStatus::Inactive),
            subscription_type: Some(SubscriptionSource::Stripe),
            ..Default::default()
        };

        self.store.merge_company(&company_id, patch).await?;

        tracing::info!(company_id = %company_id, "Subscription deactivated");
        Ok(())
    }
}

/// Tier from subscription metadata; unknown tier names are never persisted.
fn parse_tier(subscription: &ProviderSubscription) -> Option<Tier> {
    let raw = subscription.metadata.tier.as_deref()?;
    match Tier::parse(raw) {
        Some(tier) => Some(tier),
        None => {
            tracing::warn!(
                subscription_id = %subscription.id,
                tier = %raw,
                "Unknown tier in subscription metadata, ignoring"
            );
            None
        }
    }
}

fn period_end(subscription: &ProviderSubscription) -> Option<DateTime> {
    subscription
        .current_period_end
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(DateTime::from_chrono)
}
