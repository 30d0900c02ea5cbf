//! Tier limit enforcement.
//!
//! The check is advisory-then-enforced: resource-creation paths call it
//! immediately before the creation write. Concurrent creators can race the
//! check, which is an accepted approximate enforcement (slight overshoot)
//! rather than a transactional reservation.

use crate::models::{Limit, ResourceKind, Tier};
use crate::services::store::EntitlementStore;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

/// Admit/deny answer for "can this company create one more resource".
#[derive(Debug, Clone, Serialize)]
pub struct LimitDecision {
    pub allowed: bool,
    pub current: u64,
    pub limit: Limit,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct LimitEnforcer {
    store: Arc<dyn EntitlementStore>,
}

impl LimitEnforcer {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Decide whether the company may create one more resource of `kind`.
    ///
    /// A missing company record or tier field falls back to STARTER limits,
    /// the most restrictive tier. The count is read fresh from the store on
    /// every call.
    pub async fn check_can_add(&self, company_id: &str, kind: ResourceKind) -> Result<LimitDecision> {
        let tier = self
            .store
            .company(company_id)
            .await?
            .map(|c| c.effective_tier())
            .unwrap_or(Tier::Starter);

        let current = self.store.resource_count(company_id, kind).await?;
        let limit = tier.limit_for(kind);
        let allowed = limit.allows(current);

        let message = if allowed {
            None
        } else {
            Some(format!(
                "You have reached the {} limit for the {} plan ({}/{}). Upgrade your plan to add more.",
                kind.label(),
                tier,
                current,
                limit
            ))
        };

        if !allowed {
            tracing::info!(
                company_id = %company_id,
                kind = ?kind,
                current,
                %limit,
                %tier,
                "Resource creation denied by tier limit"
            );
        }

        Ok(LimitDecision {
            allowed,
            current,
            limit,
            tier,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, CompanyPatch};
    use crate::services::store::MemoryEntitlementStore;
    use mongodb::bson::DateTime;

    fn store_with_company(id: &str, tier: Option<Tier>) -> Arc<MemoryEntitlementStore> {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.insert_company(Company {
            id: id.to_string(),
            name: Some("Acme Logistics".to_string()),
            subscription_status: None,
            subscription_tier: tier,
            subscription_type: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_expiry_date: None,
            updated_at: DateTime::now(),
        });
        store
    }

    #[tokio::test]
    async fn denies_at_limit_with_message() {
        let store = store_with_company("c1", Some(Tier::Team));
        store.set_count("c1", ResourceKind::Vehicles, 15);

        let enforcer = LimitEnforcer::new(store);
        let decision = enforcer
            .check_can_add("c1", ResourceKind::Vehicles)
            .await
            .unwrap();

        assert!(!decision.allowed);
        assert_eq!(decision.current, 15);
        assert_eq!(decision.limit, Limit::Finite(15));
        assert_eq!(decision.tier, Tier::Team);
        let message = decision.message.unwrap();
        assert!(message.contains("15/15"));
        assert!(message.contains("TEAM"));
    }

    #[tokio::test]
    async fn allows_one_below_limit() {
        let store = store_with_company("c1", Some(Tier::Team));
        store.set_count("c1", ResourceKind::Vehicles, 14);

        let enforcer = LimitEnforcer::new(store);
        let decision = enforcer
            .check_can_add("c1", ResourceKind::Vehicles)
            .await
            .unwrap();

        assert!(decision.allowed);
        assert_eq!(decision.current, 14);
        assert!(decision.message.is_none());
    }

    #[tokio::test]
    async fn unlimited_never_denies() {
        let store = store_with_company("c1", Some(Tier::Business));
        store.set_count("c1", ResourceKind::Assets, 1_000_000);

        let enforcer = LimitEnforcer::new(store);
        let decision = enforcer
            .check_can_add("c1", ResourceKind::Assets)
            .await
            .unwrap();

        assert!(decision.allowed);
        assert_eq!(decision.limit, Limit::Unlimited);
    }

    #[tokio::test]
    async fn missing_tier_defaults_to_starter() {
        let store = store_with_company("c1", None);
        store.set_count("c1", ResourceKind::Users, 3);

        let enforcer = LimitEnforcer::new(store);
        let decision = enforcer
            .check_can_add("c1", ResourceKind::Users)
            .await
            .unwrap();

        assert_eq!(decision.tier, Tier::Starter);
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn missing_company_defaults_to_starter() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let enforcer = LimitEnforcer::new(store);

        let decision = enforcer
            .check_can_add("ghost", ResourceKind::Vehicles)
            .await
            .unwrap();

        assert_eq!(decision.tier, Tier::Starter);
        assert_eq!(decision.current, 0);
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn tier_change_moves_the_cap() {
        let store = store_with_company("c1", Some(Tier::Starter));
        store.set_count("c1", ResourceKind::Vehicles, 5);
        let enforcer = LimitEnforcer::new(store.clone());

        let denied = enforcer
            .check_can_add("c1", ResourceKind::Vehicles)
            .await
            .unwrap();
        assert!(!denied.allowed);

        store
            .merge_company(
                "c1",
                CompanyPatch {
                    subscription_tier: Some(Tier::Team),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let allowed = enforcer
            .check_can_add("c1", ResourceKind::Vehicles)
            .await
            .unwrap();
        assert!(allowed.allowed);
        assert_eq!(allowed.limit, Limit::Finite(15));
    }
}
