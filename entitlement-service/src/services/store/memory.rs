//! In-memory entitlement store.
//!
//! Mirrors the MongoDB adapter's merge semantics over `DashMap`s. Used by the
//! test suite and for local development without a database.

use crate::models::{Company, CompanyPatch, Member, MemberRole, Membership, ResourceKind};
use crate::services::store::{EntitlementStore, TenantDirectory};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::DateTime;

#[derive(Default)]
pub struct MemoryEntitlementStore {
    companies: DashMap<String, Company>,
    members: DashMap<String, Member>,
    counts: DashMap<(String, &'static str), u64>,
}

impl MemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_company(&self, company: Company) {
        self.companies.insert(company.id.clone(), company);
    }

    /// Seed a bare company record with only an id.
    pub fn insert_blank_company(&self, id: &str) {
        self.insert_company(Company {
            id: id.to_string(),
            name: None,
            subscription_status: None,
            subscription_tier: None,
            subscription_type: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_expiry_date: None,
            updated_at: DateTime::now(),
        });
    }

    pub fn insert_member(&self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }

    pub fn set_count(&self, company_id: &str, kind: ResourceKind, count: u64) {
        self.counts
            .insert((company_id.to_string(), kind.collection()), count);
    }
}

#[async_trait]
impl EntitlementStore for MemoryEntitlementStore {
    async fn company(&self, id: &str) -> Result<Option<Company>> {
        Ok(self.companies.get(id).map(|c| c.clone()))
    }

    async fn merge_company(&self, id: &str, patch: CompanyPatch) -> Result<()> {
        // Matches the mongo adapter: merging into an unknown id is a no-op.
        if let Some(mut company) = self.companies.get_mut(id) {
            patch.apply_to(&mut company);
        }
        Ok(())
    }

    async fn resource_count(&self, company_id: &str, kind: ResourceKind) -> Result<u64> {
        Ok(self
            .counts
            .get(&(company_id.to_string(), kind.collection()))
            .map(|c| *c)
            .unwrap_or(0))
    }
}

#[async_trait]
impl TenantDirectory for MemoryEntitlementStore {
    async fn membership(&self, user_id: &str) -> Result<Option<Membership>> {
        Ok(self.members.get(user_id).and_then(|m| {
            m.company_id.clone().map(|company_id| Membership {
                company_id,
                role: m.role.unwrap_or(MemberRole::Member),
            })
        }))
    }
}
