//! Entitlement store adapter.
//!
//! The tenant record and the per-tenant resource collections are consumed
//! through these traits so the backing store can be swapped: MongoDB in
//! production, an in-memory map for tests and local development.

pub mod memory;
pub mod mongo;

pub use memory::MemoryEntitlementStore;
pub use mongo::MongoEntitlementStore;

use crate::models::{Company, CompanyPatch, Membership, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;

/// Read/merge access to the tenant record and resource counts.
///
/// `merge_company` is the only write: a partial `$set`-style update that
/// leaves unspecified fields untouched and stamps `updated_at`. The billing
/// event reconciler and the status override path are its only two callers.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn company(&self, id: &str) -> Result<Option<Company>>;

    /// Merge-write the patch into the company record. Writing to an unknown
    /// company id matches nothing and is not an error.
    async fn merge_company(&self, id: &str, patch: CompanyPatch) -> Result<()>;

    /// Fresh count of resources of `kind` owned by the company. Read
    /// immediately before every limit decision; never cached by callers.
    async fn resource_count(&self, company_id: &str, kind: ResourceKind) -> Result<u64>;
}

/// Read-only lookup from an authenticated user to company and role.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn membership(&self, user_id: &str) -> Result<Option<Membership>>;
}
