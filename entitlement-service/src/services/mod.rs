pub mod billing;
pub mod limits;
pub mod reconciler;
pub mod store;

pub use billing::{BillingProvider, MockBillingProvider, StripeClient};
pub use limits::{LimitDecision, LimitEnforcer};
pub use reconciler::Reconciler;
pub use store::{
    EntitlementStore, MemoryEntitlementStore, MongoEntitlementStore, TenantDirectory,
};
