pub mod company;
pub mod tier;

pub use company::{
    Company, CompanyPatch, Member, MemberRole, Membership, SubscriptionSource, SubscriptionStatus,
};
pub use tier::{Limit, ResourceKind, Tier, TierLimits};
