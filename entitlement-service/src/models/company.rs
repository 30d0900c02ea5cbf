//! Tenant (company) document model.
//!
//! The `companies` collection is the single source of locally stored
//! subscription state. All writers go through [`CompanyPatch`] merge-writes;
//! nothing ever replaces the full document.

use crate::models::tier::Tier;
use mongodb::bson::{doc, DateTime, Document};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Subscription status for a company.
///
/// `trial`, `active` and `inactive` are the in-app statuses; anything else
/// the billing provider reports (e.g. `past_due`) is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Inactive,
    Provider(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Provider(s) => s,
        }
    }

    /// Statuses an in-app actor may set directly.
    pub fn parse_override(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(SubscriptionStatus::Trial),
            "active" => Some(SubscriptionStatus::Active),
            "inactive" => Some(SubscriptionStatus::Inactive),
            _ => None,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "trial" => SubscriptionStatus::Trial,
            "active" => SubscriptionStatus::Active,
            "inactive" => SubscriptionStatus::Inactive,
            _ => SubscriptionStatus::Provider(s),
        }
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(SubscriptionStatus::from(String::deserialize(deserializer)?))
    }
}

/// Which source last wrote the subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionSource {
    Stripe,
    App,
}

/// Tenant record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_tier: Option<Tier>,
    pub subscription_type: Option<SubscriptionSource>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_expiry_date: Option<DateTime>,
    pub updated_at: DateTime,
}

impl Company {
    /// Effective tier for limit purposes: absent tier means STARTER.
    pub fn effective_tier(&self) -> Tier {
        self.subscription_tier.unwrap_or(Tier::Starter)
    }

    /// Expiry decoded into one unambiguous date type at the adapter boundary.
    pub fn subscription_expiry(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.subscription_expiry_date.map(|d| d.to_chrono())
    }
}

/// Partial update to a company record.
///
/// Only the fields that are `Some` are written; `updated_at` is stamped on
/// every write. Both the reconciler and the status override path write
/// absolute target values through this type, never deltas.
#[derive(Debug, Default, Clone)]
pub struct CompanyPatch {
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_tier: Option<Tier>,
    pub subscription_type: Option<SubscriptionSource>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_expiry_date: Option<DateTime>,
}

impl CompanyPatch {
    /// Render the patch as a `$set` document for a merge-write.
    pub fn to_set_document(&self) -> Document {
        let mut set = doc! { "updated_at": DateTime::now() };
        if let Some(ref status) = self.subscription_status {
            set.insert("subscription_status", status.as_str());
        }
        if let Some(tier) = self.subscription_tier {
            set.insert("subscription_tier", tier.as_str());
        }
        if let Some(source) = self.subscription_type {
            set.insert(
                "subscription_type",
                match source {
                    SubscriptionSource::Stripe => "stripe",
                    SubscriptionSource::App => "app",
                },
            );
        }
        if let Some(ref customer_id) = self.stripe_customer_id {
            set.insert("stripe_customer_id", customer_id);
        }
        if let Some(ref subscription_id) = self.stripe_subscription_id {
            set.insert("stripe_subscription_id", subscription_id);
        }
        if let Some(expiry) = self.subscription_expiry_date {
            set.insert("subscription_expiry_date", expiry);
        }
        doc! { "$set": set }
    }

    /// Apply the same merge semantics to an in-memory record.
    pub fn apply_to(&self, company: &mut Company) {
        if let Some(ref status) = self.subscription_status {
            company.subscription_status = Some(status.clone());
        }
        if let Some(tier) = self.subscription_tier {
            company.subscription_tier = Some(tier);
        }
        if let Some(source) = self.subscription_type {
            company.subscription_type = Some(source);
        }
        if let Some(ref customer_id) = self.stripe_customer_id {
            company.stripe_customer_id = Some(customer_id.clone());
        }
        if let Some(ref subscription_id) = self.stripe_subscription_id {
            company.stripe_subscription_id = Some(subscription_id.clone());
        }
        if let Some(expiry) = self.subscription_expiry_date {
            company.subscription_expiry_date = Some(expiry);
        }
        company.updated_at = DateTime::now();
    }
}

/// Member role within a company. Only managers and admins may perform
/// privileged subscription actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Manager,
    #[serde(other)]
    Member,
}

impl MemberRole {
    pub fn is_privileged(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Manager)
    }
}

/// User document, as read by the tenant directory.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_id: Option<String>,
    pub role: Option<MemberRole>,
}

/// Resolved company membership for an authenticated actor.
#[derive(Debug, Clone)]
pub struct Membership {
    pub company_id: String,
    pub role: MemberRole,
}
