//! Subscription tier catalog.
//!
//! The catalog is static: four tiers, three limit dimensions. Every company's
//! effective limits are `limits_for(company.subscription_tier or STARTER)`.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Starter,
    Team,
    Business,
    Enterprise,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Starter => "STARTER",
            Tier::Team => "TEAM",
            Tier::Business => "BUSINESS",
            Tier::Enterprise => "ENTERPRISE",
        }
    }

    /// Strict parse: unknown tier names are rejected at the write boundary,
    /// never persisted as-is.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STARTER" => Some(Tier::Starter),
            "TEAM" => Some(Tier::Team),
            "BUSINESS" => Some(Tier::Business),
            "ENTERPRISE" => Some(Tier::Enterprise),
            _ => None,
        }
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Starter => TierLimits {
                max_users: 3,
                max_vehicles: 5,
                max_assets: Limit::Finite(100),
            },
            Tier::Team => TierLimits {
                max_users: 10,
                max_vehicles: 15,
                max_assets: Limit::Finite(500),
            },
            Tier::Business => TierLimits {
                max_users: 25,
                max_vehicles: 50,
                max_assets: Limit::Unlimited,
            },
            Tier::Enterprise => TierLimits {
                max_users: 100,
                max_vehicles: 250,
                max_assets: Limit::Unlimited,
            },
        }
    }

    pub fn limit_for(&self, kind: ResourceKind) -> Limit {
        let limits = self.limits();
        match kind {
            ResourceKind::Users => Limit::Finite(limits.max_users),
            ResourceKind::Vehicles => Limit::Finite(limits.max_vehicles),
            ResourceKind::Assets => limits.max_assets,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource limits for a tier. Users and vehicles are always finite; assets
/// may be unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub max_users: u64,
    pub max_vehicles: u64,
    pub max_assets: Limit,
}

/// A countable resource kind, backed by one collection per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    Vehicles,
    Assets,
}

impl ResourceKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Vehicles => "vehicles",
            ResourceKind::Assets => "assets",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Users => "user",
            ResourceKind::Vehicles => "vehicle",
            ResourceKind::Assets => "asset",
        }
    }
}

/// A resource cap. Serialized as the number, or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Finite(u64),
    Unlimited,
}

impl Limit {
    /// Admission decision: can one more resource be added at `current` usage?
    pub fn allows(&self, current: u64) -> bool {
        match self {
            Limit::Finite(max) => current < *max,
            Limit::Unlimited => true,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(max) => write!(f, "{}", max),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Finite(max) => serializer.serialize_u64(*max),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}
