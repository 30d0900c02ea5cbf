//! Subscription status endpoints.
//!
//! The status override path lets a privileged in-app actor (manager/admin)
//! set subscription state directly, bypassing the billing provider. Used for
//! app-originated subscriptions that have no provider customer record.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::middleware::AuthenticatedUser;
use crate::models::{
    CompanyPatch, Limit, ResourceKind, SubscriptionSource, SubscriptionStatus, Tier,
};
use crate::AppState;

/// Request to override the subscription status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status; anything outside the in-app set (including an empty
    /// string) is a bad request.
    pub subscription_status: String,
    /// Optional tier; silently ignored when it is not a known tier, since
    /// the status is the primary intent of the call.
    pub subscription_tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub subscription_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let membership = state
        .directory
        .membership(&actor.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("User does not belong to a company"))
        })?;

    if !membership.role.is_privileged() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Manager or admin role required"
        )));
    }

    let company = state
        .store
        .company(&membership.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let status = SubscriptionStatus::parse_override(&payload.subscription_status).ok_or_else(
        || {
            AppError::BadRequest(anyhow::anyhow!(
                "Invalid subscription status: {}",
                payload.subscription_status
            ))
        },
    )?;

    let tier = payload.subscription_tier.as_deref().and_then(|raw| {
        let parsed = Tier::parse(raw);
        if parsed.is_none() {
            tracing::warn!(
                company_id = %company.id,
                tier = %raw,
                "Ignoring unknown tier in status override"
            );
        }
        parsed
    });

    let patch = CompanyPatch {
        subscription_status: Some(status.clone()),
        subscription_tier: tier,
        subscription_type: Some(SubscriptionSource::App),
        ..Default::default()
    };

    state.store.merge_company(&company.id, patch).await?;

    tracing::info!(
        company_id = %company.id,
        user_id = %actor.user_id,
        status = %status.as_str(),
        tier = ?tier,
        "Subscription status overridden in-app"
    );

    Ok(Json(UpdateStatusResponse {
        success: true,
        subscription_status: status.as_str().to_string(),
        subscription_tier: tier.map(|t| t.as_str().to_string()),
    }))
}

/// Per-resource usage against the effective tier limits.
#[derive(Debug, Serialize)]
pub struct ResourceUsage {
    pub kind: ResourceKind,
    pub current: u64,
    pub limit: Limit,
    pub can_add: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub company_id: String,
    pub subscription_status: Option<String>,
    pub subscription_tier: Tier,
    pub subscription_type: Option<SubscriptionSource>,
    pub subscription_expiry_date: Option<chrono::DateTime<chrono::Utc>>,
    pub usage: Vec<ResourceUsage>,
}

/// Current subscription state plus usage for the caller's company.
pub async fn get_subscription(
    State(state): State<AppState>,
    actor: AuthenticatedUser,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let membership = state
        .directory
        .membership(&actor.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("User does not belong to a company"))
        })?;

    let company = state
        .store
        .company(&membership.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let mut usage = Vec::with_capacity(3);
    for kind in [ResourceKind::Users, ResourceKind::Vehicles, ResourceKind::Assets] {
        let decision = state.limits.check_can_add(&company.id, kind).await?;
        usage.push(ResourceUsage {
            kind,
            current: decision.current,
            limit: decision.limit,
            can_add: decision.allowed,
        });
    }

    Ok(Json(SubscriptionResponse {
        company_id: company.id.clone(),
        subscription_status: company
            .subscription_status
            .as_ref()
            .map(|s| s.as_str().to_string()),
        subscription_tier: company.effective_tier(),
        subscription_type: company.subscription_type,
        subscription_expiry_date: company.subscription_expiry(),
        usage,
    }))
}
