//! Billing provider webhook handler.
//!
//! Verifies the HMAC signature over the raw request body before anything
//! else touches the payload; a verification failure rejects the event with
//! no side effects. Processing is all-or-nothing per event: a failure in the
//! reconciler surfaces as an error so the transport redelivers.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use secrecy::ExposeSecret;
use serde_json::json;
use service_core::error::AppError;
use service_core::utils::signature;

use crate::services::billing::WebhookEvent;
use crate::services::Reconciler;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    let secret = state.config.billing.webhook_secret.expose_secret();
    if secret.is_empty() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "Billing webhook secret is not configured"
        )));
    }

    let sig = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing billing webhook signature header");
            AppError::BadRequest(anyhow::anyhow!("Missing webhook signature"))
        })?;

    let is_valid = signature::verify_signature(secret, &body, sig).map_err(|e| {
        tracing::error!(error = %e, "Webhook signature verification error");
        AppError::InternalError(anyhow::anyhow!("Webhook verification failed"))
    })?;

    if !is_valid {
        tracing::warn!("Invalid billing webhook signature");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid webhook signature"
        )));
    }

    let event: WebhookEvent = serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse billing webhook event");
        AppError::BadRequest(anyhow::anyhow!("Invalid webhook payload"))
    })?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = event.id.as_deref().unwrap_or("-"),
        "Processing billing webhook"
    );

    let reconciler = Reconciler::new(state.store.clone(), state.billing.clone());
    reconciler.apply(&event).await.map_err(|e| {
        tracing::error!(
            event_type = %event.event_type,
            error = %e,
            "Failed to apply billing event"
        );
        AppError::InternalError(e)
    })?;

    // Minimal acknowledgement, recognized event type or not.
    Ok(Json(json!({ "received": true })))
}
