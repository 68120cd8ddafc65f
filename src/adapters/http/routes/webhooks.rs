//! Stripe webhook endpoint.
//!
//! Signature verification runs against the raw body before anything else;
//! a request that fails it is rejected without touching the database. All
//! local writes downstream are idempotent upserts keyed by customer id, so
//! provider redelivery is harmless.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use tracing::error;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::webhook_event::{WebhookEnvelope, WebhookEvent},
    infra::stripe_client::StripeClient,
};

/// Determines if a webhook processing error should trigger a Stripe retry.
///
/// Returns `true` if the error is transient, meaning we should answer 5xx
/// so Stripe redelivers. Returns `false` for expected conditions that a
/// retry cannot change.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        // Transient - retry may succeed
        AppError::Database(_) => true,
        AppError::Provider(_) => true,
        AppError::Internal(_) => true,

        // Expected conditions - won't change with retry
        AppError::NotFound => false,
        AppError::InvalidInput(_) => false,
        AppError::Conflict => false,
        AppError::AuthenticationRequired => false,
    }
}

/// Logs a failed event with full context and returns 500 so Stripe retries.
fn webhook_retryable_error(error: &AppError, event_type: &str, event_id: &str) -> StatusCode {
    error!(
        error = %error,
        event_type,
        event_id,
        retryable = true,
        "Webhook processing failed, returning 500 for Stripe retry"
    );
    StatusCode::INTERNAL_SERVER_ERROR
}

/// POST /api/webhooks/stripe
/// Reconciles local subscription state from Stripe events
async fn handle_stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing Stripe signature".into()))?;

    // Verify against the raw body before parsing or processing anything
    StripeClient::verify_webhook_signature(
        &body,
        signature,
        &app_state.config.stripe_webhook_secret,
    )?;

    let envelope = WebhookEnvelope::parse(&body)?;
    let event_id = envelope.event_id.as_str();

    let (result, event_type): (AppResult<()>, &str) = match &envelope.event {
        WebhookEvent::SubscriptionCreated(sub) => (
            app_state.billing_use_cases.apply_subscription_change(sub).await,
            "customer.subscription.created",
        ),
        WebhookEvent::SubscriptionUpdated(sub) => (
            app_state.billing_use_cases.apply_subscription_change(sub).await,
            "customer.subscription.updated",
        ),
        WebhookEvent::SubscriptionDeleted(sub) => (
            app_state.billing_use_cases.apply_subscription_deletion(sub).await,
            "customer.subscription.deleted",
        ),
        WebhookEvent::InvoicePaymentSucceeded(invoice) => {
            // Subscription state already flows through subscription.updated
            tracing::info!(
                event_id,
                invoice_id = %invoice.id,
                customer_id = invoice.customer.as_deref().unwrap_or("unknown"),
                "Invoice payment succeeded"
            );
            (Ok(()), "invoice.payment_succeeded")
        }
        WebhookEvent::InvoicePaymentFailed(invoice) => {
            // Stripe retries the charge on its own schedule; dunning email
            // hooks would go here
            tracing::warn!(
                event_id,
                invoice_id = %invoice.id,
                customer_id = invoice.customer.as_deref().unwrap_or("unknown"),
                "Invoice payment failed"
            );
            (Ok(()), "invoice.payment_failed")
        }
        WebhookEvent::Unknown { event_type } => {
            tracing::debug!(event_id, event_type, "Unhandled webhook event type");
            (Ok(()), "unknown")
        }
    };

    if let Err(e) = result {
        if is_retryable_error(&e) {
            return Ok((
                webhook_retryable_error(&e, event_type, event_id),
                Json(serde_json::json!({"error": "Webhook processing failed"})),
            ));
        }
        tracing::debug!(
            error = %e,
            event_type,
            event_id,
            retryable = false,
            "Non-retryable webhook processing error, acknowledging"
        );
    }

    Ok((StatusCode::OK, Json(serde_json::json!({"received": true}))))
}

// ============================================================================
// Router
// ============================================================================

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

// ============================================================================
// Tests
// ============================================================================
