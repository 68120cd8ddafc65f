//! Typed Stripe webhook events.
//!
//! Events arrive as a JSON envelope `{id, type, data: {object}}`. Each type
//! we act on gets an explicit variant with a typed payload, so an
//! unrecognized event is a visible `Unknown` case instead of a silent
//! runtime branch.

use serde::Deserialize;

use crate::app_error::{AppError, AppResult};

/// The `data.object` of a `customer.subscription.*` event.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionPayload {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// The `data.object` of an `invoice.*` event.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoicePayload {
    pub id: String,
    pub customer: Option<String>,
    pub amount_paid: Option<i64>,
    pub amount_due: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum WebhookEvent {
    SubscriptionCreated(SubscriptionPayload),
    SubscriptionUpdated(SubscriptionPayload),
    SubscriptionDeleted(SubscriptionPayload),
    InvoicePaymentSucceeded(InvoicePayload),
    InvoicePaymentFailed(InvoicePayload),
    Unknown { event_type: String },
}

/// A parsed webhook delivery: the provider event id plus the typed event.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub event_id: String,
    pub event: WebhookEvent,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

impl WebhookEnvelope {
    /// Parse a raw (already signature-verified) webhook body.
    pub fn parse(body: &str) -> AppResult<Self> {
        let raw: RawEnvelope = serde_json::from_str(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

        let event = match raw.event_type.as_str() {
            "customer.subscription.created" => {
                WebhookEvent::SubscriptionCreated(subscription_object(raw.data.object)?)
            }
            "customer.subscription.updated" => {
                WebhookEvent::SubscriptionUpdated(subscription_object(raw.data.object)?)
            }
            "customer.subscription.deleted" => {
                WebhookEvent::SubscriptionDeleted(subscription_object(raw.data.object)?)
            }
            "invoice.payment_succeeded" => {
                WebhookEvent::InvoicePaymentSucceeded(invoice_object(raw.data.object)?)
            }
            "invoice.payment_failed" => {
                WebhookEvent::InvoicePaymentFailed(invoice_object(raw.data.object)?)
            }
            _ => WebhookEvent::Unknown {
                event_type: raw.event_type,
            },
        };

        Ok(WebhookEnvelope {
            event_id: raw.id,
            event,
        })
    }
}

fn subscription_object(object: serde_json::Value) -> AppResult<SubscriptionPayload> {
    serde_json::from_value(object)
        .map_err(|e| AppError::InvalidInput(format!("Invalid subscription object: {}", e)))
}

fn invoice_object(object: serde_json::Value) -> AppResult<InvoicePayload> {
    serde_json::from_value(object)
        .map_err(|e| AppError::InvalidInput(format!("Invalid invoice object: {}", e)))
}
