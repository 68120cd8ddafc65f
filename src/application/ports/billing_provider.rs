use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::billing_customer::SubscriptionStatus};

// ============================================================================
// Port Types - Provider-agnostic domain types
// ============================================================================

/// Unique identifier for a customer in the billing provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a subscription in the billing provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Denormalized projection of a provider-owned subscription.
///
/// Timestamps are unix seconds as reported by the provider.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub customer_id: CustomerId,
    pub status: SubscriptionStatus,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    /// Creation time, used to tie-break primary selection
    pub created: i64,
    /// Price ID of the first line item
    pub price_id: Option<String>,
    /// Product ID of the first line item
    pub product_id: Option<String>,
    /// Subscription item ID of the first line item (needed for plan changes)
    pub item_id: Option<String>,
}

/// Result of creating a hosted checkout session
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Invoice information for billing history
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceInfo {
    pub id: String,
    pub created: i64,
    pub amount_paid_cents: i64,
    pub currency: String,
    pub status: Option<String>,
    pub hosted_url: Option<String>,
    pub pdf_url: Option<String>,
}

// ============================================================================
// Billing Provider Port
// ============================================================================

/// Abstracts the billing provider behind domain-level operations.
///
/// Implementations map these to provider-specific APIs. The port is a
/// constructed dependency: it is built once at startup and injected into
/// the use cases, never reached through a global.
#[async_trait]
pub trait BillingProviderPort: Send + Sync {
    /// Create a customer in the provider, tagged with the application user id.
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<CustomerId>;

    /// List ALL subscriptions for a customer, including ended ones.
    /// The provider is the source of truth for live status.
    async fn list_subscriptions(&self, customer: &CustomerId) -> AppResult<Vec<SubscriptionInfo>>;

    /// Switch a subscription's single line item to a new price, letting the
    /// provider invoice the prorated difference immediately.
    async fn update_subscription_price(
        &self,
        subscription_id: &SubscriptionId,
        item_id: &str,
        price_id: &str,
    ) -> AppResult<SubscriptionInfo>;

    /// Set or clear cancel-at-period-end on a subscription.
    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &SubscriptionId,
        cancel: bool,
    ) -> AppResult<SubscriptionInfo>;

    /// Create a hosted checkout session for a new subscription.
    async fn create_checkout_session(
        &self,
        customer: &CustomerId,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession>;

    /// List recent invoices for a customer.
    async fn list_invoices(
        &self,
        customer: &CustomerId,
        limit: i32,
    ) -> AppResult<Vec<InvoiceInfo>>;
}
