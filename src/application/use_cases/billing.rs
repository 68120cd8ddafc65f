use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::jwt::SessionUser,
    application::ports::billing_provider::{
        BillingProviderPort, CustomerId, InvoiceInfo, SubscriptionInfo,
    },
    domain::entities::{
        billing_customer::{BillingCustomer, SubscriptionStatus},
        plan::{Plan, PlanCatalog},
        proration::{self, ProrationEstimate},
        webhook_event::SubscriptionPayload,
    },
};

const BILLING_PATH: &str = "/account/billing";
const ACCOUNT_PATH: &str = "/account";
const SUBSCRIBE_PATH: &str = "/account/subscribe";

/// Convert a unix timestamp to NaiveDateTime
fn timestamp_to_naive(secs: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Webhook-driven update of the local subscription projection.
#[derive(Debug, Clone)]
pub struct SubscriptionStateUpdate {
    pub status: SubscriptionStatus,
    pub stripe_subscription_id: Option<String>,
    pub current_period_end: Option<NaiveDateTime>,
}

#[async_trait]
pub trait BillingCustomerRepo: Send + Sync {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BillingCustomer>>;

    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>>;

    /// Insert a new user -> customer mapping. `user_id` carries a unique
    /// constraint; a concurrent insert surfaces as `AppError::Conflict`.
    async fn insert_mapping(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
    ) -> AppResult<BillingCustomer>;

    /// Apply a subscription state update keyed by Stripe customer id.
    /// Returns `None` when no local record exists for that customer.
    async fn upsert_subscription_state(
        &self,
        stripe_customer_id: &str,
        update: &SubscriptionStateUpdate,
    ) -> AppResult<Option<BillingCustomer>>;

    /// Mark the subscription canceled and clear its id and period end.
    /// Returns `None` when no local record exists for that customer.
    async fn clear_subscription_state(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>>;
}

// ============================================================================
// Result Types
// ============================================================================

/// Provider-reported subscription state for one customer.
#[derive(Debug, Clone)]
pub struct SubscriptionOverview {
    pub primary: Option<SubscriptionInfo>,
    pub has_ever_had_subscription: bool,
}

/// Everything the billing page needs in one round trip.
#[derive(Debug, Clone, Serialize)]
pub struct BillingOverview {
    pub is_active_customer: bool,
    pub has_ever_had_subscription: bool,
    pub current_plan_id: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub current_period_end: Option<i64>,
    pub subscription_id: Option<String>,
    pub cancel_at_period_end: bool,
    pub invoices: Vec<InvoiceInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanChangePreview {
    pub current_plan: Plan,
    pub new_plan: Plan,
    pub price_id: String,
    pub estimate: ProrationEstimate,
}

/// Outcome of asking for a plan-change quote.
#[derive(Debug, Clone)]
pub enum PlanChangeQuote {
    /// Nothing to change from; the caller should enter the subscribe flow.
    NoSubscription { subscribe_path: String },
    Preview(PlanChangePreview),
}

/// Pick the subscription that represents the customer's current
/// entitlement: prefer active/trialing, tie-break by most recent creation.
fn select_primary(subscriptions: Vec<SubscriptionInfo>) -> Option<SubscriptionInfo> {
    subscriptions
        .into_iter()
        .filter(|s| s.status.is_active())
        .max_by_key(|s| s.created)
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct BillingUseCases {
    customers: Arc<dyn BillingCustomerRepo>,
    provider: Arc<dyn BillingProviderPort>,
    catalog: Arc<PlanCatalog>,
    app_origin: String,
}

impl BillingUseCases {
    pub fn new(
        customers: Arc<dyn BillingCustomerRepo>,
        provider: Arc<dyn BillingProviderPort>,
        catalog: Arc<PlanCatalog>,
        app_origin: String,
    ) -> Self {
        Self {
            customers,
            provider,
            catalog,
            app_origin: app_origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    // ========================================================================
    // Customer Identity Resolver
    // ========================================================================

    /// Resolve the Stripe customer id for a user, creating the provider
    /// customer and the local mapping on first billing interaction.
    ///
    /// Safe under concurrent invocation: a unique-constraint conflict on
    /// insert means another request won the race, so we re-read and return
    /// the existing mapping.
    pub async fn get_or_create_customer_id(&self, user: &SessionUser) -> AppResult<CustomerId> {
        if let Some(existing) = self.customers.get_by_user_id(user.user_id).await? {
            return Ok(CustomerId::new(existing.stripe_customer_id));
        }

        let customer_id = self
            .provider
            .create_customer(&user.email, user.user_id)
            .await?;

        match self
            .customers
            .insert_mapping(user.user_id, customer_id.as_str())
            .await
        {
            Ok(record) => Ok(CustomerId::new(record.stripe_customer_id)),
            Err(AppError::Conflict) => {
                let existing = self
                    .customers
                    .get_by_user_id(user.user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("Customer mapping missing after conflict".into())
                    })?;
                Ok(CustomerId::new(existing.stripe_customer_id))
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Subscription Fetcher
    // ========================================================================

    /// Fetch the customer's subscriptions from the provider and select the
    /// primary one. Never mutates local state.
    pub async fn fetch_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<SubscriptionOverview> {
        let subscriptions = self.provider.list_subscriptions(customer).await?;
        let has_ever_had_subscription = !subscriptions.is_empty();
        let primary = select_primary(subscriptions);

        Ok(SubscriptionOverview {
            primary,
            has_ever_had_subscription,
        })
    }

    // ========================================================================
    // Subscription Change Orchestrator
    // ========================================================================

    /// Subscribe to (or switch to) the plan behind `price_id`. Returns the
    /// URL to redirect the user to.
    ///
    /// With an existing subscription the line item is swapped in place and
    /// the provider invoices the prorated delta; otherwise a hosted
    /// checkout session is created. No local subscription-status write
    /// happens here - the webhook is the authoritative writer.
    pub async fn subscribe(&self, user: &SessionUser, price_id: &str) -> AppResult<String> {
        // The free tier has nothing to purchase
        if let Some(plan) = self.catalog.by_id(price_id) {
            if plan.is_free() {
                return Ok(ACCOUNT_PATH.to_string());
            }
        }

        let plan = self
            .catalog
            .by_stripe_price_id(price_id)
            .ok_or(AppError::NotFound)?;
        let price_id = plan
            .stripe_price_id
            .as_deref()
            .ok_or(AppError::NotFound)?;

        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        if let Some(primary) = overview.primary {
            let item_id = primary
                .item_id
                .ok_or_else(|| AppError::Provider("Subscription has no line item".into()))?;
            self.provider
                .update_subscription_price(&primary.id, &item_id, price_id)
                .await?;
            return Ok(format!("{}?updated=true", BILLING_PATH));
        }

        let success_url = format!("{}{}?subscribed=true", self.app_origin, BILLING_PATH);
        let cancel_url = format!("{}{}", self.app_origin, BILLING_PATH);
        let session = self
            .provider
            .create_checkout_session(&customer, price_id, &success_url, &cancel_url)
            .await?;
        Ok(session.url)
    }

    /// Quote an upgrade/downgrade to the plan behind `price_id`.
    ///
    /// The estimate is advisory only; the provider computes the actual
    /// proration when the change is confirmed.
    pub async fn preview_plan_change(
        &self,
        user: &SessionUser,
        price_id: &str,
    ) -> AppResult<PlanChangeQuote> {
        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        let Some(primary) = overview.primary else {
            return Ok(PlanChangeQuote::NoSubscription {
                subscribe_path: format!("{}/{}", SUBSCRIBE_PATH, price_id),
            });
        };

        let current_plan = primary
            .product_id
            .as_deref()
            .and_then(|id| self.catalog.by_stripe_product_id(id))
            .ok_or(AppError::NotFound)?;
        let new_plan = self
            .catalog
            .by_stripe_price_id(price_id)
            .ok_or(AppError::NotFound)?;

        let estimate = proration::estimate(
            current_plan.price_cents,
            new_plan.price_cents,
            primary.current_period_start,
            primary.current_period_end,
            Utc::now().timestamp(),
        );

        Ok(PlanChangeQuote::Preview(PlanChangePreview {
            current_plan: current_plan.clone(),
            new_plan: new_plan.clone(),
            price_id: price_id.to_string(),
            estimate,
        }))
    }

    /// Execute a confirmed plan change. Returns the redirect URL.
    pub async fn confirm_plan_change(
        &self,
        user: &SessionUser,
        price_id: &str,
    ) -> AppResult<String> {
        self.catalog
            .by_stripe_price_id(price_id)
            .ok_or(AppError::NotFound)?;

        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        let primary = overview
            .primary
            .ok_or_else(|| AppError::InvalidInput("No active subscription found".into()))?;
        let item_id = primary
            .item_id
            .ok_or_else(|| AppError::Provider("Subscription has no line item".into()))?;

        self.provider
            .update_subscription_price(&primary.id, &item_id, price_id)
            .await?;

        Ok(format!("{}?updated=true", BILLING_PATH))
    }

    /// Cancel the subscription at period end. Access is not revoked until
    /// the provider ends the period and the webhook confirms it.
    pub async fn cancel(&self, user: &SessionUser) -> AppResult<String> {
        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        let primary = overview
            .primary
            .ok_or_else(|| AppError::InvalidInput("No active subscription found".into()))?;

        self.provider
            .set_cancel_at_period_end(&primary.id, true)
            .await?;

        Ok(format!("{}?canceled=true", BILLING_PATH))
    }

    /// Undo a pending cancellation.
    pub async fn reactivate(&self, user: &SessionUser) -> AppResult<String> {
        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        let primary = overview
            .primary
            .ok_or_else(|| AppError::InvalidInput("No subscription found".into()))?;

        self.provider
            .set_cancel_at_period_end(&primary.id, false)
            .await?;

        Ok(format!("{}?reactivated=true", BILLING_PATH))
    }

    /// Billing page data: live subscription state plus invoice history.
    /// Invoice listing failure degrades to an empty list rather than
    /// failing the whole overview.
    pub async fn billing_overview(&self, user: &SessionUser) -> AppResult<BillingOverview> {
        let customer = self.get_or_create_customer_id(user).await?;
        let overview = self.fetch_subscription(&customer).await?;

        let invoices = match self.provider.list_invoices(&customer, 100).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, customer_id = %customer, "Failed to fetch invoice history");
                Vec::new()
            }
        };

        let current_plan_id = overview
            .primary
            .as_ref()
            .and_then(|p| p.product_id.as_deref())
            .and_then(|id| self.catalog.by_stripe_product_id(id))
            .map(|p| p.id.clone());

        Ok(BillingOverview {
            is_active_customer: overview.primary.is_some(),
            has_ever_had_subscription: overview.has_ever_had_subscription,
            current_plan_id,
            subscription_status: overview.primary.as_ref().map(|p| p.status),
            current_period_end: overview.primary.as_ref().map(|p| p.current_period_end),
            subscription_id: overview.primary.as_ref().map(|p| p.id.to_string()),
            cancel_at_period_end: overview
                .primary
                .as_ref()
                .map(|p| p.cancel_at_period_end)
                .unwrap_or(false),
            invoices,
        })
    }

    // ========================================================================
    // Webhook Reconciler
    // ========================================================================

    /// Apply a `customer.subscription.created`/`updated` event to the local
    /// record. Idempotent: the write is an upsert keyed by customer id, so
    /// redelivery of the same event produces the same end state.
    ///
    /// A missing local record is an expected race with customer creation,
    /// not an error.
    pub async fn apply_subscription_change(&self, sub: &SubscriptionPayload) -> AppResult<()> {
        let status = SubscriptionStatus::from_stripe(&sub.status);
        let update = SubscriptionStateUpdate {
            status,
            stripe_subscription_id: Some(sub.id.clone()),
            current_period_end: sub.current_period_end.and_then(timestamp_to_naive),
        };

        match self
            .customers
            .upsert_subscription_state(&sub.customer, &update)
            .await?
        {
            Some(customer) => {
                tracing::info!(
                    user_id = %customer.user_id,
                    status = status.as_str(),
                    "Subscription state reconciled"
                );
            }
            None => {
                tracing::info!(
                    customer_id = %sub.customer,
                    "Webhook for unknown customer, skipping"
                );
            }
        }
        Ok(())
    }

    /// Apply a `customer.subscription.deleted` event: status becomes
    /// canceled, subscription id and period end are cleared.
    pub async fn apply_subscription_deletion(&self, sub: &SubscriptionPayload) -> AppResult<()> {
        match self
            .customers
            .clear_subscription_state(&sub.customer)
            .await?
        {
            Some(customer) => {
                tracing::info!(user_id = %customer.user_id, "Subscription canceled");
            }
            None => {
                tracing::info!(
                    customer_id = %sub.customer,
                    "Deletion webhook for unknown customer, skipping"
                );
            }
        }
        Ok(())
    }
}
