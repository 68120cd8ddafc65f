use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{
        BillingProviderPort, CheckoutSession, CustomerId, InvoiceInfo, SubscriptionId,
        SubscriptionInfo,
    },
    domain::entities::billing_customer::SubscriptionStatus,
    infra::stripe_client::{StripeClient, StripeSubscription},
};

/// Adapter that wraps StripeClient to implement BillingProviderPort.
///
/// Translates domain-action-based calls to Stripe API calls.
#[derive(Clone)]
pub struct StripeBillingProvider {
    client: StripeClient,
}

impl StripeBillingProvider {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: StripeClient::new(secret_key),
        }
    }

    fn map_subscription(sub: StripeSubscription) -> SubscriptionInfo {
        let first_item = sub.items.data.into_iter().next();
        let (item_id, price_id, product_id) = match first_item {
            Some(item) => (Some(item.id), Some(item.price.id), Some(item.price.product)),
            None => (None, None, None),
        };

        SubscriptionInfo {
            id: SubscriptionId::new(sub.id),
            customer_id: CustomerId::new(sub.customer),
            status: SubscriptionStatus::from_stripe(&sub.status),
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            created: sub.created,
            price_id,
            product_id,
            item_id,
        }
    }
}

#[async_trait]
impl BillingProviderPort for StripeBillingProvider {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<CustomerId> {
        let customer = self.client.create_customer(email, user_id).await?;
        Ok(CustomerId::new(customer.id))
    }

    async fn list_subscriptions(&self, customer: &CustomerId) -> AppResult<Vec<SubscriptionInfo>> {
        let subscriptions = self.client.list_subscriptions(customer.as_str()).await?;
        Ok(subscriptions
            .into_iter()
            .map(Self::map_subscription)
            .collect())
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &SubscriptionId,
        item_id: &str,
        price_id: &str,
    ) -> AppResult<SubscriptionInfo> {
        let sub = self
            .client
            .update_subscription_price(subscription_id.as_str(), item_id, price_id)
            .await?;
        Ok(Self::map_subscription(sub))
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &SubscriptionId,
        cancel: bool,
    ) -> AppResult<SubscriptionInfo> {
        let sub = self
            .client
            .set_cancel_at_period_end(subscription_id.as_str(), cancel)
            .await?;
        Ok(Self::map_subscription(sub))
    }

    async fn create_checkout_session(
        &self,
        customer: &CustomerId,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        let session = self
            .client
            .create_checkout_session(customer.as_str(), price_id, success_url, cancel_url)
            .await?;

        let url = session
            .url
            .ok_or_else(|| AppError::Provider("Stripe checkout session missing URL".into()))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn list_invoices(
        &self,
        customer: &CustomerId,
        limit: i32,
    ) -> AppResult<Vec<InvoiceInfo>> {
        let invoices = self.client.list_invoices(customer.as_str(), limit).await?;
        Ok(invoices
            .into_iter()
            .map(|inv| InvoiceInfo {
                id: inv.id,
                created: inv.created,
                amount_paid_cents: inv.amount_paid,
                currency: inv.currency.to_uppercase(),
                status: inv.status,
                hosted_url: inv.hosted_invoice_url,
                pdf_url: inv.invoice_pdf,
            })
            .collect())
    }
}
