//! In-memory mock implementations of the billing repo and provider port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{
        BillingProviderPort, CheckoutSession, CustomerId, InvoiceInfo, SubscriptionId,
        SubscriptionInfo,
    },
    application::use_cases::billing::{BillingCustomerRepo, SubscriptionStateUpdate},
    domain::entities::billing_customer::{BillingCustomer, SubscriptionStatus},
};

// ============================================================================
// InMemoryBillingCustomerRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryBillingCustomerRepo {
    pub customers: Mutex<HashMap<Uuid, BillingCustomer>>,
    fail_writes: AtomicBool,
}

impl InMemoryBillingCustomerRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a database error, to exercise the
    /// fail-closed webhook path.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of user -> customer mappings currently stored.
    pub fn mapping_count(&self) -> usize {
        self.customers.lock().unwrap().len()
    }

    /// Direct read for test assertions.
    pub fn get_record(&self, user_id: Uuid) -> Option<BillingCustomer> {
        self.customers.lock().unwrap().get(&user_id).cloned()
    }

    /// Seed a mapping without going through the resolver.
    pub fn seed_mapping(&self, user_id: Uuid, stripe_customer_id: &str) -> CustomerId {
        let now = chrono::Utc::now().naive_utc();
        self.customers.lock().unwrap().insert(
            user_id,
            BillingCustomer {
                user_id,
                stripe_customer_id: stripe_customer_id.to_string(),
                subscription_status: None,
                stripe_subscription_id: None,
                current_period_end: None,
                created_at: Some(now),
                updated_at: Some(now),
            },
        );
        CustomerId::new(stripe_customer_id)
    }

    fn check_writes(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingCustomerRepo for InMemoryBillingCustomerRepo {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BillingCustomer>> {
        Ok(self.customers.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .values()
            .find(|c| c.stripe_customer_id == stripe_customer_id)
            .cloned())
    }

    async fn insert_mapping(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
    ) -> AppResult<BillingCustomer> {
        self.check_writes()?;
        let mut customers = self.customers.lock().unwrap();

        // Unique constraint on user_id
        if customers.contains_key(&user_id) {
            return Err(AppError::Conflict);
        }

        let now = chrono::Utc::now().naive_utc();
        let customer = BillingCustomer {
            user_id,
            stripe_customer_id: stripe_customer_id.to_string(),
            subscription_status: None,
            stripe_subscription_id: None,
            current_period_end: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        customers.insert(user_id, customer.clone());
        Ok(customer)
    }

    async fn upsert_subscription_state(
        &self,
        stripe_customer_id: &str,
        update: &SubscriptionStateUpdate,
    ) -> AppResult<Option<BillingCustomer>> {
        self.check_writes()?;
        let mut customers = self.customers.lock().unwrap();

        let Some(customer) = customers
            .values_mut()
            .find(|c| c.stripe_customer_id == stripe_customer_id)
        else {
            return Ok(None);
        };

        customer.subscription_status = Some(update.status);
        if let Some(ref sub_id) = update.stripe_subscription_id {
            customer.stripe_subscription_id = Some(sub_id.clone());
        }
        customer.current_period_end = update.current_period_end;
        customer.updated_at = Some(chrono::Utc::now().naive_utc());

        Ok(Some(customer.clone()))
    }

    async fn clear_subscription_state(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>> {
        self.check_writes()?;
        let mut customers = self.customers.lock().unwrap();

        let Some(customer) = customers
            .values_mut()
            .find(|c| c.stripe_customer_id == stripe_customer_id)
        else {
            return Ok(None);
        };

        customer.subscription_status = Some(SubscriptionStatus::Canceled);
        customer.stripe_subscription_id = None;
        customer.current_period_end = None;
        customer.updated_at = Some(chrono::Utc::now().naive_utc());

        Ok(Some(customer.clone()))
    }
}

// ============================================================================
// FakeBillingProvider
// ============================================================================

/// Provider-side world: subscriptions keyed by subscription id, plus a
/// record of every mutating call for assertions.
#[derive(Default)]
pub struct FakeBillingProvider {
    pub subscriptions: Mutex<HashMap<String, SubscriptionInfo>>,
    pub invoices: Mutex<Vec<InvoiceInfo>>,
    created_customers: AtomicUsize,
    /// (customer_id, price_id, success_url) per checkout session created
    checkout_calls: Mutex<Vec<(String, String, String)>>,
    /// (subscription_id, price_id) per line-item swap
    price_update_calls: Mutex<Vec<(String, String)>>,
    fail_invoices: AtomicBool,
}

impl FakeBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscription(&self, sub: SubscriptionInfo) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(sub.id.as_str().to_string(), sub);
    }

    pub fn add_invoice(&self, invoice: InvoiceInfo) {
        self.invoices.lock().unwrap().push(invoice);
    }

    pub fn fail_invoice_listing(&self) {
        self.fail_invoices.store(true, Ordering::SeqCst);
    }

    pub fn created_customer_count(&self) -> usize {
        self.created_customers.load(Ordering::SeqCst)
    }

    pub fn checkout_sessions(&self) -> Vec<(String, String, String)> {
        self.checkout_calls.lock().unwrap().clone()
    }

    pub fn price_updates(&self) -> Vec<(String, String)> {
        self.price_update_calls.lock().unwrap().clone()
    }

    /// Current cancel-at-period-end flag of a stored subscription.
    pub fn cancel_at_period_end(&self, subscription_id: &str) -> bool {
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .map(|s| s.cancel_at_period_end)
            .unwrap_or(false)
    }
}

#[async_trait]
impl BillingProviderPort for FakeBillingProvider {
    async fn create_customer(&self, _email: &str, _user_id: Uuid) -> AppResult<CustomerId> {
        let n = self.created_customers.fetch_add(1, Ordering::SeqCst);
        Ok(CustomerId::new(format!("cus_test_{}", n + 1)))
    }

    async fn list_subscriptions(&self, customer: &CustomerId) -> AppResult<Vec<SubscriptionInfo>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.customer_id == *customer)
            .cloned()
            .collect())
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &SubscriptionId,
        _item_id: &str,
        price_id: &str,
    ) -> AppResult<SubscriptionInfo> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions
            .get_mut(subscription_id.as_str())
            .ok_or(AppError::NotFound)?;

        sub.price_id = Some(price_id.to_string());
        self.price_update_calls
            .lock()
            .unwrap()
            .push((subscription_id.as_str().to_string(), price_id.to_string()));

        Ok(sub.clone())
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &SubscriptionId,
        cancel: bool,
    ) -> AppResult<SubscriptionInfo> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions
            .get_mut(subscription_id.as_str())
            .ok_or(AppError::NotFound)?;

        sub.cancel_at_period_end = cancel;
        Ok(sub.clone())
    }

    async fn create_checkout_session(
        &self,
        customer: &CustomerId,
        price_id: &str,
        success_url: &str,
        _cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        let mut calls = self.checkout_calls.lock().unwrap();
        calls.push((
            customer.as_str().to_string(),
            price_id.to_string(),
            success_url.to_string(),
        ));
        let id = format!("cs_test_{}", calls.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.test/{}", id),
            id,
        })
    }

    async fn list_invoices(
        &self,
        _customer: &CustomerId,
        _limit: i32,
    ) -> AppResult<Vec<InvoiceInfo>> {
        if self.fail_invoices.load(Ordering::SeqCst) {
            return Err(AppError::Provider("injected failure".into()));
        }
        Ok(self.invoices.lock().unwrap().clone())
    }
}
