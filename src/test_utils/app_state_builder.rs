//! Test app state builder for HTTP-level integration testing.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::billing::BillingUseCases,
    domain::entities::plan::PlanCatalog,
    infra::config::AppConfig,
    test_utils::{
        FakeBillingProvider, InMemoryBillingCustomerRepo,
        factories::{TEST_JWT_SECRET, TEST_WEBHOOK_SECRET},
    },
};

/// Builder for creating `AppState` backed by in-memory mocks.
///
/// # Example
///
/// ```ignore
/// let (app_state, customer_repo, provider) =
///     TestAppStateBuilder::new().build_with_handles();
/// ```
pub struct TestAppStateBuilder {
    catalog: PlanCatalog,
    app_origin: String,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            catalog: PlanCatalog::default_plans(),
            app_origin: "https://app.test".to_string(),
        }
    }

    pub fn with_catalog(mut self, catalog: PlanCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_handles().0
    }

    /// Build the app state and return the mock handles for assertions.
    pub fn build_with_handles(
        self,
    ) -> (
        AppState,
        Arc<InMemoryBillingCustomerRepo>,
        Arc<FakeBillingProvider>,
    ) {
        let customer_repo = Arc::new(InMemoryBillingCustomerRepo::new());
        let provider = Arc::new(FakeBillingProvider::new());

        let billing_use_cases = Arc::new(BillingUseCases::new(
            customer_repo.clone(),
            provider.clone(),
            Arc::new(self.catalog),
            self.app_origin,
        ));

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse().unwrap(),
            database_url: String::new(),
            app_origin: Url::parse("https://app.test").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
            stripe_secret_key: SecretString::new("sk_test_key".into()),
            stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
            plan_catalog_path: None,
        });

        (
            AppState {
                config,
                billing_use_cases,
            },
            customer_repo,
            provider,
        )
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
