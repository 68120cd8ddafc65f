//! Shared test utilities: in-memory mocks, data factories, and a builder
//! for assembling an `AppState` without Postgres or Stripe.

mod app_state_builder;
mod billing_mocks;
mod factories;

pub use app_state_builder::TestAppStateBuilder;
pub use billing_mocks::{FakeBillingProvider, InMemoryBillingCustomerRepo};
pub use factories::{
    TEST_JWT_SECRET, TEST_WEBHOOK_SECRET, create_test_subscription_info, session_cookie_header,
    sign_webhook_payload, test_session_user,
};
