//! Test data factories and crypto helpers.
//!
//! Factories create complete, valid objects with sensible defaults; use
//! the closure parameter to override fields as needed.

use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    application::jwt::{self, SessionUser},
    application::ports::billing_provider::{CustomerId, SubscriptionId, SubscriptionInfo},
    domain::entities::billing_customer::SubscriptionStatus,
};

pub const TEST_JWT_SECRET: &str = "test_jwt_secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn test_session_user() -> SessionUser {
    SessionUser {
        user_id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
    }
}

/// Cookie header value carrying a freshly signed session token.
pub fn session_cookie_header(user: &SessionUser) -> String {
    let secret = SecretString::new(TEST_JWT_SECRET.into());
    let token = jwt::issue(user.user_id, &user.email, &secret, chrono::Duration::hours(1))
        .expect("test token should sign");
    format!("access_token={}", token)
}

/// Create a provider-side subscription with sensible defaults.
pub fn create_test_subscription_info(
    customer: &CustomerId,
    overrides: impl FnOnce(&mut SubscriptionInfo),
) -> SubscriptionInfo {
    let mut sub = SubscriptionInfo {
        id: SubscriptionId::new("sub_test"),
        customer_id: customer.clone(),
        status: SubscriptionStatus::Active,
        current_period_start: 1_700_000_000,
        current_period_end: 1_702_592_000,
        cancel_at_period_end: false,
        created: 1_700_000_000,
        price_id: Some("price_test".to_string()),
        product_id: None,
        item_id: Some("si_test".to_string()),
    };
    overrides(&mut sub);
    sub
}

/// Produce a valid `stripe-signature` header for a payload, timestamped now.
pub fn sign_webhook_payload(payload: &str, secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC key");
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}
