use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Public origin of the web app, used to build checkout return URLs.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub jwt_secret: SecretString,
    pub stripe_secret_key: SecretString,
    /// Endpoint secret for verifying inbound webhook signatures.
    pub stripe_webhook_secret: SecretString,
    /// Optional path to a JSON plan catalog; built-in plans are used when unset.
    pub plan_catalog_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let stripe_secret_key = SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());

        let plan_catalog_path: Option<String> = std::env::var("PLAN_CATALOG_PATH").ok();

        Self {
            bind_addr,
            database_url,
            app_origin,
            cors_origin,
            jwt_secret,
            stripe_secret_key,
            stripe_webhook_secret,
            plan_catalog_path,
        }
    }
}
