use std::fs::File;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::ports::billing_provider::BillingProviderPort,
    application::use_cases::billing::{BillingCustomerRepo, BillingUseCases},
    domain::entities::plan::PlanCatalog,
    infra::{config::AppConfig, error::InfraError, stripe_provider::StripeBillingProvider},
};

pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let persistence = Arc::new(PostgresPersistence::new(pool));

    let catalog = match &config.plan_catalog_path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| InfraError::PlanCatalog {
                path: path.clone(),
                source: e,
            })?;
            PlanCatalog::from_json(&json).map_err(|e| InfraError::PlanCatalog {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?
        }
        None => PlanCatalog::default_plans(),
    };

    // The provider client is constructed once here and injected everywhere
    let provider = Arc::new(StripeBillingProvider::new(config.stripe_secret_key.clone()))
        as Arc<dyn BillingProviderPort>;

    let customer_repo = persistence as Arc<dyn BillingCustomerRepo>;

    let billing_use_cases = Arc::new(BillingUseCases::new(
        customer_repo,
        provider,
        Arc::new(catalog),
        config.app_origin.to_string(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        billing_use_cases,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "billsync=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
