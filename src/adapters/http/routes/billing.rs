//! Billing routes: overview, plans, subscribe, plan changes, cancel, reactivate.
//!
//! Every action resolves the session user, calls into the billing use
//! cases, and answers with a redirect to a status-annotated destination.
//! Local subscription state is never written here; the webhook reconciler
//! owns those fields.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::get_current_user;
use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::ports::billing_provider::InvoiceInfo,
    application::use_cases::billing::PlanChangeQuote,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Serialize)]
struct PlanResponse {
    id: String,
    name: String,
    description: Option<String>,
    price: String,
    price_cents: i64,
    stripe_price_id: Option<String>,
    features: Vec<String>,
}

#[derive(Serialize)]
struct BillingOverviewResponse {
    is_active_customer: bool,
    has_ever_had_subscription: bool,
    current_plan_id: Option<String>,
    subscription_status: Option<String>,
    current_period_end: Option<i64>,
    subscription_id: Option<String>,
    cancel_at_period_end: bool,
    invoices: Vec<InvoiceResponse>,
}

#[derive(Serialize)]
struct InvoiceResponse {
    id: String,
    date: i64,
    amount_cents: i64,
    currency: String,
    status: Option<String>,
    hosted_url: Option<String>,
    pdf_url: Option<String>,
}

impl From<InvoiceInfo> for InvoiceResponse {
    fn from(inv: InvoiceInfo) -> Self {
        InvoiceResponse {
            id: inv.id,
            date: inv.created,
            amount_cents: inv.amount_paid_cents,
            currency: inv.currency,
            status: inv.status,
            hosted_url: inv.hosted_url,
            pdf_url: inv.pdf_url,
        }
    }
}

#[derive(Serialize)]
struct PlanChangePreviewResponse {
    current_plan_id: String,
    new_plan_id: String,
    price_id: String,
    days_remaining: i64,
    days_in_period: i64,
    prorated_charge_cents: i64,
    is_upgrade: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/billing/plans
/// Returns the static plan catalog
async fn get_plans(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let response: Vec<PlanResponse> = app_state
        .billing_use_cases
        .catalog()
        .all()
        .iter()
        .map(|p| PlanResponse {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price_display(),
            price_cents: p.price_cents,
            stripe_price_id: p.stripe_price_id.clone(),
            features: p.features.clone(),
        })
        .collect();

    Ok(Json(response))
}

/// GET /api/billing
/// Returns the user's billing overview: live subscription state + invoices
async fn get_billing_overview(
    State(app_state): State<AppState>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let overview = app_state.billing_use_cases.billing_overview(&user).await?;

    Ok(Json(BillingOverviewResponse {
        is_active_customer: overview.is_active_customer,
        has_ever_had_subscription: overview.has_ever_had_subscription,
        current_plan_id: overview.current_plan_id,
        subscription_status: overview
            .subscription_status
            .map(|s| s.as_str().to_string()),
        current_period_end: overview.current_period_end,
        subscription_id: overview.subscription_id,
        cancel_at_period_end: overview.cancel_at_period_end,
        invoices: overview.invoices.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/billing/subscribe/{price_id}
/// Subscribe to a plan: checkout for new customers, an in-place line item
/// swap for existing subscribers
async fn subscribe(
    State(app_state): State<AppState>,
    Path(price_id): Path<String>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let destination = app_state.billing_use_cases.subscribe(&user, &price_id).await?;

    Ok(Redirect::to(&destination))
}

/// GET /api/billing/plan-change/{price_id}
/// Preview the prorated cost of an upgrade or downgrade
async fn preview_plan_change(
    State(app_state): State<AppState>,
    Path(price_id): Path<String>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let quote = app_state
        .billing_use_cases
        .preview_plan_change(&user, &price_id)
        .await?;

    match quote {
        PlanChangeQuote::NoSubscription { subscribe_path } => {
            Ok(Redirect::to(&subscribe_path).into_response())
        }
        PlanChangeQuote::Preview(preview) => Ok(Json(PlanChangePreviewResponse {
            current_plan_id: preview.current_plan.id,
            new_plan_id: preview.new_plan.id,
            price_id: preview.price_id,
            days_remaining: preview.estimate.days_remaining,
            days_in_period: preview.estimate.days_in_period,
            prorated_charge_cents: preview.estimate.prorated_charge_cents,
            is_upgrade: preview.estimate.is_upgrade,
        })
        .into_response()),
    }
}

/// POST /api/billing/plan-change/{price_id}
/// Execute a confirmed plan change
async fn confirm_plan_change(
    State(app_state): State<AppState>,
    Path(price_id): Path<String>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let destination = app_state
        .billing_use_cases
        .confirm_plan_change(&user, &price_id)
        .await?;

    Ok(Redirect::to(&destination))
}

/// POST /api/billing/cancel
/// Cancels the user's subscription at period end
async fn cancel_subscription(
    State(app_state): State<AppState>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let destination = app_state.billing_use_cases.cancel(&user).await?;

    Ok(Redirect::to(&destination))
}

/// POST /api/billing/reactivate
/// Clears a pending cancellation
async fn reactivate_subscription(
    State(app_state): State<AppState>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user = get_current_user(&app_state, &cookies)?;

    let destination = app_state.billing_use_cases.reactivate(&user).await?;

    Ok(Redirect::to(&destination))
}

// ============================================================================
// Router
// ============================================================================

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_billing_overview))
        .route("/plans", get(get_plans))
        .route("/subscribe/{price_id}", post(subscribe))
        .route(
            "/plan-change/{price_id}",
            get(preview_plan_change).post(confirm_plan_change),
        )
        .route("/cancel", post(cancel_subscription))
        .route("/reactivate", post(reactivate_subscription))
}

// ============================================================================
// Tests
// ============================================================================
