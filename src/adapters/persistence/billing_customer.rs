use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{BillingCustomerRepo, SubscriptionStateUpdate},
    domain::entities::billing_customer::{BillingCustomer, SubscriptionStatus},
};

fn row_to_customer(row: &sqlx::postgres::PgRow) -> BillingCustomer {
    BillingCustomer {
        user_id: row.get("user_id"),
        stripe_customer_id: row.get("stripe_customer_id"),
        subscription_status: row.get::<Option<SubscriptionStatus>, _>("subscription_status"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        current_period_end: row.get("current_period_end"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    user_id, stripe_customer_id, subscription_status, stripe_subscription_id,
    current_period_end, created_at, updated_at
"#;

#[async_trait]
impl BillingCustomerRepo for PostgresPersistence {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BillingCustomer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM billing_customers WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn get_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM billing_customers WHERE stripe_customer_id = $1",
            SELECT_COLS
        ))
        .bind(stripe_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn insert_mapping(
        &self,
        user_id: Uuid,
        stripe_customer_id: &str,
    ) -> AppResult<BillingCustomer> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO billing_customers (user_id, stripe_customer_id)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(stripe_customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_customer(&row))
    }

    async fn upsert_subscription_state(
        &self,
        stripe_customer_id: &str,
        update: &SubscriptionStateUpdate,
    ) -> AppResult<Option<BillingCustomer>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE billing_customers SET
                subscription_status = $2,
                stripe_subscription_id = COALESCE($3, stripe_subscription_id),
                current_period_end = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE stripe_customer_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(stripe_customer_id)
        .bind(update.status)
        .bind(&update.stripe_subscription_id)
        .bind(update.current_period_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn clear_subscription_state(
        &self,
        stripe_customer_id: &str,
    ) -> AppResult<Option<BillingCustomer>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE billing_customers SET
                subscription_status = 'canceled',
                stripe_subscription_id = NULL,
                current_period_end = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE stripe_customer_id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(stripe_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }
}
