use serde::{Deserialize, Serialize};

/// A subscription plan as shown on the pricing page.
///
/// Plans are static configuration, never persisted per-user. The free tier
/// carries no Stripe identifiers and never reaches the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stripe_price_id: Option<String>,
    pub stripe_product_id: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Plan {
    pub fn is_free(&self) -> bool {
        self.stripe_price_id.is_none()
    }

    /// Display price, e.g. "$10" or "$12.50".
    pub fn price_display(&self) -> String {
        if self.price_cents % 100 == 0 {
            format!("${}", self.price_cents / 100)
        } else {
            format!("${}.{:02}", self.price_cents / 100, self.price_cents % 100)
        }
    }
}

/// Static plan catalog, loaded once at startup.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let plans: Vec<Plan> = serde_json::from_str(json)?;
        Ok(Self::new(plans))
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    pub fn by_id(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn by_stripe_price_id(&self, price_id: &str) -> Option<&Plan> {
        self.plans
            .iter()
            .find(|p| p.stripe_price_id.as_deref() == Some(price_id))
    }

    pub fn by_stripe_product_id(&self, product_id: &str) -> Option<&Plan> {
        self.plans
            .iter()
            .find(|p| p.stripe_product_id.as_deref() == Some(product_id))
    }

    /// Built-in catalog used when no PLAN_CATALOG_PATH is configured.
    pub fn default_plans() -> Self {
        Self::new(vec![
            Plan {
                id: "free".to_string(),
                name: "Free".to_string(),
                description: Some("A free plan to get you started!".to_string()),
                price_cents: 0,
                stripe_price_id: None,
                stripe_product_id: None,
                features: vec![
                    "MIT Licence".to_string(),
                    "Fast Performance".to_string(),
                    "Stripe Integration".to_string(),
                ],
            },
            Plan {
                id: "pro".to_string(),
                name: "Pro".to_string(),
                description: Some(
                    "Professional task management with advanced features".to_string(),
                ),
                price_cents: 1000,
                stripe_price_id: Some("price_1SSSZs32UtC6QOGWMF5FQ6mm".to_string()),
                stripe_product_id: Some("prod_TPH7wa68Si2kMf".to_string()),
                features: vec![
                    "Everything in Free".to_string(),
                    "Advanced task management".to_string(),
                    "Priority support".to_string(),
                ],
            },
            Plan {
                id: "enterprise".to_string(),
                name: "Enterprise".to_string(),
                description: Some("Full-featured task management for teams".to_string()),
                price_cents: 2500,
                stripe_price_id: Some("price_1SSSZw32UtC6QOGWF2Bo63Ys".to_string()),
                stripe_product_id: Some("prod_TPH7I7X2MxHUwO".to_string()),
                features: vec![
                    "Everything in Pro".to_string(),
                    "Team collaboration".to_string(),
                    "Advanced analytics".to_string(),
                ],
            },
        ])
    }
}
