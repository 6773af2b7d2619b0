use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CheckoutLinks {
    pub link_monthly: String,
    pub link_annual: String,
    pub link_lifetime: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PaymentDoneQuery {
    pub plan: Option<String>,
    pub payment_id: Option<String>,
}
