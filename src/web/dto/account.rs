use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::entity::{Plan, Subscription};

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AccountUpdateBody {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<String>,
    pub tina_client: Option<bool>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub check_new_password: Option<String>,
    #[serde(default)]
    pub keep_logged_in: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DeactivateBody {
    pub confirm: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub plan: Option<Plan>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            plan: sub.plan(),
            starts_at: sub.starts_at(),
            ends_at: sub.ends_at(),
        }
    }
}
