use std::fmt;
use std::str::FromStr;

use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
    Lifetime,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Self::Monthly, Self::Annual, Self::Lifetime];

    /// `None` for plans that never expire.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Monthly => Some(Duration::days(31)),
            Self::Annual => Some(Duration::days(365)),
            Self::Lifetime => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
            Self::Lifetime => "lifetime",
        };
        f.write_str(s)
    }
}

impl FromStr for Plan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "annual" => Ok(Self::Annual),
            "lifetime" => Ok(Self::Lifetime),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Subscription {
    id: Uuid,
    user_id: Uuid,
    plan: String,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    payment_id: Option<String>,
}

impl ResourceTyped for Subscription {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Subscription
    }
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn plan(&self) -> Option<Plan> {
        self.plan.parse().ok()
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.is_some_and(|end| end <= now)
    }

    pub async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        plan: Plan,
        payment_id: Option<&str>,
    ) -> DatabaseResult<Self> {
        let starts_at = Utc::now();
        let ends_at = plan.duration().map(|d| starts_at + d);

        let created = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (id, user_id, plan, starts_at, ends_at, payment_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.to_string())
        .bind(starts_at)
        .bind(ends_at)
        .bind(payment_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(created)
    }

    /// The subscription that runs the longest: a lifetime plan, otherwise the
    /// latest `ends_at`. When that one has expired, every other one has too.
    pub async fn longest_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE user_id = ?
            ORDER BY ends_at IS NULL DESC, ends_at DESC, starts_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn find_by_payment_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        payment_id: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM subscriptions WHERE payment_id = ?")
            .bind(payment_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Subscription {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.user_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plan_names() {
        for plan in Plan::ALL {
            assert_eq!(plan.to_string().parse::<Plan>(), Ok(plan));
        }
        assert!("weekly".parse::<Plan>().is_err());
    }

    #[test]
    fn plan_durations() {
        assert_eq!(Plan::Monthly.duration(), Some(Duration::days(31)));
        assert_eq!(Plan::Annual.duration(), Some(Duration::days(365)));
        assert_eq!(Plan::Lifetime.duration(), None);
    }

    #[test]
    fn lifetime_never_expires() {
        let sub = Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: "lifetime".into(),
            starts_at: Utc::now(),
            ends_at: None,
            payment_id: None,
        };
        assert!(!sub.is_expired_at(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn monthly_expires_after_end() {
        let start = Utc::now();
        let sub = Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: "monthly".into(),
            starts_at: start,
            ends_at: Some(start + Duration::days(31)),
            payment_id: Some("123".into()),
        };
        assert!(!sub.is_expired_at(start + Duration::days(30)));
        assert!(sub.is_expired_at(start + Duration::days(32)));
    }
}
