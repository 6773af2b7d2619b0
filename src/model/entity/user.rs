use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: Uuid,
    email: String,
    cpf: Option<String>,
    #[serde(skip)]
    password_hash: Option<String>,
    full_name: String,
    birth_date: Option<NaiveDate>,
    role: String,
    is_active: bool,
    tina_client: bool,
    subscriber: bool,
    google_linked: bool,
    email_authenticated: bool,
    #[serde(skip)]
    email_auth_code: Option<String>,
    #[serde(skip)]
    email_auth_code_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserEntityCreateUpdate {
    pub email: String,
    pub cpf: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub tina_client: bool,
    pub google_linked: bool,
    pub role: String,
}

impl UserEntityCreateUpdate {
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role.to_string();
        self
    }
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn cpf(&self) -> Option<&str> {
        self.cpf.as_deref()
    }

    /// `None` for accounts created through Google sign-in.
    pub fn hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn tina_client(&self) -> bool {
        self.tina_client
    }

    pub fn subscriber(&self) -> bool {
        self.subscriber
    }

    pub fn google_linked(&self) -> bool {
        self.google_linked
    }

    pub fn email_authenticated(&self) -> bool {
        self.email_authenticated
    }

    pub fn email_auth_code(&self) -> Option<&str> {
        self.email_auth_code.as_deref()
    }

    pub fn email_auth_code_expires_at(&self) -> Option<DateTime<Utc>> {
        self.email_auth_code_expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state as an update payload, to be patched by the caller.
    pub fn to_update(&self) -> UserEntityCreateUpdate {
        UserEntityCreateUpdate {
            email: self.email.clone(),
            cpf: self.cpf.clone(),
            password_hash: self.password_hash.clone(),
            full_name: self.full_name.clone(),
            birth_date: self.birth_date,
            tina_client: self.tina_client,
            google_linked: self.google_linked,
            role: self.role.clone(),
        }
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, cpf, password_hash, full_name, birth_date, role, tina_client, google_linked, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.email)
        .bind(&data.cpf)
        .bind(&data.password_hash)
        .bind(&data.full_name)
        .bind(data.birth_date)
        .bind(&data.role)
        .bind(data.tina_client)
        .bind(data.google_linked)
        .bind(Utc::now())
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, cpf = ?, password_hash = ?, full_name = ?, birth_date = ?,
                tina_client = ?, google_linked = ?, role = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.email)
        .bind(&data.cpf)
        .bind(&data.password_hash)
        .bind(&data.full_name)
        .bind(data.birth_date)
        .bind(data.tina_client)
        .bind(data.google_linked)
        .bind(&data.role)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        if data.email != self.email {
            self.email_authenticated = false;
            sqlx::query("UPDATE users SET email_authenticated = 0 WHERE id = ?")
                .bind(self.id)
                .execute(mm.executor())
                .await?;
        }

        self.email = data.email;
        self.cpf = data.cpf;
        self.password_hash = data.password_hash;
        self.full_name = data.full_name;
        self.birth_date = data.birth_date;
        self.tina_client = data.tina_client;
        self.google_linked = data.google_linked;
        self.role = data.role;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_email(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_cpf(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        cpf: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE cpf = ?")
            .bind(cpf)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Brings a deactivated account back with fresh registration data.
    pub async fn reactivate(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let mut user = self.update(mm, actor, data).await?;
        user.set_active(mm, true).await?;
        Ok(user)
    }

    pub async fn set_active(&mut self, mm: &ModelManager, active: bool) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        self.is_active = active;
        Ok(())
    }

    pub async fn set_subscriber(&mut self, mm: &ModelManager, subscriber: bool) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET subscriber = ? WHERE id = ?")
            .bind(subscriber)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        self.subscriber = subscriber;
        Ok(())
    }

    pub async fn set_email_auth_code(
        &mut self,
        mm: &ModelManager,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET email_auth_code = ?, email_auth_code_expires_at = ? WHERE id = ?")
            .bind(code)
            .bind(expires_at)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        self.email_auth_code = Some(code.to_string());
        self.email_auth_code_expires_at = Some(expires_at);
        Ok(())
    }

    pub async fn mark_email_authenticated(&mut self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE users SET email_authenticated = 1, email_auth_code = NULL, email_auth_code_expires_at = NULL WHERE id = ?",
        )
        .bind(self.id)
        .execute(mm.executor())
        .await?;
        self.email_authenticated = true;
        self.email_auth_code = None;
        self.email_auth_code_expires_at = None;
        Ok(())
    }
}
