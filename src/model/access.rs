use uuid::Uuid;

use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources that belong to exactly one user.
#[async_trait::async_trait]
pub trait HasOwner {
    async fn get_owner_id(&self, mm: &ModelManager, ctx: &AuthenticatedUser)
    -> DatabaseResult<Uuid>;
}

/// Admins pass unconditionally; everyone else must own the resource.
pub async fn check_access<T: HasOwner + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<()> {
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    if resource.get_owner_id(mm, ctx).await? == ctx.user_id() {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
