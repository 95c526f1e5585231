use tracing::{info, warn};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo::{User, UserChanges},
};
use crate::{
    auth::guard::{self, Identity},
    config::AdminSeed,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub async fn register(state: &AppState, req: CreateUserRequest) -> ApiResult<User> {
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = state.credentials.hash(req.password).await?;
    // a concurrent insert of the same email still trips the unique index (409)
    let user = User::create(&state.db, &req.first_name, &req.last_name, &req.email, &hash).await?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok(user)
}

pub async fn get(state: &AppState, id: i64) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User with ID {id} not found")))
}

pub async fn update(
    state: &AppState,
    actor: &Identity,
    id: i64,
    req: UpdateUserRequest,
) -> ApiResult<User> {
    req.validate()?;
    let unchanged = req.is_empty();

    // no connection is held while argon2 runs
    let password_hash = match req.password {
        Some(plain) => Some(state.credentials.hash(plain).await?),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let current = User::lock_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User with ID {id} not found")))?;

    guard::ensure(
        guard::can_modify_user(actor, current.id),
        "You don't have permission to edit this user",
    )?;
    if req.role.is_some() {
        guard::ensure(guard::can_change_role(actor), "Only admins can change roles")?;
    }

    if unchanged {
        return Ok(current);
    }

    if let Some(email) = req.email.as_deref() {
        if email != current.email && User::email_taken_by_other(&mut tx, email, id).await? {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
    }

    let changes = UserChanges {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        password_hash,
        role: req.role,
    };
    let user = User::apply(&mut tx, id, changes).await?;
    tx.commit().await?;

    info!(user_id = id, actor_id = actor.id, "user updated");
    Ok(user)
}

pub async fn delete(state: &AppState, actor: &Identity, id: i64) -> ApiResult<()> {
    let mut tx = state.db.begin().await?;
    let current = User::lock_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    guard::ensure(
        guard::can_delete_user(actor, current.id),
        "You can only delete your own account",
    )?;

    User::delete(&mut tx, id).await?;
    tx.commit().await?;

    info!(user_id = id, actor_id = actor.id, "user deleted");
    Ok(())
}

/// Create or promote the configured administrator.
pub async fn seed_admin(state: &AppState, seed: &AdminSeed) -> anyhow::Result<User> {
    let hash = state.credentials.hash(seed.password.clone()).await?;
    let user = User::upsert_admin(&state.db, &seed.email, &hash).await?;
    info!(user_id = user.id, email = %user.email, "admin account ready");
    Ok(user)
}
