use tracing::{info, warn};

use super::{
    dto::{LoginRequest, LoginResponse},
    tokens,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo::User,
};

fn invalid_credentials() -> ApiError {
    ApiError::Unauthenticated("Invalid credentials".into())
}

/// Check the password and hand out a new token.
pub async fn login(state: &AppState, req: LoginRequest) -> ApiResult<LoginResponse> {
    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        state.credentials.verify_absent(req.password).await?;
        warn!(email = %req.email, "login unknown email");
        return Err(invalid_credentials());
    };

    let ok = state
        .credentials
        .verify(req.password, user.password_hash.clone())
        .await?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let token = tokens::issue(&state.db, user.id).await?;
    info!(user_id = user.id, "user logged in");

    Ok(LoginResponse {
        user_id: user.id,
        email: user.email,
        token: token.token,
    })
}
