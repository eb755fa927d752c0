use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Form, Json as RequestJson,
};
use log::info;

use crate::api::handlers::{hash_users, service_error, ApiResult, AppState, ErrorResponse};
use crate::api::user_extractor::auth_error;
use crate::auth::{authenticate, AuthError};
use crate::logic::{ServiceError, UserOperations};
use crate::model::{Identity, LoginForm, TokenResponse, User, UserCreate};
use crate::store::Store;

/// Registers a single user and returns it.
pub async fn register<S: Store>(
    State(app): State<AppState<S>>,
    RequestJson(user): RequestJson<UserCreate>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let users = hash_users(&app, vec![user])?;
    let mut created = UserOperations::create(&app.store, users)
        .await
        .map_err(service_error)?;
    let user = created
        .pop()
        .ok_or_else(|| service_error(ServiceError::Storage(anyhow::anyhow!("user not returned"))))?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// OAuth2 password grant: `username` carries the phone number.
pub async fn issue_token<S: Store>(
    State(app): State<AppState<S>>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let identity = authenticate(&app.store, app.hasher.as_ref(), &form.username, &form.password)
        .await
        .map_err(|e| auth_error(AuthError::Storage(e)))?;
    let Some(identity) = identity else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("incorrect phone number or password")),
        ));
    };

    let token = app
        .tokens
        .issue(&identity.phone_number)
        .map_err(auth_error)?;
    Ok(Json(TokenResponse::bearer(token)))
}

pub async fn current_user(identity: Identity) -> Json<Identity> {
    Json(identity)
}
