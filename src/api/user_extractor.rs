use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::Json,
};
use log::debug;
use std::sync::Arc;

use crate::api::handlers::{ApiError, ErrorResponse};
use crate::auth::{current_identity, AuthError};
use crate::model::Identity;
use crate::store::Store;
use crate::App;

/// Resolves the caller from an `Authorization: Bearer <token>` header.
#[async_trait]
impl<S: Store> FromRequestParts<Arc<App<S>>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        app: &Arc<App<S>>,
    ) -> Result<Self, Self::Rejection> {
        let result = match bearer_token(&parts.headers) {
            Some(token) => current_identity(&app.store, &app.tokens, token).await,
            None => Err(AuthError::MissingToken),
        };
        result.map_err(auth_error)
    }
}

pub fn auth_error(err: AuthError) -> ApiError {
    let status = match &err {
        AuthError::Storage(cause) => {
            log::error!("Storage failure during authentication: {:#}", cause);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        other => {
            debug!("Rejected credentials: {}", other);
            StatusCode::UNAUTHORIZED
        }
    };
    (status, Json(ErrorResponse::new(&err.to_string())))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let (status, _) = auth_error(AuthError::MissingToken);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = auth_error(AuthError::Storage(anyhow::anyhow!("down")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
