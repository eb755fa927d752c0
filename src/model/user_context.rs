use serde::{Deserialize, Serialize};

use crate::model::Id;

/// Authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Id,
    pub phone_number: String,
    pub username: Option<String>,
    pub role: Option<String>,
}

/// Body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// OAuth2 password-grant form; `username` carries the phone number.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
