//! Credential hashing and bearer tokens. The core only ever sees hashed
//! passwords and resolved [`Identity`] values.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{CatalogKind, CatalogLookup, Identity, PersonLookup, User};
use crate::store::{Session, Store};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject no longer exists")]
    UnknownSubject,
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Storage(err)
    }
}

/// Turns a plain credential into stored material and checks it later.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, credential: &str) -> anyhow::Result<String>;
    fn verify(&self, credential: &str, stored: &str) -> bool;
}

/// Argon2id, stored as a PHC string (`$argon2id$v=19$m=...$salt$hash`).
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Cheaper parameters than the default, mostly for tests.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {}", e))?;
        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, credential: &str) -> anyhow::Result<String> {
        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|e| anyhow::anyhow!("failed to encode salt: {}", e))?;
        let hash = self
            .argon2
            .hash_password(credential.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash credential: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, credential: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(credential.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                debug!("Stored credential is not a PHC string: {}", e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues and checks HS256 tokens whose subject is the caller's phone.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, phone_number: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: phone_number.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Returns the phone number the token was issued for.
    pub fn subject(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims.sub)
    }
}

async fn identity_of<Sn: Session>(session: &mut Sn, user: User) -> anyhow::Result<Identity> {
    let role = match user.role_id {
        Some(role_id) => session
            .find_catalog(CatalogKind::Role, &CatalogLookup::Id(role_id))
            .await?
            .map(|(_, name)| name),
        None => None,
    };
    Ok(Identity {
        user_id: user.id,
        phone_number: user.phone_number,
        username: user.username,
        role,
    })
}

/// Checks a phone/credential pair. `None` when the user is unknown or the
/// credential does not match.
pub async fn authenticate<S: Store>(
    store: &S,
    hasher: &dyn CredentialHasher,
    phone_number: &str,
    credential: &str,
) -> anyhow::Result<Option<Identity>> {
    let mut session = store.begin().await?;
    let Some(user) = session
        .find_user(&PersonLookup::Phone(phone_number.to_string()))
        .await?
    else {
        debug!("Login for unknown phone {}", phone_number);
        return Ok(None);
    };
    if !hasher.verify(credential, &user.password) {
        debug!("Login with wrong credential for user {}", user.id);
        return Ok(None);
    }
    Ok(Some(identity_of(&mut session, user).await?))
}

pub async fn current_identity<S: Store>(
    store: &S,
    tokens: &TokenService,
    token: &str,
) -> Result<Identity, AuthError> {
    let phone_number = tokens.subject(token)?;
    let mut session = store.begin().await?;
    let user = session
        .find_user(&PersonLookup::Phone(phone_number))
        .await?
        .ok_or(AuthError::UnknownSubject)?;
    Ok(identity_of(&mut session, user).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::UserOperations;
    use crate::model::{NewUser, DEFAULT_USER_ROLE};
    use crate::store::MemoryStore;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let hasher = hasher();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &first));
        assert!(!hasher.verify("Secret", &first));
        assert!(!hasher.verify("secret", "no-separator"));
    }

    #[test]
    fn default_cost_hashes_verify_with_any_cost() {
        let stored = Argon2Hasher::default().hash("secret").unwrap();
        assert!(hasher().verify("secret", &stored));
    }

    #[test]
    fn token_round_trips_subject() {
        let tokens = TokenService::new("test-secret", 5);
        let token = tokens.issue("8 (900) 000-00-01").unwrap();
        assert_eq!(tokens.subject(&token).unwrap(), "8 (900) 000-00-01");

        let other = TokenService::new("other-secret", 5);
        assert!(matches!(other.subject(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret", -10);
        let token = tokens.issue("8 (900) 000-00-01").unwrap();
        assert!(tokens.subject(&token).is_err());
    }

    #[tokio::test]
    async fn login_resolves_identity_with_role() {
        let store = MemoryStore::new();
        let hasher = hasher();
        UserOperations::create(
            &store,
            vec![NewUser {
                phone_number: "8 (900) 000-00-01".to_string(),
                username: Some("kate".to_string()),
                name: None,
                surname: None,
                birthday: None,
                password: hasher.hash("secret").unwrap(),
                role: None,
            }],
        )
        .await
        .unwrap();

        let identity = authenticate(&store, &hasher, "8 (900) 000-00-01", "secret")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.role.as_deref(), Some(DEFAULT_USER_ROLE));
        assert!(authenticate(&store, &hasher, "8 (900) 000-00-01", "wrong")
            .await
            .unwrap()
            .is_none());

        let tokens = TokenService::new("test-secret", 5);
        let token = tokens.issue(&identity.phone_number).unwrap();
        let current = current_identity(&store, &tokens, &token).await.unwrap();
        assert_eq!(current, identity);

        let stranger = tokens.issue("8 (000) 000-00-00").unwrap();
        assert!(matches!(
            current_identity(&store, &tokens, &stranger).await,
            Err(AuthError::UnknownSubject)
        ));
    }
}
