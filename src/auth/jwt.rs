use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::models::User;

/// Claims carried by an issued bearer token. `iss` and `exp` are the
/// authoritative issuer and expiry; the embedded `data` claim carries only
/// the session token the caller is bound to.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub data: SessionClaim,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaim {
    pub username: String,
    pub token: String,
}

/// Issues and verifies signed bearer tokens. The signing key is injected
/// from configuration at construction; the token is only a pointer to the
/// session record, not an authority on its own.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, user: &User, session_token: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: user.id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            data: SessionClaim {
                username: user.username.clone(),
                token: session_token.to_string(),
            },
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {}", e)))
    }

    /// Signature, structure and expiry failures all collapse into the same
    /// coarse error; callers must not learn which check rejected the token.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}
