use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::settings::AuthConfig;
use crate::helpers::time::now_i64;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user's email
    pub sub: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub wholename: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id, the revocation key
    pub jti: String,
}

/// Who a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub claims: Claims,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token is unauthorized")]
    SignatureInvalid,
    #[error("token is expired")]
    Expired,
}

impl VerificationError {
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::Malformed => "malformed",
            VerificationError::SignatureInvalid => "signature_invalid",
            VerificationError::Expired => "expired",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct IssueError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies HS256 session tokens.
///
/// Keys are derived once from the configured secret and never change for the
/// lifetime of the process.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(
            auth.token_secret.as_bytes(),
            Duration::from_secs(auth.token_lifetime_seconds),
        )
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a fresh token for `identity`. The `jti` is a v4 UUID drawn from the
    /// OS random source, so one revocation can never hit another session.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, IssueError> {
        let iat = now_i64();
        let claims = Claims {
            sub: identity.email.clone(),
            email: identity.email.clone(),
            firstname: identity.firstname.clone(),
            lastname: identity.lastname.clone(),
            wholename: format!("{} {}", identity.firstname, identity.lastname),
            iat,
            exp: iat + self.lifetime.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        let raw = encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)?;
        Ok(IssuedToken { raw, claims })
    }

    /// Check signature first, then expiry, then hand out the claims.
    pub fn verify(&self, raw: &str) -> Result<Claims, VerificationError> {
        decode::<Claims>(raw, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerificationError::SignatureInvalid
                }
                _ => VerificationError::Malformed,
            })
    }
}
