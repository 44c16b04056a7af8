//! JWT token generation and validation
//!
//! Access and refresh tokens are HS256-signed JWTs. Each kind has its own
//! secret, so a token of one kind can never verify as the other.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    crypto, decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenSecrets;

/// The only signing algorithm issued or accepted
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("Unknown token kind: {0}")]
    UnknownTokenKind(String),

    #[error("Unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Expected {expected} token, got {found} token")]
    KindMismatch { expected: TokenKind, found: TokenKind },

    #[error("Token signing failed: {0}")]
    SigningFailed(String),
}

/// Token kind; selects the signing secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            other => Err(JwtError::UnknownTokenKind(other.to_string())),
        }
    }
}

impl TryFrom<u8> for TokenKind {
    type Error = JwtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TokenKind::Access),
            1 => Ok(TokenKind::Refresh),
            other => Err(JwtError::UnknownTokenKind(other.to_string())),
        }
    }
}

/// JWT claims carried by both token kinds
///
/// Every field is required when decoding; a payload missing any of them is
/// rejected rather than partially populated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Account username
    pub username: String,
    /// Account email (login identity)
    pub email: String,
    /// Token kind
    pub kind: TokenKind,
    /// JWT ID, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Issues and validates signed tokens
pub trait TokenManager: Send + Sync {
    /// Sign a token for `kind` that expires `ttl` from now.
    fn create_token(
        &self,
        username: &str,
        email: &str,
        ttl: Duration,
        kind: TokenKind,
    ) -> Result<String, JwtError>;

    /// Verify `token` under the secret for `kind` and return its claims.
    fn parse_token(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError>;
}

/// HMAC-SHA256 token manager holding one key pair per token kind
pub struct JwtTokenManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtTokenManager {
    pub fn new(secrets: &TokenSecrets) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(secrets.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(secrets.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(secrets.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(secrets.refresh_secret.as_bytes()),
        }
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }

    /// Classify a token whose header does not decode. If it is still shaped
    /// like a JWT, the signature decides: a token that was altered after
    /// signing reports a bad signature, not a parse failure.
    fn unreadable_header(
        &self,
        token: &str,
        kind: TokenKind,
        err: jsonwebtoken::errors::Error,
    ) -> JwtError {
        let mut segments = token.rsplitn(2, '.');
        let (Some(signature), Some(message)) = (segments.next(), segments.next()) else {
            return JwtError::MalformedToken(err.to_string());
        };
        if message.matches('.').count() != 1 {
            return JwtError::MalformedToken(err.to_string());
        }

        match crypto::verify(
            signature,
            message.as_bytes(),
            self.decoding_key(kind),
            SIGNING_ALGORITHM,
        ) {
            Ok(false) => JwtError::InvalidSignature,
            _ => JwtError::MalformedToken(err.to_string()),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

impl fmt::Debug for JwtTokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenManager").finish_non_exhaustive()
    }
}

impl TokenManager for JwtTokenManager {
    fn create_token(
        &self,
        username: &str,
        email: &str,
        ttl: Duration,
        kind: TokenKind,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::SigningFailed(format!("lifetime of {}s is out of range", ttl.num_seconds()))
        })?;

        let claims = Claims {
            username: username.to_string(),
            email: email.to_string(),
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            self.encoding_key(kind),
        )
        .map_err(|e| JwtError::SigningFailed(e.to_string()))
    }

    fn parse_token(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        // Reject foreign algorithms before any key material is involved
        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => return Err(self.unreadable_header(token, kind, e)),
        };
        if header.alg != SIGNING_ALGORITHM {
            return Err(JwtError::UnexpectedSigningMethod(format!("{:?}", header.alg)));
        }

        let token_data = decode::<Claims>(token, self.decoding_key(kind), &Self::validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidAlgorithm => {
                    JwtError::UnexpectedSigningMethod(format!("{:?}", header.alg))
                }
                _ => JwtError::MalformedToken(e.to_string()),
            })?;

        let claims = token_data.claims;
        if claims.kind != kind {
            return Err(JwtError::KindMismatch {
                expected: kind,
                found: claims.kind,
            });
        }

        Ok(claims)
    }
}
