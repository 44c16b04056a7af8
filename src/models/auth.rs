//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auth::TokenPair;

/// Registration request body
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1), custom = "within_bcrypt_limit")]
    pub password: String,
}

/// bcrypt only looks at the first 72 bytes of its input
fn within_bcrypt_limit(password: &str) -> Result<(), ValidationError> {
    if password.len() > 72 {
        return Err(ValidationError::new("password_too_long"));
    }
    Ok(())
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair response for login and refresh
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPairResponse {
    pub fn new(message: impl Into<String>, tokens: TokenPair) -> Self {
        Self {
            message: message.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            username: "a".to_string(),
            email: "a@x.com".to_string(),
            password: "pw123".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..ok
        };
        assert!(bad_email.validate().is_err());

        let long_password = RegisterRequest {
            username: "a".to_string(),
            email: "a@x.com".to_string(),
            password: "x".repeat(73),
        };
        assert!(long_password.validate().is_err());

        // 37 characters, 74 bytes
        let multibyte_password = RegisterRequest {
            username: "a".to_string(),
            email: "a@x.com".to_string(),
            password: "é".repeat(37),
        };
        assert!(multibyte_password.validate().is_err());
    }

    #[test]
    fn test_token_pair_response_is_camel_case() {
        let body = TokenPairResponse::new(
            "success login",
            TokenPair {
                access_token: "acc".to_string(),
                refresh_token: "ref".to_string(),
            },
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["message"], "success login");
        assert_eq!(json["accessToken"], "acc");
        assert_eq!(json["refreshToken"], "ref");
    }
}
