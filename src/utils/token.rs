use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

/// Claims of the session token kept in the `access_token` cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Sign a session token for `user_id`, valid for `expires_in_seconds`
pub fn create_token(
    user_id: i64,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(expires_in_seconds)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Verify signature and expiry, returning the user id the token was issued for
pub fn decode_token(token: impl AsRef<str>, secret: &[u8]) -> Result<i64, HttpError> {
    let invalid = || HttpError::unauthorized(ErrorMessage::InvalidToken.to_string());

    let data = decode::<TokenClaims>(
        token.as_ref(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| invalid())?;

    data.claims.sub.parse::<i64>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn token_carries_user_id() {
        let token = create_token(42, SECRET, 60).unwrap();
        assert_eq!(decode_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(42, SECRET, 60).unwrap();
        assert!(decode_token(&token, b"other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway of the validator.
        let token = create_token(42, SECRET, -120).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_token("not.a.token", SECRET).is_err());
    }
}
