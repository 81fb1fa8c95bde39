//! JWT credential service (HS256).

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use quill_core::domain::Role;
use quill_core::ports::{AuthError, TokenClaims, TokenService};

/// JWT configuration. Tokens expire after a fixed seven days.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_days: i64,
}

impl JwtConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_days: 7,
        }
    }
}

/// Wire shape of the signed payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    role: Role,
    iat: i64,
    exp: i64,
}

/// HMAC-signed bearer credentials carrying `{userId, role}`.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn sign(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + TimeDelta::days(self.config.expiration_days)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(TokenClaims {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_days: 7,
        })
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let service = service();
        let token = service.sign(42, Role::Admin).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let result = service().verify("not-a-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "different-secret".to_string(),
            expiration_days: 7,
        });
        let token = other.sign(1, Role::User).unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_days: -1,
        });
        let token = service.sign(1, Role::User).unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
