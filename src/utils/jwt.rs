use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::{Claims, RefreshClaims};
use crate::utils::errors::AppError;

pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: now + jwt_config.access_token_expiry as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn create_refresh_token(user_id: Uuid, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        exp: now + jwt_config.refresh_token_expiry as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
    )
    .map_err(AppError::internal)
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::unauthorized("TOKEN_EXPIRED", "Token expired"),
        _ => AppError::unauthorized("INVALID_TOKEN", "Invalid token"),
    })
}

pub fn verify_refresh_token(token: &str, jwt_config: &JwtConfig) -> Result<RefreshClaims, AppError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            AppError::unauthorized("REFRESH_TOKEN_EXPIRED", "Refresh token expired")
        }
        _ => AppError::unauthorized("INVALID_REFRESH_TOKEN", "Invalid refresh token"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604_800,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let cfg = config();
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "a@b.co", &cfg).unwrap();
        let claims = verify_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@b.co");
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let cfg = config();
        let user_id = Uuid::new_v4();
        let token = create_refresh_token(user_id, &cfg).unwrap();
        let claims = verify_refresh_token(&token, &cfg).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        // Signed with a different secret, so verification must fail.
        let cfg = config();
        let token = create_access_token(Uuid::new_v4(), "a@b.co", &cfg).unwrap();
        let err = verify_refresh_token(&token, &cfg).unwrap_err();
        assert_eq!(err.code, "INVALID_REFRESH_TOKEN");
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let err = verify_token("not-a-jwt", &config()).unwrap_err();
        assert_eq!(err.code, "INVALID_TOKEN");
    }
}
