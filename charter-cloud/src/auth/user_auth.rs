//! User JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::UserRole;

use crate::state::AppState;

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// `participant` | `captain` | `admin`
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user extracted from the JWT
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_captain(&self) -> Result<(), AppError> {
        if self.role.can_captain() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::CaptainRequired))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::AdminRequired))
        }
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for a user
pub fn create_token(
    user_id: i64,
    email: &str,
    role: UserRole,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.as_db().to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and check a bearer token
pub fn verify_token(token: &str, secret: &str) -> Result<UserIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    let claims = token_data.claims;
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid subject"))?;
    let role = UserRole::from_db(&claims.role)
        .ok_or_else(|| AppError::invalid_token("Invalid role"))?;

    Ok(UserIdentity {
        user_id,
        email: claims.email,
        role,
    })
}

/// Middleware that extracts and verifies the user JWT from the Authorization header
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))?;

    let identity = verify_token(token, &state.jwt_secret)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip() {
        let token = create_token(42, "cap@example.com", UserRole::Captain, SECRET).unwrap();
        let identity = verify_token(&token, SECRET).unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.role, UserRole::Captain);
        assert!(identity.require_captain().is_ok());
        assert_eq!(
            identity.require_admin().unwrap_err().code,
            ErrorCode::AdminRequired
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(1, "a@example.com", UserRole::Participant, SECRET).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token() {
        let claims = UserClaims {
            sub: "1".into(),
            email: "a@example.com".into(),
            role: "participant".into(),
            exp: 1_000,
            iat: 0,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            verify_token(&token, SECRET).unwrap_err().code,
            ErrorCode::TokenExpired
        );
    }

    #[test]
    fn participant_is_not_captain() {
        let identity = UserIdentity {
            user_id: 1,
            email: "p@example.com".into(),
            role: UserRole::Participant,
        };
        assert_eq!(
            identity.require_captain().unwrap_err().code,
            ErrorCode::CaptainRequired
        );
    }
}
