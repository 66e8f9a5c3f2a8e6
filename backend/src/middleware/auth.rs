//! Authentication middleware
//!
//! Verifies HS256 bearer tokens issued by the identity provider. The `sub`
//! claim is the record owner; the optional `org` claim grants access to
//! organization-shared collections.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::Scope;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub owner_id: String,
    pub organization_id: Option<Uuid>,
}

impl AuthUser {
    /// Store scope for this user's reads and writes
    pub fn scope(&self) -> Scope {
        Scope {
            organization_id: self.organization_id,
            ..Scope::owner(self.owner_id.clone())
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<Uuid>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => return unauthorized("Missing or invalid Authorization header").into_response(),
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    if claims.sub.trim().is_empty() {
        return unauthorized("Token has no subject").into_response();
    }

    request.extensions_mut().insert(AuthUser {
        owner_id: claims.sub,
        organization_id: claims.org,
    });

    next.run(request).await
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| unauthorized(&format!("Invalid token: {}", e)))
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized {
        message: message.to_string(),
        message_ja: "認証されていません".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: i64) -> String {
        let claims = Claims {
            sub: "owner-1".to_string(),
            org: None,
            exp,
            iat: 0,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = decode_jwt(&token("s3cret", exp), "s3cret").unwrap();
        assert_eq!(claims.sub, "owner-1");
        assert!(claims.org.is_none());
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let err = decode_jwt(&token("s3cret", exp), "other").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let exp = chrono::Utc::now().timestamp() - 3600;
        assert!(decode_jwt(&token("s3cret", exp), "s3cret").is_err());
    }
}
