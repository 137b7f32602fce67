pub mod credentials;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use crates::domain::repositories::{revocations::RevocationRepository, users::UserRepository};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// An authenticated caller whose stored admin flag was checked on this request.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid Authorization header format")]
    MalformedHeader,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token revoked")]
    Revoked,
    #[error("Admin access required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => AppError::Forbidden(err.to_string()),
            AuthError::Internal(inner) => AppError::Internal(inner),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Issues, verifies and revokes bearer tokens. Shared with handlers as an axum extension.
pub struct AccessControl {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    revocations: Arc<dyn RevocationRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl AccessControl {
    pub fn new(
        jwt_secret: &str,
        token_ttl_hours: i64,
        revocations: Arc<dyn RevocationRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl: Duration::hours(token_ttl_hours),
            revocations,
            users,
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to sign token: {err}")))
    }

    /// Checks signature, expiry and the revocation store.
    pub async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| {
                info!(reason = %err, "auth: token rejected");
                AuthError::InvalidToken
            })?
            .claims;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        let revoked = self.revocations.is_revoked(&claims.jti).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "auth: failed to check revocation store");
            AuthError::Internal(err)
        })?;
        if revoked {
            warn!(%user_id, jti = %claims.jti, "auth: revoked token presented");
            return Err(AuthError::Revoked);
        }

        Ok(AuthUser {
            user_id,
            jti: claims.jti,
            expires_at,
        })
    }

    pub async fn revoke(&self, user: &AuthUser) -> Result<(), AuthError> {
        self.revocations
            .revoke(&user.jti, user.expires_at)
            .await
            .map_err(|err| {
                error!(user_id = %user.user_id, db_error = ?err, "auth: failed to revoke token");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.user_id, "auth: token revoked");
        Ok(())
    }

    /// Reads the admin flag from storage on every call.
    pub async fn require_admin(&self, user_id: Uuid) -> Result<(), AuthError> {
        let is_admin = self.users.is_admin(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "auth: failed to load admin flag");
            AuthError::Internal(err)
        })?;

        match is_admin {
            Some(true) => Ok(()),
            _ => {
                warn!(%user_id, "auth: admin access denied");
                Err(AuthError::Forbidden)
            }
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MalformedHeader),
    }
}

fn access_control(parts: &Parts) -> Result<Arc<AccessControl>, AppError> {
    parts
        .extensions
        .get::<Arc<AccessControl>>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("access control extension is missing")))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let access_control = access_control(parts)?;
        let token = bearer_token(&parts.headers)?;

        Ok(access_control.verify(token).await?)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        access_control(parts)?.require_admin(user.user_id).await?;

        Ok(AdminUser(user))
    }
}
