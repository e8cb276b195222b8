//! Admin credential issuance and the per-request authorization gate.
//!
//! Tokens are HS256 JWTs signed with the shared secret from config. A
//! token whose `role` claim is present and not `"admin"` is rejected;
//! a token with no role claim at all is accepted as implicitly admin,
//! matching the credentials already in circulation.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::services::AdminActor;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

pub struct AdminAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    admin_email: String,
    admin_password_sha256: String,
}

impl AdminAuth {
    pub fn new(
        secret: &[u8],
        token_ttl: Duration,
        admin_email: String,
        admin_password_sha256: String,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_ttl,
            admin_email,
            admin_password_sha256: admin_password_sha256.to_lowercase(),
        }
    }

    pub fn verify_login(&self, email: &str, password: &str) -> Result<(), AppError> {
        let digest = hex::encode(Sha256::digest(password.as_bytes()));
        if email == self.admin_email && digest == self.admin_password_sha256 {
            Ok(())
        } else {
            Err(AppError::AuthInvalid("invalid email or password".into()))
        }
    }

    pub fn issue_token(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            email: Some(email.to_string()),
            role: Some("admin".to_string()),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Decodes and authorizes a bearer token, yielding the admin actor
    /// identity recorded against verification events.
    pub fn authorize(&self, token: &str) -> Result<AdminActor, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| AppError::AuthInvalid(describe_jwt_error(&err)))?;

        if let Some(role) = &data.claims.role {
            if role != "admin" {
                return Err(AppError::Forbidden(format!(
                    "role '{}' may not perform admin operations",
                    role
                )));
            }
        }

        Ok(AdminActor {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

fn describe_jwt_error(err: &jsonwebtoken::errors::Error) -> String {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => "token expired".to_string(),
        _ => "invalid token".to_string(),
    }
}

/// Extracts the bearer token from the Authorization header.
fn bearer_token(req: &Request) -> Result<&str, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthRequired("missing Authorization header".into()))?;

    let mut parts = header.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("Bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AppError::AuthRequired("empty bearer token".into()))
            } else {
                Ok(token)
            }
        }
        _ => Err(AppError::AuthRequired(
            "Authorization header is not a bearer credential".into(),
        )),
    }
}

/// Gate applied to every admin route. On success the decoded identity is
/// made available to the handler via request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;
    let admin = state.auth.authorize(token)?;
    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
