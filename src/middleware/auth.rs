use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::caller::{Caller, CallerRole};
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    fn into_caller(self) -> Option<Caller> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        let role = self.role?.parse::<CallerRole>().ok()?;
        Some(Caller { id, role })
    }
}

fn bearer_token(req: &Request) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".into()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".into()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".into()))
}

/// Decodes the HS256 bearer token into a [`Caller`] request extension.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let caller = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    )
    .ok()
    .and_then(|data| data.claims.into_caller());

    match caller {
        Some(caller) => {
            tracing::debug!(caller_id = %caller.id, role = ?caller.role, "caller authenticated");
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        None => Error::Unauthorized("invalid_token".into()).into_response(),
    }
}
