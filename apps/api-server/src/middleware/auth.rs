//! Authentication extractors - the two-stage authenticate/admin-only
//! gate, plus an optional variant that never fails.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use quill_core::domain::Role;
use quill_core::ports::{TokenClaims, TokenService};

use super::error::AppError;

/// Authenticated caller, decoded from the bearer credential.
///
/// Use as a handler argument to require authentication:
/// ```ignore
/// async fn me(identity: Identity) -> impl Responder { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Admin gate layered on `Identity`: authenticate first, then require the
/// admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|identity| {
            if identity.role.is_admin() {
                Ok(AdminIdentity(identity))
            } else {
                Err(AppError::Forbidden("Admin access required"))
            }
        }))
    }
}

/// Attaches the caller's identity when a valid credential is present;
/// never fails the request.
#[derive(Debug, Clone, Copy)]
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let Some(service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService missing from app data");
        return Err(AppError::Internal("token service not configured".to_string()));
    };

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    service
        .verify(token)
        .map(Identity::from)
        .map_err(|_| AppError::InvalidToken)
}
