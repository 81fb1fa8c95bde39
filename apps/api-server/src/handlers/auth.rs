//! Authentication handlers.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use rusqlite::{Row, params};

use quill_core::domain::{Role, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_shared::Envelope;
use quill_shared::dto::{AuthData, LoginRequest, PublicUser, RegisterRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let existing = state.store.query_one(
        "SELECT id FROM users WHERE email = ?",
        params![req.email],
        |row| row.get::<_, i64>(0),
    )?;
    if existing.is_some() {
        return Err(AppError::Conflict {
            code: "EMAIL_EXISTS",
            message: "Email already registered",
        });
    }

    let hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let now = Utc::now();
    let result = state.store.execute(
        "INSERT INTO users (email, password_hash, display_name, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        params![req.email, hash, req.display_name, now, now],
    )?;

    let user = fetch_user(&state, result.inserted_id)?
        .ok_or_else(|| AppError::Internal("user row missing after insert".to_string()))?;
    let token = token_service
        .sign(user.id, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(Envelope::new(AuthData {
        user: user.into(),
        token,
    })))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password return the same INVALID_CREDENTIALS
/// condition; a banned account fails with BANNED even when the password
/// is correct.
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let user = state
        .store
        .query_one(
            "SELECT * FROM users WHERE email = ?",
            params![req.email],
            map_user,
        )?
        .ok_or(AppError::InvalidCredentials)?;

    if user.is_banned {
        return Err(AppError::Banned);
    }

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = token_service
        .sign(user.id, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(Envelope::new(AuthData {
        user: user.into(),
        token,
    })))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = fetch_user(&state, identity.user_id)?.ok_or(AppError::NotFound("User not found"))?;
    Ok(HttpResponse::Ok().json(Envelope::new(PublicUser::from(user))))
}

fn fetch_user(state: &AppState, id: i64) -> Result<Option<User>, AppError> {
    state
        .store
        .query_one("SELECT * FROM users WHERE id = ?", params![id], map_user)
        .map_err(Into::into)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        display_name: row.get("display_name")?,
        role: Role::parse(&role).unwrap_or(Role::User),
        avatar_url: row.get("avatar_url")?,
        bio: row.get("bio")?,
        is_banned: row.get("is_banned")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
