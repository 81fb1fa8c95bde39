//! Admin user management.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use rusqlite::{Row, params};

use quill_core::domain::Role;
use quill_core::pagination::PageMeta;
use quill_shared::dto::{MessageData, PublicUser, UpdateBanRequest, UpdateRoleRequest};
use quill_shared::{Envelope, Paginated};

use super::PageQuery;
use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/admin/users - paginated, newest first, never exposing the
/// password hash.
pub async fn list(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let params = query.params();
    let total: i64 = state
        .store
        .query_one("SELECT COUNT(*) AS total FROM users", [], |row| row.get(0))?
        .unwrap_or(0);

    let users = state.store.query(
        "SELECT id, email, display_name, role, avatar_url, bio, is_banned, created_at, updated_at
         FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        params![params.limit, params.offset()],
        map_public_user,
    )?;

    Ok(HttpResponse::Ok().json(Paginated::new(users, PageMeta::new(total, params))))
}

/// PATCH /api/admin/users/{id}/role
pub async fn update_role(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
    body: web::Json<UpdateRoleRequest>,
) -> AppResult<HttpResponse> {
    let Some(role) = Role::parse(&body.role) else {
        return Err(AppError::BadRequest {
            code: "INVALID_ROLE",
            message: "Invalid role",
        });
    };

    let result = state.store.execute(
        "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
        params![role.as_str(), Utc::now(), path.into_inner()],
    )?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new("Role updated"))))
}

/// PATCH /api/admin/users/{id}/ban
pub async fn update_ban(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
    body: web::Json<UpdateBanRequest>,
) -> AppResult<HttpResponse> {
    let result = state.store.execute(
        "UPDATE users SET is_banned = ?, updated_at = ? WHERE id = ?",
        params![body.is_banned, Utc::now(), path.into_inner()],
    )?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found"));
    }

    let message = if body.is_banned {
        "User banned"
    } else {
        "User unbanned"
    };
    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new(message))))
}

fn map_public_user(row: &Row<'_>) -> rusqlite::Result<PublicUser> {
    let role: String = row.get("role")?;
    Ok(PublicUser {
        id: row.get("id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role: Role::parse(&role).unwrap_or(Role::User),
        avatar_url: row.get("avatar_url")?,
        bio: row.get("bio")?,
        is_banned: row.get("is_banned")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
