//! Contact form handlers. Submission is public and additionally throttled
//! per ip+email; the admin surfaces read and flag messages.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use rusqlite::{Row, params};

use quill_core::domain::ContactMessage;
use quill_core::pagination::PageMeta;
use quill_shared::dto::{ContactRequest, MessageData};
use quill_shared::{Envelope, Paginated};

use super::PageQuery;
use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimiters;
use crate::state::AppState;

/// POST /api/contact - anonymous submission. The rate key combines the
/// client address with the submitted email so one address cannot spam
/// many inboxes (checked here because the body is not yet read when the
/// scope middleware runs).
pub async fn submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    limits: web::Data<RateLimiters>,
    body: web::Json<ContactRequest>,
) -> AppResult<HttpResponse> {
    let data = body.into_inner();

    if limits.enabled {
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        match limits.contact.check(&format!("{ip}:{}", data.email)) {
            Ok(decision) if !decision.allowed => {
                return Err(AppError::RateLimited {
                    retry_after_secs: decision.retry_after.as_secs().max(1),
                });
            }
            Ok(_) => {}
            Err(_) => tracing::error!("contact rate limiter failure, failing open"),
        }
    }

    data.validate()?;

    state.store.execute(
        "INSERT INTO contact_messages (name, email, subject, message, created_at)
         VALUES (?, ?, ?, ?, ?)",
        params![data.name, data.email, data.subject, data.message, Utc::now()],
    )?;

    Ok(HttpResponse::Created().json(Envelope::new(MessageData::new("Message sent successfully"))))
}

/// GET /api/contact - admin, paginated, newest first.
pub async fn list(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let params = query.params();
    let total: i64 = state
        .store
        .query_one("SELECT COUNT(*) AS total FROM contact_messages", [], |row| {
            row.get(0)
        })?
        .unwrap_or(0);

    let messages = state.store.query(
        "SELECT * FROM contact_messages ORDER BY created_at DESC LIMIT ? OFFSET ?",
        params![params.limit, params.offset()],
        map_message,
    )?;

    Ok(HttpResponse::Ok().json(Paginated::new(messages, PageMeta::new(total, params))))
}

/// PATCH /api/contact/{id}/read - admin.
pub async fn mark_read(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let result = state.store.execute(
        "UPDATE contact_messages SET is_read = 1 WHERE id = ?",
        params![path.into_inner()],
    )?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Message not found"));
    }
    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new("Marked as read"))))
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        subject: row.get("subject")?,
        message: row.get("message")?,
        is_read: row.get("is_read")?,
        created_at: row.get("created_at")?,
    })
}
