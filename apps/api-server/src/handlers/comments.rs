//! Comment handlers. Creation requires a published parent post; deletion
//! is allowed for the owner or an admin.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use rusqlite::{Row, params};

use quill_core::domain::{Comment, Role};
use quill_shared::Envelope;
use quill_shared::dto::{CommentView, CreateCommentRequest, MessageData};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const COMMENT_SELECT: &str = "
  SELECT c.*, u.display_name AS user_name, u.avatar_url AS user_avatar, u.role AS user_role
  FROM comments c
  JOIN users u ON c.user_id = u.id";

/// GET /api/posts/{post_id}/comments - public, oldest first.
pub async fn list(state: web::Data<AppState>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let comments = state.store.query(
        &format!("{COMMENT_SELECT} WHERE c.post_id = ? ORDER BY c.created_at ASC"),
        params![path.into_inner()],
        map_comment_view,
    )?;
    Ok(HttpResponse::Ok().json(Envelope::new(comments)))
}

/// POST /api/posts/{post_id}/comments - authenticated; the parent post
/// must exist and be published.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    let post = state.store.query_one(
        "SELECT id FROM posts WHERE id = ? AND status = 'published'",
        params![post_id],
        |row| row.get::<_, i64>(0),
    )?;
    if post.is_none() {
        return Err(AppError::NotFound("Post not found"));
    }

    let now = Utc::now();
    let result = state.store.execute(
        "INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        params![post_id, identity.user_id, req.content, now, now],
    )?;

    let comment = state
        .store
        .query_one(
            &format!("{COMMENT_SELECT} WHERE c.id = ?"),
            params![result.inserted_id],
            map_comment_view,
        )?
        .ok_or_else(|| AppError::Internal("comment row missing after insert".to_string()))?;

    Ok(HttpResponse::Created().json(Envelope::new(comment)))
}

/// DELETE /api/comments/{id} - owner or admin only.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let comment_id = path.into_inner();
    let comment = state
        .store
        .query_one(
            "SELECT * FROM comments WHERE id = ?",
            params![comment_id],
            map_comment,
        )?
        .ok_or(AppError::NotFound("Comment not found"))?;

    if comment.user_id != identity.user_id && !identity.role.is_admin() {
        return Err(AppError::Forbidden("Not authorized to delete this comment"));
    }

    state
        .store
        .execute("DELETE FROM comments WHERE id = ?", params![comment_id])?;

    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new("Comment deleted"))))
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        user_id: row.get("user_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_comment_view(row: &Row<'_>) -> rusqlite::Result<CommentView> {
    let role: String = row.get("user_role")?;
    Ok(CommentView {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        user_id: row.get("user_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        user_name: row.get("user_name")?,
        user_avatar: row.get("user_avatar")?,
        user_role: Role::parse(&role).unwrap_or(Role::User),
    })
}
