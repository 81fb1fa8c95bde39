//! Admin dashboard aggregates.

use actix_web::{HttpResponse, web};
use rusqlite::Row;

use quill_core::domain::PostStatus;
use quill_infra::SqliteStore;
use quill_shared::Envelope;
use quill_shared::dto::{RecentComment, RecentPost, StatsView};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/admin/stats
pub async fn overview(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
) -> AppResult<HttpResponse> {
    let store = &state.store;

    let stats = StatsView {
        total_posts: count(store, "SELECT COUNT(*) FROM posts")?,
        published_posts: count(store, "SELECT COUNT(*) FROM posts WHERE status = 'published'")?,
        draft_posts: count(store, "SELECT COUNT(*) FROM posts WHERE status = 'draft'")?,
        total_comments: count(store, "SELECT COUNT(*) FROM comments")?,
        total_users: count(store, "SELECT COUNT(*) FROM users")?,
        total_categories: count(store, "SELECT COUNT(*) FROM categories")?,
        unread_messages: count(
            store,
            "SELECT COUNT(*) FROM contact_messages WHERE is_read = 0",
        )?,
        recent_posts: store.query(
            "SELECT p.id, p.title, p.slug, p.status, p.created_at,
                    u.display_name AS author_name
             FROM posts p LEFT JOIN users u ON p.author_id = u.id
             ORDER BY p.created_at DESC LIMIT 5",
            [],
            map_recent_post,
        )?,
        recent_comments: store.query(
            "SELECT c.id, c.content, c.created_at, u.display_name AS user_name,
                    p.title AS post_title, p.slug AS post_slug
             FROM comments c
             JOIN users u ON c.user_id = u.id
             JOIN posts p ON c.post_id = p.id
             ORDER BY c.created_at DESC LIMIT 5",
            [],
            map_recent_comment,
        )?,
    };

    Ok(HttpResponse::Ok().json(Envelope::new(stats)))
}

fn count(store: &SqliteStore, sql: &str) -> Result<i64, AppError> {
    Ok(store.query_one(sql, [], |row| row.get(0))?.unwrap_or(0))
}

fn map_recent_post(row: &Row<'_>) -> rusqlite::Result<RecentPost> {
    let status: String = row.get("status")?;
    Ok(RecentPost {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        status: PostStatus::parse(&status).unwrap_or(PostStatus::Draft),
        created_at: row.get("created_at")?,
        author_name: row.get("author_name")?,
    })
}

fn map_recent_comment(row: &Row<'_>) -> rusqlite::Result<RecentComment> {
    Ok(RecentComment {
        id: row.get("id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        user_name: row.get("user_name")?,
        post_title: row.get("post_title")?,
        post_slug: row.get("post_slug")?,
    })
}
