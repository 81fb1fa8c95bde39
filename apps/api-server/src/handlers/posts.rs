//! Post handlers - public listing/search/detail plus the admin CRUD.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Row, params, params_from_iter};
use serde::Deserialize;

use quill_core::domain::{Post, PostStatus};
use quill_core::pagination::{PageMeta, PageParams};
use quill_core::slug::slugify;
use quill_shared::dto::{CreatePostRequest, MessageData, PostView, UpdatePostRequest};
use quill_shared::{Envelope, Paginated};

use super::PageQuery;
use crate::middleware::auth::{AdminIdentity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const POST_SELECT: &str = "
  SELECT p.*, u.display_name AS author_name, u.avatar_url AS author_avatar,
         c.name AS category_name, c.slug AS category_slug,
         (SELECT COUNT(*) FROM comments WHERE post_id = p.id) AS comment_count
  FROM posts p
  LEFT JOIN users u ON p.author_id = u.id
  LEFT JOIN categories c ON p.category_id = c.id";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
    sort: Option<String>,
}

/// GET /api/posts - published posts, newest first unless `sort=oldest`,
/// optionally filtered by category slug.
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    if let Some(identity) = viewer.0 {
        tracing::debug!(user_id = identity.user_id, "post list requested by signed-in user");
    }

    let params = PageParams::parse(query.page.as_deref(), query.limit.as_deref());
    let order = if query.sort.as_deref() == Some("oldest") {
        "ASC"
    } else {
        "DESC"
    };

    let mut where_sql = "WHERE p.status = 'published'".to_string();
    let mut bind: Vec<Value> = Vec::new();
    if let Some(category) = query.category.as_deref() {
        where_sql.push_str(" AND c.slug = ?");
        bind.push(Value::Text(category.to_string()));
    }

    let total: i64 = state
        .store
        .query_one(
            &format!(
                "SELECT COUNT(*) AS total FROM posts p
                 LEFT JOIN categories c ON p.category_id = c.id {where_sql}"
            ),
            params_from_iter(bind.clone()),
            |row| row.get(0),
        )?
        .unwrap_or(0);

    bind.push(Value::Integer(params.limit));
    bind.push(Value::Integer(params.offset()));
    let posts = state.store.query(
        &format!("{POST_SELECT} {where_sql} ORDER BY p.published_at {order} LIMIT ? OFFSET ?"),
        params_from_iter(bind),
        map_post_view,
    )?;

    Ok(HttpResponse::Ok().json(Paginated::new(posts, PageMeta::new(total, params))))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

/// GET /api/posts/search - LIKE search over published titles and bodies.
/// An empty query short-circuits to an empty list.
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let q = query.q.as_deref().unwrap_or("").trim();
    if q.is_empty() {
        return Ok(HttpResponse::Ok().json(Envelope::new(Vec::<PostView>::new())));
    }

    let params = PageParams::parse(query.page.as_deref(), query.limit.as_deref());
    let pattern = format!("%{q}%");

    let total: i64 = state
        .store
        .query_one(
            "SELECT COUNT(*) AS total FROM posts p
             WHERE (p.title LIKE ? OR p.content LIKE ?) AND p.status = 'published'",
            params![pattern, pattern],
            |row| row.get(0),
        )?
        .unwrap_or(0);

    let posts = state.store.query(
        &format!(
            "{POST_SELECT}
             WHERE (p.title LIKE ? OR p.content LIKE ?) AND p.status = 'published'
             ORDER BY p.published_at DESC
             LIMIT ? OFFSET ?"
        ),
        params![pattern, pattern, params.limit, params.offset()],
        map_post_view,
    )?;

    Ok(HttpResponse::Ok().json(Paginated::new(posts, PageMeta::new(total, params))))
}

/// GET /api/posts/{slug} - single published post. The literal segment
/// `admin` belongs to the admin routes and is never treated as a slug.
pub async fn get_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    if slug == "admin" {
        return Err(AppError::NotFound("Post not found"));
    }

    let post = state
        .store
        .query_one(
            &format!("{POST_SELECT} WHERE p.slug = ? AND p.status = 'published'"),
            params![slug],
            map_post_view,
        )?
        .ok_or(AppError::NotFound("Post not found"))?;

    Ok(HttpResponse::Ok().json(Envelope::new(post)))
}

/// GET /api/posts/admin/all - every post regardless of status.
pub async fn admin_list(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let params = query.params();
    let total: i64 = state
        .store
        .query_one("SELECT COUNT(*) AS total FROM posts", [], |row| row.get(0))?
        .unwrap_or(0);

    let posts = state.store.query(
        &format!("{POST_SELECT} ORDER BY p.created_at DESC LIMIT ? OFFSET ?"),
        params![params.limit, params.offset()],
        map_post_view,
    )?;

    Ok(HttpResponse::Ok().json(Paginated::new(posts, PageMeta::new(total, params))))
}

/// GET /api/posts/admin/{id}
pub async fn admin_get(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = fetch_view(&state, path.into_inner())?.ok_or(AppError::NotFound("Post not found"))?;
    Ok(HttpResponse::Ok().json(Envelope::new(post)))
}

/// POST /api/posts - admin create. A slug collision gets a millisecond
/// timestamp suffix instead of failing.
pub async fn create(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let mut slug = slugify(&req.title);
    let taken = state.store.query_one(
        "SELECT id FROM posts WHERE slug = ?",
        params![slug],
        |row| row.get::<_, i64>(0),
    )?;
    if taken.is_some() {
        slug = format!("{slug}-{}", Utc::now().timestamp_millis());
    }

    let excerpt = match req.excerpt.as_deref() {
        Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
        _ => derive_excerpt(&req.content),
    };
    let status = req.status();
    let now = Utc::now();
    let published_at = (status == PostStatus::Published).then_some(now);

    let result = state.store.execute(
        "INSERT INTO posts (title, slug, content, excerpt, cover_image_url, author_id,
                            category_id, status, published_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            req.title,
            slug,
            req.content,
            excerpt,
            normalize_url(req.cover_image_url.as_deref()),
            admin.0.user_id,
            req.category_id,
            status.as_str(),
            published_at,
            now,
            now
        ],
    )?;

    let post = fetch_view(&state, result.inserted_id)?
        .ok_or_else(|| AppError::Internal("post row missing after insert".to_string()))?;
    Ok(HttpResponse::Created().json(Envelope::new(post)))
}

/// PUT /api/posts/admin/{id} - writes only the provided fields.
/// `published_at` is set on the first transition to published and never
/// cleared afterwards.
pub async fn update(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    let existing = state
        .store
        .query_one("SELECT * FROM posts WHERE id = ?", params![post_id], map_post)?
        .ok_or(AppError::NotFound("Post not found"))?;

    let mut sets: Vec<&'static str> = Vec::new();
    let mut bind: Vec<Value> = Vec::new();

    if let Some(title) = &req.title {
        sets.push("title = ?");
        bind.push(Value::Text(title.clone()));

        let mut slug = slugify(title);
        let conflict = state.store.query_one(
            "SELECT id FROM posts WHERE slug = ? AND id != ?",
            params![slug, post_id],
            |row| row.get::<_, i64>(0),
        )?;
        if conflict.is_some() {
            slug = format!("{slug}-{}", Utc::now().timestamp_millis());
        }
        sets.push("slug = ?");
        bind.push(Value::Text(slug));
    }
    if let Some(content) = &req.content {
        sets.push("content = ?");
        bind.push(Value::Text(content.clone()));
    }
    if let Some(excerpt) = &req.excerpt {
        sets.push("excerpt = ?");
        bind.push(Value::Text(excerpt.clone()));
    }
    if let Some(url) = &req.cover_image_url {
        sets.push("cover_image_url = ?");
        bind.push(match normalize_url(Some(url)) {
            Some(url) => Value::Text(url),
            None => Value::Null,
        });
    }
    if let Some(category_id) = req.category_id {
        sets.push("category_id = ?");
        bind.push(match category_id {
            Some(id) => Value::Integer(id),
            None => Value::Null,
        });
    }
    if let Some(status) = req.status {
        sets.push("status = ?");
        bind.push(Value::Text(status.as_str().to_string()));
        if status == PostStatus::Published && existing.published_at.is_none() {
            sets.push("published_at = ?");
            bind.push(Value::Text(Utc::now().to_rfc3339()));
        }
    }

    if !sets.is_empty() {
        sets.push("updated_at = ?");
        bind.push(Value::Text(Utc::now().to_rfc3339()));
        bind.push(Value::Integer(post_id));
        state.store.execute(
            &format!("UPDATE posts SET {} WHERE id = ?", sets.join(", ")),
            params_from_iter(bind),
        )?;
    }

    let post = fetch_view(&state, post_id)?.ok_or(AppError::NotFound("Post not found"))?;
    Ok(HttpResponse::Ok().json(Envelope::new(post)))
}

/// DELETE /api/posts/admin/{id}
pub async fn delete(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let result = state
        .store
        .execute("DELETE FROM posts WHERE id = ?", params![path.into_inner()])?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Post not found"));
    }
    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new("Post deleted"))))
}

fn fetch_view(state: &AppState, id: i64) -> Result<Option<PostView>, AppError> {
    state
        .store
        .query_one(
            &format!("{POST_SELECT} WHERE p.id = ?"),
            params![id],
            map_post_view,
        )
        .map_err(Into::into)
}

/// First 200 characters of the body with markdown punctuation stripped.
fn derive_excerpt(content: &str) -> String {
    content
        .chars()
        .take(200)
        .filter(|c| !matches!(c, '#' | '*' | '`' | '>' | '-' | '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn normalize_url(url: Option<&str>) -> Option<String> {
    match url {
        Some(url) if !url.is_empty() => Some(url.to_string()),
        _ => None,
    }
}

fn map_post_view(row: &Row<'_>) -> rusqlite::Result<PostView> {
    let status: String = row.get("status")?;
    Ok(PostView {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        content: row.get("content")?,
        excerpt: row.get("excerpt")?,
        cover_image_url: row.get("cover_image_url")?,
        author_id: row.get("author_id")?,
        category_id: row.get("category_id")?,
        status: PostStatus::parse(&status).unwrap_or(PostStatus::Draft),
        published_at: row.get("published_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        author_name: row.get("author_name")?,
        author_avatar: row.get("author_avatar")?,
        category_name: row.get("category_name")?,
        category_slug: row.get("category_slug")?,
        comment_count: row.get("comment_count")?,
    })
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let status: String = row.get("status")?;
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        content: row.get("content")?,
        excerpt: row.get("excerpt")?,
        cover_image_url: row.get("cover_image_url")?,
        author_id: row.get("author_id")?,
        category_id: row.get("category_id")?,
        status: PostStatus::parse(&status).unwrap_or(PostStatus::Draft),
        published_at: row.get("published_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
