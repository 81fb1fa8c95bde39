//! Category handlers. Unlike posts, a category slug collision rejects the
//! create outright with DUPLICATE.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Row, params, params_from_iter};

use quill_core::domain::Category;
use quill_core::slug::slugify;
use quill_shared::Envelope;
use quill_shared::dto::{
    CategoryView, CreateCategoryRequest, MessageData, UpdateCategoryRequest,
};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const CATEGORY_SELECT: &str = "
  SELECT c.*, COUNT(CASE WHEN p.status = 'published' THEN 1 END) AS post_count
  FROM categories c
  LEFT JOIN posts p ON p.category_id = c.id";

/// GET /api/categories - all categories with published-post counts.
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.store.query(
        &format!("{CATEGORY_SELECT} GROUP BY c.id ORDER BY c.name ASC"),
        [],
        map_category_view,
    )?;
    Ok(HttpResponse::Ok().json(Envelope::new(categories)))
}

/// GET /api/categories/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let category = state
        .store
        .query_one(
            &format!("{CATEGORY_SELECT} WHERE c.slug = ? GROUP BY c.id"),
            params![path.into_inner()],
            map_category_view,
        )?
        .ok_or(AppError::NotFound("Category not found"))?;
    Ok(HttpResponse::Ok().json(Envelope::new(category)))
}

/// POST /api/categories - admin create; 409 DUPLICATE on slug collision.
pub async fn create(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    body: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let slug = slugify(&req.name);
    let taken = state.store.query_one(
        "SELECT id FROM categories WHERE slug = ?",
        params![slug],
        |row| row.get::<_, i64>(0),
    )?;
    if taken.is_some() {
        return Err(AppError::Conflict {
            code: "DUPLICATE",
            message: "Category already exists",
        });
    }

    let result = state.store.execute(
        "INSERT INTO categories (name, slug, description, created_at) VALUES (?, ?, ?, ?)",
        params![req.name, slug, req.description, Utc::now()],
    )?;

    let category = fetch_category(&state, result.inserted_id)?
        .ok_or_else(|| AppError::Internal("category row missing after insert".to_string()))?;
    Ok(HttpResponse::Created().json(Envelope::new(category)))
}

/// PUT /api/categories/{id} - partial update; renaming re-derives the slug.
pub async fn update(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
    body: web::Json<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let category_id = path.into_inner();
    let req = body.into_inner();
    req.validate()?;

    if fetch_category(&state, category_id)?.is_none() {
        return Err(AppError::NotFound("Category not found"));
    }

    let mut sets: Vec<&'static str> = Vec::new();
    let mut bind: Vec<Value> = Vec::new();

    if let Some(name) = &req.name {
        sets.push("name = ?");
        bind.push(Value::Text(name.clone()));
        sets.push("slug = ?");
        bind.push(Value::Text(slugify(name)));
    }
    if let Some(description) = &req.description {
        sets.push("description = ?");
        bind.push(match description.as_deref() {
            Some(description) if !description.is_empty() => {
                Value::Text(description.to_string())
            }
            _ => Value::Null,
        });
    }

    if !sets.is_empty() {
        bind.push(Value::Integer(category_id));
        state.store.execute(
            &format!("UPDATE categories SET {} WHERE id = ?", sets.join(", ")),
            params_from_iter(bind),
        )?;
    }

    let category = fetch_category(&state, category_id)?
        .ok_or(AppError::NotFound("Category not found"))?;
    Ok(HttpResponse::Ok().json(Envelope::new(category)))
}

/// DELETE /api/categories/{id} - referencing posts keep existing with a
/// null category.
pub async fn delete(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let result = state.store.execute(
        "DELETE FROM categories WHERE id = ?",
        params![path.into_inner()],
    )?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Category not found"));
    }
    Ok(HttpResponse::Ok().json(Envelope::new(MessageData::new("Category deleted"))))
}

fn fetch_category(state: &AppState, id: i64) -> Result<Option<Category>, AppError> {
    state
        .store
        .query_one(
            "SELECT * FROM categories WHERE id = ?",
            params![id],
            map_category,
        )
        .map_err(Into::into)
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn map_category_view(row: &Row<'_>) -> rusqlite::Result<CategoryView> {
    Ok(CategoryView {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        post_count: row.get("post_count")?,
    })
}
