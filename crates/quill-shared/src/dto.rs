//! Data Transfer Objects - request bodies with their validation rules, and
//! the joined row views the handlers serialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use quill_core::domain::{PostStatus, Role, User};

use crate::response::FieldError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// POST /api/auth/register
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if !is_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        let name_len = self.display_name.chars().count();
        if name_len < 2 {
            errors.push(FieldError::new(
                "displayName",
                "Display name must be at least 2 characters",
            ));
        } else if name_len > 50 {
            errors.push(FieldError::new(
                "displayName",
                "Display name must be at most 50 characters",
            ));
        }
        ok_or(errors)
    }
}

/// POST /api/auth/login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if !is_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        ok_or(errors)
    }
}

/// POST /api/posts
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_title(&mut errors, &self.title);
        if self.content.is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        check_excerpt(&mut errors, self.excerpt.as_deref());
        check_cover_url(&mut errors, self.cover_image_url.as_deref());
        check_category_id(&mut errors, self.category_id);
        ok_or(errors)
    }

    pub fn status(&self) -> PostStatus {
        self.status.unwrap_or(PostStatus::Draft)
    }
}

/// PUT /api/posts/admin/{id} - only the provided fields are written.
///
/// `category_id` is tri-state: absent leaves the column alone, an explicit
/// `null` clears it, a value sets it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// An empty string clears the cover image.
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(content) = &self.content {
            if content.is_empty() {
                errors.push(FieldError::new("content", "Content is required"));
            }
        }
        check_excerpt(&mut errors, self.excerpt.as_deref());
        check_cover_url(&mut errors, self.cover_image_url.as_deref());
        if let Some(Some(id)) = self.category_id {
            check_category_id(&mut errors, Some(id));
        }
        ok_or(errors)
    }
}

/// POST /api/categories
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_category_name(&mut errors, &self.name);
        check_description(&mut errors, self.description.as_deref());
        ok_or(errors)
    }
}

/// PUT /api/categories/{id} - partial update; `description: null` clears.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_category_name(&mut errors, name);
        }
        if let Some(Some(description)) = &self.description {
            check_description(&mut errors, Some(description.as_str()));
        }
        ok_or(errors)
    }
}

/// POST /api/posts/{post_id}/comments
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.content.is_empty() {
            errors.push(FieldError::new("content", "Comment cannot be empty"));
        } else if self.content.chars().count() > 2000 {
            errors.push(FieldError::new(
                "content",
                "Comment must be at most 2000 characters",
            ));
        }
        ok_or(errors)
    }
}

/// POST /api/contact
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_len(&mut errors, "name", &self.name, 1, 100, "Name is required");
        if !is_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        check_len(
            &mut errors,
            "subject",
            &self.subject,
            1,
            200,
            "Subject is required",
        );
        check_len(
            &mut errors,
            "message",
            &self.message,
            1,
            5000,
            "Message is required",
        );
        ok_or(errors)
    }
}

/// PATCH /api/admin/users/{id}/role - role is validated by the handler so
/// an unknown value maps to INVALID_ROLE rather than a validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// PATCH /api/admin/users/{id}/ban
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBanRequest {
    pub is_banned: bool,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Sanitized user - `User` without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            avatar_url: user.avatar_url,
            bio: user.bio,
            is_banned: user.is_banned,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Register/login payload.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: PublicUser,
    pub token: String,
}

/// Post joined with author, category and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub comment_count: i64,
}

/// Comment joined with its author's public fields.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub user_role: Role,
}

/// Category with its published-post count.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub post_count: i64,
}

/// Dashboard aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub total_comments: i64,
    pub total_users: i64,
    pub total_categories: i64,
    pub unread_messages: i64,
    pub recent_posts: Vec<RecentPost>,
    pub recent_comments: Vec<RecentComment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentComment {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub post_title: String,
    pub post_slug: String,
}

/// `{ data: { message } }` acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct MessageData {
    pub message: &'static str,
}

impl MessageData {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn ok_or(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !s.chars().any(char::is_whitespace)
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn check_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    required_message: &'static str,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(FieldError::new(field, required_message));
    } else if len > max {
        errors.push(FieldError::new(field, "Value is too long"));
    }
}

fn check_title(errors: &mut Vec<FieldError>, title: &str) {
    let len = title.chars().count();
    if len == 0 {
        errors.push(FieldError::new("title", "Title is required"));
    } else if len > 200 {
        errors.push(FieldError::new(
            "title",
            "Title must be at most 200 characters",
        ));
    }
}

fn check_excerpt(errors: &mut Vec<FieldError>, excerpt: Option<&str>) {
    if let Some(excerpt) = excerpt {
        if excerpt.chars().count() > 500 {
            errors.push(FieldError::new(
                "excerpt",
                "Excerpt must be at most 500 characters",
            ));
        }
    }
}

fn check_cover_url(errors: &mut Vec<FieldError>, url: Option<&str>) {
    if let Some(url) = url {
        if !url.is_empty() && !is_url(url) {
            errors.push(FieldError::new("cover_image_url", "Invalid URL"));
        }
    }
}

fn check_category_id(errors: &mut Vec<FieldError>, id: Option<i64>) {
    if let Some(id) = id {
        if id <= 0 {
            errors.push(FieldError::new(
                "category_id",
                "Category id must be positive",
            ));
        }
    }
}

fn check_category_name(errors: &mut Vec<FieldError>, name: &str) {
    let len = name.chars().count();
    if len == 0 {
        errors.push(FieldError::new("name", "Name is required"));
    } else if len > 50 {
        errors.push(FieldError::new(
            "name",
            "Name must be at most 50 characters",
        ));
    }
}

fn check_description(errors: &mut Vec<FieldError>, description: Option<&str>) {
    if let Some(description) = description {
        if description.chars().count() > 200 {
            errors.push(FieldError::new(
                "description",
                "Description must be at most 200 characters",
            ));
        }
    }
}

/// Distinguishes an absent JSON field (outer `None`) from an explicit
/// `null` (inner `None`) on partial updates.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
