//! End-to-end request tests over an in-memory store.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};

use quill_core::domain::Role;
use quill_core::ports::{PasswordService, TokenService};
use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use quill_infra::store::{SqliteStore, init_schema};

use crate::handlers;
use crate::middleware::rate_limit::RateLimiters;
use crate::state::AppState;

struct TestCtx {
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
    limits: RateLimiters,
}

fn ctx() -> TestCtx {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    init_schema(&store).unwrap();
    TestCtx {
        state: AppState::new(store, "http://localhost:5173".to_string()),
        tokens: Arc::new(JwtTokenService::new(JwtConfig::with_secret("test-secret"))),
        passwords: Arc::new(Argon2PasswordService::new()),
        limits: RateLimiters::new(false),
    }
}

impl TestCtx {
    /// Insert an admin row directly and sign a credential for it.
    fn admin_token(&self) -> String {
        let now = chrono::Utc::now();
        let id = self
            .state
            .store
            .execute(
                "INSERT INTO users (email, password_hash, display_name, role, created_at, updated_at)
                 VALUES ('admin@example.com', 'unused', 'Admin', 'admin', ?, ?)",
                rusqlite::params![now, now],
            )
            .unwrap()
            .inserted_id;
        self.tokens.sign(id, Role::Admin).unwrap()
    }
}

macro_rules! init_app {
    ($ctx:expr) => {{
        let limits = $ctx.limits.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.state.clone()))
                .app_data(web::Data::new($ctx.tokens.clone()))
                .app_data(web::Data::new($ctx.passwords.clone()))
                .app_data(web::Data::new($ctx.limits.clone()))
                .configure(|cfg| handlers::configure_routes(cfg, &limits))
                .default_service(web::route().to(handlers::not_found)),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let response = test::call_service(&$app, $req).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }};
}

macro_rules! req {
    ($app:expr, $method:ident, $path:expr) => {
        send!($app, test::TestRequest::$method().uri($path).to_request())
    };
    ($app:expr, $method:ident, $path:expr, token = $token:expr) => {
        send!(
            $app,
            test::TestRequest::$method()
                .uri($path)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .to_request()
        )
    };
    ($app:expr, $method:ident, $path:expr, json = $body:expr) => {
        send!(
            $app,
            test::TestRequest::$method()
                .uri($path)
                .set_json(&$body)
                .to_request()
        )
    };
    ($app:expr, $method:ident, $path:expr, json = $body:expr, token = $token:expr) => {
        send!(
            $app,
            test::TestRequest::$method()
                .uri($path)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .set_json(&$body)
                .to_request()
        )
    };
}

macro_rules! register {
    ($app:expr, $email:expr) => {{
        let (status, body) = req!(
            $app,
            post,
            "/api/auth/register",
            json = json!({"email": $email, "password": "secret1", "displayName": "Tester"})
        );
        assert_eq!(status, StatusCode::CREATED);
        let token = body["data"]["token"].as_str().unwrap().to_string();
        let id = body["data"]["user"]["id"].as_i64().unwrap();
        (id, token)
    }};
}

macro_rules! create_post {
    ($app:expr, $admin:expr, $body:expr) => {{
        let (status, body) = req!($app, post, "/api/posts", json = $body, token = $admin);
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }};
}

#[actix_rt::test]
async fn register_then_duplicate_email_conflicts() {
    let ctx = ctx();
    let app = init_app!(ctx);

    register!(app, "a@example.com");
    let (status, body) = req!(
        app,
        post,
        "/api/auth/register",
        json = json!({"email": "a@example.com", "password": "secret1", "displayName": "Other"})
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_EXISTS");

    let count: i64 = ctx
        .state
        .store
        .query_one(
            "SELECT COUNT(*) FROM users WHERE email = 'a@example.com'",
            [],
            |row| row.get(0),
        )
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn register_reports_field_level_validation_errors() {
    let ctx = ctx();
    let app = init_app!(ctx);

    let (status, body) = req!(
        app,
        post,
        "/api/auth/register",
        json = json!({"email": "nope", "password": "abc", "displayName": "T"})
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 3);
    assert!(body["error"]["requestId"].is_string());
}

#[actix_rt::test]
async fn login_rejects_unknown_email_and_wrong_password_identically() {
    let ctx = ctx();
    let app = init_app!(ctx);
    register!(app, "a@example.com");

    let (status, body) = req!(
        app,
        post,
        "/api/auth/login",
        json = json!({"email": "nobody@example.com", "password": "secret1"})
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, body) = req!(
        app,
        post,
        "/api/auth/login",
        json = json!({"email": "a@example.com", "password": "wrong-password"})
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, body) = req!(
        app,
        post,
        "/api/auth/login",
        json = json!({"email": "a@example.com", "password": "secret1"})
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["user"]["password_hash"].is_null());
    assert!(body["data"]["token"].is_string());
}

#[actix_rt::test]
async fn banned_user_cannot_login_even_with_correct_password() {
    let ctx = ctx();
    let app = init_app!(ctx);
    register!(app, "banned@example.com");

    ctx.state
        .store
        .execute(
            "UPDATE users SET is_banned = 1 WHERE email = 'banned@example.com'",
            [],
        )
        .unwrap();

    let (status, body) = req!(
        app,
        post,
        "/api/auth/login",
        json = json!({"email": "banned@example.com", "password": "secret1"})
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "BANNED");
}

#[actix_rt::test]
async fn me_requires_a_valid_credential() {
    let ctx = ctx();
    let app = init_app!(ctx);

    let (status, body) = req!(app, get, "/api/auth/me");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = req!(app, get, "/api/auth/me", token = "garbage");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    let (_, token) = register!(app, "me@example.com");
    let (status, body) = req!(app, get, "/api/auth/me", token = token);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "me@example.com");
}

#[actix_rt::test]
async fn duplicate_titles_get_distinct_slugs() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let body = json!({"title": "Same Title", "content": "First body.", "status": "published"});
    let first = create_post!(app, admin, body);
    let body = json!({"title": "Same Title", "content": "Second body.", "status": "published"});
    let second = create_post!(app, admin, body);

    assert_eq!(first["slug"], "same-title");
    let second_slug = second["slug"].as_str().unwrap();
    assert!(second_slug.starts_with("same-title-"));
    assert_ne!(first["slug"], second["slug"]);
}

#[actix_rt::test]
async fn drafts_stay_hidden_from_the_public_surface() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let draft = create_post!(
        app,
        admin,
        json!({"title": "Hidden Draft", "content": "Not yet.", "status": "draft"})
    );
    assert!(draft["published_at"].is_null());

    let (status, _) = req!(app, get, "/api/posts/hidden-draft");
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = req!(app, get, "/api/posts");
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = req!(app, get, "/api/posts/admin/all", token = admin);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
}

#[actix_rt::test]
async fn published_at_is_set_once_and_never_cleared() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let draft = create_post!(
        app,
        admin,
        json!({"title": "Slow Burn", "content": "Body.", "status": "draft"})
    );
    let id = draft["id"].as_i64().unwrap();

    let (status, body) = req!(
        app,
        put,
        &format!("/api/posts/admin/{id}"),
        json = json!({"status": "published"}),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);
    let first_published_at = body["data"]["published_at"].as_str().unwrap().to_string();

    let (_, _) = req!(
        app,
        put,
        &format!("/api/posts/admin/{id}"),
        json = json!({"status": "draft"}),
        token = admin
    );
    let (status, body) = req!(
        app,
        put,
        &format!("/api/posts/admin/{id}"),
        json = json!({"status": "published"}),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["published_at"], first_published_at.as_str());
}

#[actix_rt::test]
async fn post_list_pagination_is_clamped() {
    let ctx = ctx();
    let app = init_app!(ctx);

    let (status, body) = req!(app, get, "/api/posts?page=0&limit=999");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 50);
}

#[actix_rt::test]
async fn search_returns_matches_and_short_circuits_on_empty_query() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    create_post!(
        app,
        admin,
        json!({"title": "Rust Ownership Explained", "content": "Borrowing.", "status": "published"})
    );

    let (status, body) = req!(app, get, "/api/posts/search?q=ownership");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = req!(app, get, "/api/posts/search");
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert!(body.get("pagination").is_none());
}

#[actix_rt::test]
async fn duplicate_category_slug_is_rejected() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let (status, body) = req!(
        app,
        post,
        "/api/categories",
        json = json!({"name": "Tech"}),
        token = admin
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "tech");

    let (status, body) = req!(
        app,
        post,
        "/api/categories",
        json = json!({"name": "Tech"}),
        token = admin
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE");
}

#[actix_rt::test]
async fn deleting_a_category_detaches_posts_instead_of_deleting_them() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let (_, body) = req!(
        app,
        post,
        "/api/categories",
        json = json!({"name": "Tech"}),
        token = admin
    );
    let category_id = body["data"]["id"].as_i64().unwrap();

    let post = create_post!(
        app,
        admin,
        json!({
            "title": "Categorized",
            "content": "Body.",
            "status": "published",
            "category_id": category_id
        })
    );
    let post_id = post["id"].as_i64().unwrap();
    assert_eq!(post["category_name"], "Tech");

    let (status, _) = req!(
        app,
        delete,
        &format!("/api/categories/{category_id}"),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = req!(app, get, &format!("/api/posts/admin/{post_id}"), token = admin);
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["category_id"].is_null());
}

#[actix_rt::test]
async fn comment_deletion_is_restricted_to_owner_or_admin() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let post = create_post!(
        app,
        admin,
        json!({"title": "Open Thread", "content": "Discuss.", "status": "published"})
    );
    let post_id = post["id"].as_i64().unwrap();

    let (_, token_a) = register!(app, "a@example.com");
    let (_, token_b) = register!(app, "b@example.com");

    let (status, body) = req!(
        app,
        post,
        &format!("/api/posts/{post_id}/comments"),
        json = json!({"content": "First!"}),
        token = token_a
    );
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = req!(
        app,
        delete,
        &format!("/api/comments/{comment_id}"),
        token = token_b
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = req!(
        app,
        delete,
        &format!("/api/comments/{comment_id}"),
        token = token_a
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = req!(app, get, &format!("/api/posts/{post_id}/comments"));
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn commenting_requires_a_published_parent_post() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let draft = create_post!(
        app,
        admin,
        json!({"title": "Unpublished", "content": "Soon.", "status": "draft"})
    );
    let post_id = draft["id"].as_i64().unwrap();

    let (_, token) = register!(app, "a@example.com");
    let (status, body) = req!(
        app,
        post,
        &format!("/api/posts/{post_id}/comments"),
        json = json!({"content": "Too early"}),
        token = token
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_rt::test]
async fn admin_surfaces_reject_regular_users() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let (_, token) = register!(app, "user@example.com");

    let (status, body) = req!(app, get, "/api/admin/stats", token = token);
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = req!(
        app,
        post,
        "/api/posts",
        json = json!({"title": "Nope", "content": "Nope."}),
        token = token
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn role_and_ban_updates_flow_through_admin_users() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();
    let (user_id, _) = register!(app, "promote@example.com");

    let (status, body) = req!(
        app,
        patch,
        &format!("/api/admin/users/{user_id}/role"),
        json = json!({"role": "superuser"}),
        token = admin
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ROLE");

    let (status, _) = req!(
        app,
        patch,
        &format!("/api/admin/users/{user_id}/role"),
        json = json!({"role": "admin"}),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = req!(
        app,
        patch,
        &format!("/api/admin/users/{user_id}/ban"),
        json = json!({"is_banned": true}),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "User banned");

    let (status, _) = req!(
        app,
        patch,
        "/api/admin/users/9999/ban",
        json = json!({"is_banned": true}),
        token = admin
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn contact_messages_round_trip_through_the_admin_surface() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    let (status, _) = req!(
        app,
        post,
        "/api/contact",
        json = json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Hello",
            "message": "Nice blog."
        })
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = req!(app, get, "/api/contact", token = admin);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    let message_id = body["data"][0]["id"].as_i64().unwrap();
    assert_eq!(body["data"][0]["is_read"], false);

    let (status, _) = req!(
        app,
        patch,
        &format!("/api/contact/{message_id}/read"),
        token = admin
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = req!(app, patch, "/api/contact/9999/read", token = admin);
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn stats_reflect_store_contents() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();

    create_post!(
        app,
        admin,
        json!({"title": "Published One", "content": "Body.", "status": "published"})
    );
    create_post!(
        app,
        admin,
        json!({"title": "Draft One", "content": "Body.", "status": "draft"})
    );

    let (status, body) = req!(app, get, "/api/admin/stats", token = admin);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalPosts"], 2);
    assert_eq!(body["data"]["publishedPosts"], 1);
    assert_eq!(body["data"]["draftPosts"], 1);
    assert_eq!(body["data"]["recentPosts"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn unmatched_routes_get_the_error_envelope() {
    let ctx = ctx();
    let app = init_app!(ctx);

    let (status, body) = req!(app, get, "/api/nonexistent/route");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_rt::test]
async fn feeds_serve_xml_and_text() {
    let ctx = ctx();
    let app = init_app!(ctx);
    let admin = ctx.admin_token();
    create_post!(
        app,
        admin,
        json!({"title": "Feed Me", "content": "Body.", "status": "published"})
    );

    let response = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/feed/rss").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
    assert!(text.contains("<rss version=\"2.0\""));
    assert!(text.contains("feed-me"));

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/feed/sitemap.xml")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
    assert!(text.contains("<urlset"));

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/feed/robots.txt")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();
    assert!(text.starts_with("User-agent: *"));
}
