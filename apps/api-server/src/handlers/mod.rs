//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod contact;
mod feed;
mod health;
mod posts;
mod stats;
mod users;

use actix_web::{HttpRequest, HttpResponse, middleware::Condition, web};
use serde::Deserialize;

use quill_core::pagination::PageParams;
use quill_shared::ErrorBody;

use crate::middleware::rate_limit::{RateLimitMiddleware, RateLimiters};

/// `?page=&limit=` query pair shared by the paginated listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    pub fn params(&self) -> PageParams {
        PageParams::parse(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Configure all application routes. Each route class carries its own
/// rate limit window; `Condition` drops the limiters entirely when they
/// are disabled (test runs). `/health` sits outside `/api` and is never
/// throttled.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limits: &RateLimiters) {
    cfg.route("/health", web::get().to(health::health_check));

    cfg.service(
        web::scope("/api")
            .wrap(Condition::new(
                limits.enabled,
                RateLimitMiddleware::new(limits.api.clone()),
            ))
            .service(
                web::scope("/auth")
                    .wrap(Condition::new(
                        limits.enabled,
                        RateLimitMiddleware::new(limits.auth.clone()),
                    ))
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/admin")
                    .wrap(Condition::new(
                        limits.enabled,
                        RateLimitMiddleware::new(limits.admin.clone()),
                    ))
                    .route("/users", web::get().to(users::list))
                    .route("/users/{id}/role", web::patch().to(users::update_role))
                    .route("/users/{id}/ban", web::patch().to(users::update_ban))
                    .route("/stats", web::get().to(stats::overview)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/search", web::get().to(posts::search))
                    .route("/admin/all", web::get().to(posts::admin_list))
                    .route("/admin/{id}", web::get().to(posts::admin_get))
                    .route("/admin/{id}", web::put().to(posts::update))
                    .route("/admin/{id}", web::delete().to(posts::delete))
                    .route("/{post_id}/comments", web::get().to(comments::list))
                    .route("/{post_id}/comments", web::post().to(comments::create))
                    .route("/{slug}", web::get().to(posts::get_by_slug)),
            )
            .route("/comments/{id}", web::delete().to(comments::delete))
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list))
                    .route("", web::post().to(categories::create))
                    .route("/{id}", web::put().to(categories::update))
                    .route("/{id}", web::delete().to(categories::delete))
                    .route("/{slug}", web::get().to(categories::get_by_slug)),
            )
            .service(
                web::scope("/contact")
                    .route("", web::post().to(contact::submit))
                    .route("", web::get().to(contact::list))
                    .route("/{id}/read", web::patch().to(contact::mark_read)),
            )
            .service(
                web::scope("/feed")
                    .route("/rss", web::get().to(feed::rss))
                    .route("/sitemap.xml", web::get().to(feed::sitemap))
                    .route("/robots.txt", web::get().to(feed::robots)),
            ),
    );
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody::new(
        "NOT_FOUND",
        format!("Route {} {} not found", req.method(), req.path()),
    ))
}
