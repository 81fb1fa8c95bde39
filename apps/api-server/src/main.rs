//! # Quill API Server
//!
//! The main entry point for the actix-web HTTP server.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;

#[cfg(test)]
mod tests;

use config::AppConfig;
use middleware::error::AppError;
use middleware::rate_limit::RateLimiters;
use quill_core::ports::{PasswordService, TokenService};
use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use quill_infra::store::{SqliteStore, init_schema};
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env();
    if let Err(reason) = config.validate() {
        tracing::error!(%reason, "refusing to start");
        std::process::exit(1);
    }

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteStore::open(&config.database_path).map_err(std::io::Error::other)?);
    init_schema(&store).map_err(std::io::Error::other)?;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
        JwtConfig::with_secret(&config.jwt_secret),
    ));
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
    let limits = RateLimiters::new(!config.is_test());
    let state = AppState::new(store, config.cors_origin.clone());

    tracing::info!("starting Quill API server on {}:{}", config.host, config.port);

    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
            .supports_credentials();

        let limits = limits.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(web::Data::new(limits.clone()))
            .app_data(json_config())
            .app_data(path_config())
            .configure(|cfg| handlers::configure_routes(cfg, &limits))
            .default_service(web::route().to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(5 * 1024 * 1024)
        .error_handler(|err, _req| {
            tracing::debug!(%err, "json payload rejected");
            AppError::InvalidJson.into()
        })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| {
        AppError::NotFound("Resource not found").into()
    })
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,quill_infra=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
