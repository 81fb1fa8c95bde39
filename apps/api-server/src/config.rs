//! Application configuration loaded from environment variables.

use std::env;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-in-production";

/// Runtime environment. Test runs bypass rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub cors_origin: String,
    pub environment: Environment,
}

impl AppConfig {
    /// Load configuration from environment variables, with development
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/blog.db".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            environment: Environment::from_env(),
        }
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }

    /// Refuse to boot with the development secret in production.
    pub fn validate(&self) -> Result<(), String> {
        if self.environment == Environment::Production && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(
                "default JWT_SECRET detected in production; set a strong JWT_SECRET".to_string(),
            );
        }
        Ok(())
    }
}
