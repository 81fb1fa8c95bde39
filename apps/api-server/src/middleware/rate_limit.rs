//! Rate limiting middleware - one fixed window per route class, keyed by
//! client address. Checks run synchronously before the inner service and
//! fail open on limiter errors.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};

use quill_core::ports::RateLimiter;
use quill_infra::{FixedWindowLimiter, RateLimitConfig};

use super::error::AppError;

/// One limiter per route class, shared across workers. Disabled limiters
/// (test runs) are skipped entirely via `Condition`.
#[derive(Clone)]
pub struct RateLimiters {
    pub enabled: bool,
    pub api: Arc<dyn RateLimiter>,
    pub auth: Arc<dyn RateLimiter>,
    pub admin: Arc<dyn RateLimiter>,
    pub contact: Arc<dyn RateLimiter>,
}

impl RateLimiters {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            api: Arc::new(FixedWindowLimiter::new(RateLimitConfig::general_api())),
            auth: Arc::new(FixedWindowLimiter::new(RateLimitConfig::auth())),
            admin: Arc::new(FixedWindowLimiter::new(RateLimitConfig::admin())),
            contact: Arc::new(FixedWindowLimiter::new(RateLimitConfig::contact())),
        }
    }
}

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        match self.limiter.check(&key) {
            Ok(decision) if !decision.allowed => {
                tracing::warn!(%key, "rate limit exceeded");

                let retry_after_secs = decision.retry_after.as_secs().max(1);
                let mut response = AppError::RateLimited { retry_after_secs }.error_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    header::HeaderValue::from(retry_after_secs),
                );

                let (http_req, _payload) = req.into_parts();
                let res = ServiceResponse::new(http_req, response).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
            result => {
                if result.is_err() {
                    tracing::error!(%key, "rate limiter failure, failing open");
                }
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
        }
    }
}
