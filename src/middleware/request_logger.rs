//! Access log: one line per finished request, tagged with the caller.
//!
//! The caller is read from the bearer token's claims without loading the
//! account, so a token for a deactivated user still logs its user id.
//! Readiness probes are logged at debug level while healthy and as a warning
//! while the service is not ready.

use std::fmt;
use std::future::{Ready, ready};
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use actix_web::{Error, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use crate::auth::{bearer_token, verify_token};
use crate::config::Config;

/// Who sent a request, according to its `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(i32),
    InvalidToken,
}

impl Caller {
    /// Identify the caller. Without a secret no token can be trusted.
    pub fn of(req: &HttpRequest, secret: Option<&SecretString>) -> Self {
        let Some(token) = bearer_token(req) else {
            return if req.headers().contains_key(header::AUTHORIZATION) {
                Self::InvalidToken
            } else {
                Self::Anonymous
            };
        };

        secret
            .and_then(|secret| verify_token(&token, secret).ok())
            .and_then(|claims| claims.user_id())
            .map_or(Self::InvalidToken, Self::User)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(id) => write!(f, "user:{}", id),
            Self::InvalidToken => write!(f, "invalid_token"),
        }
    }
}

/// How a finished request is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Healthy `/health` or `/ready`
    Probe,
    /// `/ready` answered 503
    NotReady,
    Success,
    ClientError,
    ServerError,
}

fn is_probe(path: &str) -> bool {
    path.ends_with("/health") || path.ends_with("/ready")
}

pub fn classify(path: &str, status: StatusCode) -> Outcome {
    if is_probe(path) {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Outcome::NotReady;
        }
        if status.is_success() {
            return Outcome::Probe;
        }
    }

    if status.is_server_error() {
        Outcome::ServerError
    } else if status.is_client_error() {
        Outcome::ClientError
    } else {
        Outcome::Success
    }
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let secret = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.jwt.secret.clone());
        let caller = Caller::of(req.request(), secret.as_ref());

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status().as_u16();
            let duration_ms = start.elapsed().as_millis() as u64;

            match classify(&path, res.status()) {
                Outcome::Probe => {
                    debug!(target: "api", %method, %path, status, duration_ms, "Probe ok")
                }
                Outcome::NotReady => warn!(
                    target: "api",
                    %path,
                    status,
                    "Service not ready: database unreachable or migrations pending"
                ),
                Outcome::Success => {
                    info!(target: "api", %method, %path, %caller, status, duration_ms, "Request completed")
                }
                Outcome::ClientError => {
                    warn!(target: "api", %method, %path, %caller, status, duration_ms, "Request rejected")
                }
                Outcome::ServerError => {
                    error!(target: "api", %method, %path, %caller, status, duration_ms, "Request failed")
                }
            }

            Ok(res)
        })
    }
}
