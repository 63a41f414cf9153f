//! Fixed-window rate limiting per client IP for the public auth routes

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Budget for one route
#[derive(Debug, Clone, Copy)]
pub struct RateRule {
    pub route: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const LOGIN: RateRule = RateRule {
    route: "login",
    max_requests: 5,
    window: Duration::from_secs(60),
};

pub const REGISTER: RateRule = RateRule {
    route: "register",
    max_requests: 3,
    window: Duration::from_secs(60),
};

/// Windows idle for longer than this are dropped by `cleanup`
const STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<(&'static str, String), Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a hit; `false` once the client has used up the rule's budget
    pub async fn allow(&self, rule: &RateRule, ip: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry((rule.route, ip.to_owned()))
            .or_insert(Window { opened: now, hits: 0 });

        if now.duration_since(window.opened) >= rule.window {
            *window = Window { opened: now, hits: 0 };
        }
        window.hits += 1;
        window.hits <= rule.max_requests
    }

    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.opened) < STALE_AFTER);
        let dropped = before - windows.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = windows.len(), "Rate limiter cleaned up");
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// First `X-Forwarded-For` hop when present, else the socket peer
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    rule: &RateRule,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);
    if !state.rate_limiter.allow(rule, &ip).await {
        tracing::warn!(ip = %ip, route = rule.route, "Rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests));
    }
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &LOGIN, request, next).await
}

pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &REGISTER, request, next).await
}
