//! Per-client request throttling.
//!
//! [`RateLimiter`] is an ordinary value owned by the router, not process
//! state. [`RateLimiter::start`] spawns the sweeper that evicts idle
//! clients; the returned [`Sweeper`] stops it.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::envelope::Envelope;
use crate::config::{RateLimitConfig, WindowPolicy};

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug)]
enum Window {
    Fixed { started: Instant, count: u32 },
    Sliding(VecDeque<Instant>),
}

pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record a request from `client` and report whether it may proceed.
    pub async fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now()).await
    }

    /// [`check`](Self::check) with an explicit clock.
    pub async fn check_at(&self, client: &str, now: Instant) -> bool {
        let RateLimitConfig {
            max_requests,
            window,
            policy,
        } = self.config;
        let mut clients = self.clients.lock().await;

        let entry = clients.entry(client.to_string()).or_insert_with(|| match policy {
            WindowPolicy::Fixed => Window::Fixed {
                started: now,
                count: 0,
            },
            WindowPolicy::Sliding => Window::Sliding(VecDeque::new()),
        });

        match entry {
            // Every attempt counts, allowed or not
            Window::Fixed { started, count } => {
                if now.saturating_duration_since(*started) >= window {
                    *started = now;
                    *count = 0;
                }
                *count = count.saturating_add(1);
                *count <= max_requests
            }
            // Rejected attempts are not recorded
            Window::Sliding(stamps) => {
                while stamps
                    .front()
                    .is_some_and(|&t| now.saturating_duration_since(t) >= window)
                {
                    stamps.pop_front();
                }
                if stamps.len() >= max_requests as usize {
                    return false;
                }
                stamps.push_back(now);
                true
            }
        }
    }

    /// Drop clients with nothing left in their window. Returns how many remain.
    pub async fn sweep_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut clients = self.clients.lock().await;
        clients.retain(|_, entry| match entry {
            Window::Fixed { started, .. } => now.saturating_duration_since(*started) < window,
            Window::Sliding(stamps) => {
                stamps.retain(|&t| now.saturating_duration_since(t) < window);
                !stamps.is_empty()
            }
        });
        clients.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Spawn the eviction task, sweeping once per window.
    pub fn start(self: &Arc<Self>) -> Sweeper {
        let limiter = Arc::clone(self);
        let (shutdown, mut stop) = oneshot::channel();
        let period = self.config.window;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let remaining = limiter.sweep_at(Instant::now()).await;
                        debug!(remaining, "rate limiter sweep");
                    }
                    _ = &mut stop => break,
                }
            }
        });

        Sweeper { shutdown, handle }
    }
}

/// Handle to the running eviction task.
pub struct Sweeper {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Stop the task and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            warn!("rate limiter sweeper ended abnormally: {}", e);
        }
    }
}

/// Middleware: reject with `429` once a client exceeds its allowance.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    if limiter.check(&client).await {
        next.run(request).await
    } else {
        warn!(client = %client, "rate limit exceeded");
        (StatusCode::TOO_MANY_REQUESTS, Json(Envelope::throttled())).into_response()
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
