//! HTTP surface: `POST /bfhl` and `GET /health`.

pub mod envelope;
pub mod rate_limit;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::command::Command;
use crate::config::ServerConfig;
use crate::consts::INTERNAL_ERROR_MESSAGE;
use crate::dispatch::{Data, Dispatcher};
use crate::error::ApiError;
use crate::oracle::Oracle;
use envelope::Envelope;
use rate_limit::RateLimiter;

/// Shared by every handler.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub official_email: String,
}

impl AppState {
    pub fn new(config: &ServerConfig, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            dispatcher: Dispatcher::new(oracle, config.ai_timeout),
            official_email: config.official_email.clone(),
        }
    }

    /// Decode, validate and run one request body.
    pub async fn handle(&self, body: Value) -> Result<Data, ApiError> {
        let command = Command::parse(body)?;
        Ok(self.dispatcher.dispatch(command).await?)
    }

    fn respond(&self, result: Result<Data, ApiError>) -> Response {
        match result {
            Ok(data) => (
                StatusCode::OK,
                Json(Envelope::success(&self.official_email, data)),
            )
                .into_response(),
            Err(err) => {
                let status = err.status();
                warn!(%status, "POST /bfhl rejected: {}", err);
                (
                    status,
                    Json(Envelope::failure(&self.official_email, err.to_string())),
                )
                    .into_response()
            }
        }
    }
}

/// Assemble the router with all middleware.
///
/// Layer order, outermost first: tracing, CORS, panic catcher, rate
/// limiter, body limit. The body limit is enforced by the JSON extractor,
/// so an oversized body still gets the failure envelope.
pub fn router(config: &ServerConfig, state: Arc<AppState>, limiter: Arc<RateLimiter>) -> Router {
    let email = config.official_email.clone();

    Router::new()
        .route("/bfhl", post(bfhl))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::enforce))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(&email, panic)
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn bfhl(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(body)) => state.handle(body).await,
        Err(rejection) => Err(ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }),
    };
    state.respond(result)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Envelope> {
    Json(Envelope::healthy(&state.official_email))
}

/// Resolves once `signal` fires. If the signal listener fails, the error is
/// logged and this never resolves, so the server keeps running.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!("failed to listen for shutdown signal, graceful shutdown disabled: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn panic_response(email: &str, panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("request handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure(email, INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}
