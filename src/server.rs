//! HTTP surface: webhook intake and health endpoints.
//!
//! The webhook handler validates the body, schedules a pipeline run on the
//! worker pool, and acknowledges immediately. It never waits for the
//! pipeline; by the time a run fails the caller is long gone, which is why
//! failures land in the ledger instead of the response.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::model::OrderPayload;
use crate::worker::{JobPool, SubmitError};

/// Shared handler state.
pub struct AppState {
    pub pool: JobPool,
}

/// Acknowledgment body for an accepted webhook.
#[derive(Debug, Serialize)]
struct WebhookAck {
    status: &'static str,
    contact_id: String,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/webhook/ghl-order", post(order_webhook))
        .with_state(state)
}

/// Liveness check. No business logic.
async fn health() -> StatusCode {
    StatusCode::OK
}

/// Accept one order webhook and schedule its pipeline run.
async fn order_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OrderPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "webhook body rejected");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    info!(
        contact_id = %payload.contact_id,
        transaction_id = %payload.transaction_id,
        "order webhook received"
    );

    match state.pool.submit(payload.clone()) {
        Ok(()) => (
            StatusCode::OK,
            Json(WebhookAck {
                status: "accepted",
                contact_id: payload.contact_id,
            }),
        )
            .into_response(),
        Err(e @ (SubmitError::QueueFull | SubmitError::WorkerGone)) => {
            warn!(error = %e, "could not schedule pipeline run");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "http server listening");
    axum::serve(listener, router(state)).await
}
