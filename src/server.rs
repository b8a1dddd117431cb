//! Invocation server for `cflogs serve`.
//!
//! `POST /invoke` takes one batch as its JSON body, the way a stream trigger
//! would deliver it. A fully processed batch answers `200` with the
//! acknowledgement; a partial failure answers `500` with the failed records
//! so the caller can redeliver.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cflogs_core::{Batch, BatchProcessor};
use tokio::net::TcpListener;

pub fn router(processor: Arc<BatchProcessor>) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/healthz", get(healthz))
        .with_state(processor)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, processor: Arc<BatchProcessor>) -> anyhow::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, table = processor.table(), "listening");
    axum::serve(listener, router(processor))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn invoke(
    State(processor): State<Arc<BatchProcessor>>,
    Json(batch): Json<Batch>,
) -> Response {
    match processor.invoke(&batch).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(failure) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "errorType": "BatchFailure",
                "errorMessage": failure.to_string(),
                "failedCount": failure.count(),
            })),
        )
            .into_response(),
    }
}

async fn healthz() -> &'static str {
    "ok"
}
