//! HTTP surface: chart frames, current parameters, signals and manual triggers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use engine::chart::{ChartFrame, ChartRequest};
use engine::controller::Controller;
use engine::data::{CandleSeries, CandleStore};
use engine::portfolio::LedgerSnapshot;
use engine::strategy::TradeParams;
use engine::EngineError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub candles: Arc<dyn CandleStore>,
}

/// JSON error body with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match e {
            EngineError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/candle", get(candle))
        .route("/api/params", get(params))
        .route("/api/signals", get(signals))
        .route("/api/trade", post(trade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("GIT_HASH"),
        "build_time": env!("BUILD_TIME"),
    }))
}

async fn candle(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ChartFrame>, ApiError> {
    let config = state.controller.config();
    let request = ChartRequest::from_query(&query, &config.product_code, config.trade_duration)?;

    let candles = state
        .candles
        .latest_candles(&request.product_code, request.duration, request.limit)
        .await?;
    let series = CandleSeries::from_vec(candles);
    let Some(first) = series.first() else {
        error!(product_code = %request.product_code, duration = %request.duration, "no candles");
        return Err(ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "no candles".to_string(),
        });
    };

    let events = if request.events {
        Some(state.controller.events_after(first.time).await?)
    } else {
        None
    };
    Ok(Json(ChartFrame::build(&request, &series, events)))
}

async fn params(State(state): State<AppState>) -> Json<Option<TradeParams>> {
    Json(state.controller.current_params())
}

async fn signals(State(state): State<AppState>) -> Json<LedgerSnapshot> {
    Json(state.controller.ledger_snapshot().await)
}

async fn trade(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let busy = state.controller.is_busy();
    state.controller.trigger();
    (StatusCode::ACCEPTED, Json(json!({ "triggered": true, "busy": busy })))
}
