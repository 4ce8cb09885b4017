//! HTTP companion service.
//!
//! Three JSON endpoints backed by the sled [`GameStore`]:
//!
//! - `POST /api/game/save` `{userId, gameState}`
//! - `POST /api/game/load` `{userId}`
//! - `POST /api/exp/calculateOffline` `{lastOnlineTimestamp, offlineExpRate}`
//!
//! Every response body is JSON. Unknown routes (and wrong methods on known
//! ones) answer 404 `{"message":"Endpoint not found."}`. Any `OPTIONS`
//! request answers 204.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{Config, ServerConfig};
use crate::game::errors::GameError;
use crate::game::interpreter::{Clock, SystemClock};
use crate::game::progression::{offline_experience, offline_percentage};
use crate::game::storage::GameStore;
use crate::logutil::short_id;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GameStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: GameStore) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    user_id: String,
    game_state: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadRequest {
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfflineRequest {
    /// Epoch milliseconds; fractional values are accepted.
    last_online_timestamp: f64,
    offline_exp_rate: f64,
}

/// Handler failure mapped onto the JSON error shapes.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(&'static str),
    Internal(String),
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Bad Request", "error": msg })),
            )
                .into_response(),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                error!("request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error", "error": msg })),
                )
                    .into_response()
            }
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn save_game(State(st): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let req: SaveRequest = parse_body(&body)?;
    st.store.save(&req.user_id, &req.game_state)?;
    info!("Game state saved for {}", short_id(&req.user_id));
    Ok(Json(json!({ "message": "Game state saved." })))
}

async fn load_game(State(st): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let req: LoadRequest = parse_body(&body)?;
    match st.store.load(&req.user_id)? {
        Some(game_state) => Ok(Json(json!({ "gameState": game_state }))),
        None => Err(ApiError::NotFound("No game state found.")),
    }
}

async fn calculate_offline(
    State(st): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: OfflineRequest = parse_body(&body)?;
    let rate = req.offline_exp_rate;
    if !rate.is_finite() || rate < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "offlineExpRate must be a non-negative number (got {})",
            rate
        )));
    }
    if !req.last_online_timestamp.is_finite() {
        return Err(ApiError::BadRequest(
            "lastOnlineTimestamp must be a finite number".to_string(),
        ));
    }
    let now_ms = st.clock.now().timestamp_millis();
    let gained = offline_experience(req.last_online_timestamp as i64, now_ms, rate);
    Ok(Json(json!({
        "gainedExp": format!("{:.2}", gained),
        "percentage": offline_percentage(gained, rate),
    })))
}

async fn not_found(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    ApiError::NotFound("Endpoint not found.").into_response()
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = match config.allowed_origin.as_str() {
        "*" => AllowOrigin::any(),
        other => match HeaderValue::from_str(other) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                log::warn!("Invalid allowed_origin '{}', allowing any origin", other);
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/game/save", post(save_game).fallback(not_found))
        .route("/api/game/load", post(load_game).fallback(not_found))
        .route(
            "/api/exp/calculateOffline",
            post(calculate_offline).fallback(not_found),
        )
        .fallback(not_found)
        .layer(cors_layer(config))
        .with_state(state)
}

/// Open the store and serve until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let store = GameStore::open(&config.storage.db_path)
        .with_context(|| format!("open save store at {}", config.storage.db_path))?;
    let app = router(AppState::new(store), &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("bind http {}", config.server.bind))?;
    info!("Realm service listening on {}", config.server.bind);
    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}
