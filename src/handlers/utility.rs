//! Utility handlers: jokes, stats, credits and the world clock

use crate::handlers::AppState;
use crate::models::JokeResponse;
use crate::services::{jokes, world_time};
use crate::storage::UsageCounters;
use crate::utils::error::{AppError, AppResult};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /api/joke
pub async fn joke() -> Json<JokeResponse> {
    Json(JokeResponse {
        joke: jokes::random_joke().to_string(),
    })
}

/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> AppResult<Json<UsageCounters>> {
    Ok(Json(state.counters.read().await?))
}

/// GET /api/credits
pub async fn credits(State(state): State<Arc<AppState>>) -> Json<Value> {
    let credits = &state.config.credits;
    Json(json!({
        "service": credits.service,
        "version": env!("CARGO_PKG_VERSION"),
        "developer": credits.developer,
        "api_credits": credits.api_credits,
        "channel": credits.channel,
        "github": credits.github,
        "portfolio": credits.portfolio,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TimeQuery {
    pub city: Option<String>,
}

/// Local time of one city, or of every supported city
///
/// GET /api/utility/time[?city=<name>]
pub async fn city_time(Query(query): Query<TimeQuery>) -> AppResult<Json<Value>> {
    match query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(city) => {
            let time = world_time::city_time(city)
                .ok_or_else(|| AppError::NotFound(format!("unsupported city '{}'", city)))?;
            Ok(Json(serde_json::to_value(time)?))
        }
        None => Ok(Json(json!({ "cities": world_time::all_cities() }))),
    }
}
