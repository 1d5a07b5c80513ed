use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{fees::is_known_station, ApiError, AppState, ErrorBody, WeatherObservation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredObservations {
    pub stored: u64,
}

#[utoipa::path(
    post,
    path = "/weather/observations",
    request_body = Vec<WeatherObservation>,
    responses(
        (status = OK, description = "Observations appended", body = StoredObservations),
        (
            status = BAD_REQUEST,
            description = "Observation for a station outside the city table",
            body = ErrorBody
        ),
        (
            status = INTERNAL_SERVER_ERROR,
            description = "Failed to store observations",
            body = ErrorBody
        )
    ))]
pub async fn add_observations(
    State(state): State<Arc<AppState>>,
    Json(observations): Json<Vec<WeatherObservation>>,
) -> Result<Json<StoredObservations>, ApiError> {
    if let Some(unknown) = observations
        .iter()
        .find(|o| !is_known_station(&o.station))
    {
        warn!("rejecting observations, unknown station {}", unknown.station);
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Unknown weather station: {}", unknown.station),
        ));
    }

    let stored = state.weather.add_observations(observations).await?;
    info!("stored {} weather observations", stored);
    Ok(Json(StoredObservations { stored }))
}

#[utoipa::path(
    get,
    path = "/weather/observations/{station}/latest",
    params(
        ("station" = String, Path, description = "Station name, e.g. Tallinn-Harku"),
    ),
    responses(
        (
            status = OK,
            description = "Most recent observation of the station",
            body = WeatherObservation
        ),
        (
            status = NOT_FOUND,
            description = "No observation stored for the station",
            body = ErrorBody
        ),
        (
            status = INTERNAL_SERVER_ERROR,
            description = "Failed to read observations",
            body = ErrorBody
        )
    ))]
pub async fn latest_observation(
    State(state): State<Arc<AppState>>,
    Path(station): Path<String>,
) -> Result<Json<WeatherObservation>, ApiError> {
    state
        .weather
        .find_latest_observation(&station)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No observation for station {}", station)))
}
