use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{format_description::well_known::Iso8601, PrimitiveDateTime};
use utoipa::{IntoParams, ToSchema};

use crate::{fees, ApiError, AppState, ErrorBody, FeeQuote, VEHICLE_FORBIDDEN};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeeParams {
    /// Tallinn, Tartu or Pärnu (any case)
    pub city: Option<String>,
    /// car, bike or scooter (any case)
    pub vehicle: Option<String>,
    /// Local date-time in ISO-8601, e.g. 2024-03-20T14:30:00; latest weather when omitted
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeResponse {
    pub fee: f64,
    pub city: String,
    pub vehicle: String,
    pub date_time: Option<String>,
}

fn parse_date_time(raw: Option<&str>) -> Result<Option<PrimitiveDateTime>, fees::Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => PrimitiveDateTime::parse(value, &Iso8601::DEFAULT)
            .map(Some)
            .map_err(|e| fees::Error::BadInput(format!("Invalid dateTime {}: {}", value, e))),
    }
}

#[utoipa::path(
    get,
    path = "/fee",
    params(FeeParams),
    responses(
        (status = OK, description = "Delivery fee for the city and vehicle", body = FeeResponse),
        (
            status = BAD_REQUEST,
            description = "Bad city, vehicle or dateTime, or no weather for that time",
            body = ErrorBody
        ),
        (
            status = FORBIDDEN,
            description = "Weather forbids the selected vehicle",
            body = ErrorBody
        ),
        (
            status = SERVICE_UNAVAILABLE,
            description = "Fee configuration is incomplete",
            body = ErrorBody
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read fee data", body = ErrorBody)
    ))]
pub async fn get_fee(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeeParams>,
) -> Result<Json<FeeResponse>, ApiError> {
    let at = parse_date_time(params.date_time.as_deref())?;
    let quote = state
        .calculator
        .quote(params.city.as_deref(), params.vehicle.as_deref(), at)
        .await?;

    match quote {
        FeeQuote::VehicleForbidden => {
            info!(
                "quote refused, {:?} forbidden in {:?}",
                params.vehicle, params.city
            );
            Err(ApiError::new(StatusCode::FORBIDDEN, VEHICLE_FORBIDDEN))
        }
        FeeQuote::Fee(fee) => Ok(Json(FeeResponse {
            fee,
            city: params.city.unwrap_or_default().to_lowercase(),
            vehicle: params.vehicle.unwrap_or_default().to_lowercase(),
            date_time: params.date_time.filter(|d| !d.trim().is_empty()),
        })),
    }
}
