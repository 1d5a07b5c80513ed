use axum::{
    extract::{Path, State},
    Json,
};
use log::info;
use std::sync::Arc;

use crate::{ApiError, AppState, BaseFeeUpdate, ErrorBody, RegionalBaseFee};

fn city_not_found(city: &str) -> ApiError {
    ApiError::not_found(format!("Could not find regional base fee for city {}", city))
}

#[utoipa::path(
    get,
    path = "/base-fees",
    responses(
        (
            status = OK,
            description = "Base fees of every configured city",
            body = Vec<RegionalBaseFee>
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read base fees", body = ErrorBody)
    ))]
pub async fn list_base_fees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RegionalBaseFee>>, ApiError> {
    Ok(Json(state.base_fees.all_base_fees().await?))
}

#[utoipa::path(
    get,
    path = "/base-fees/{city}",
    params(
        ("city" = String, Path, description = "City name, any case"),
    ),
    responses(
        (status = OK, description = "Base fees of the city", body = RegionalBaseFee),
        (status = NOT_FOUND, description = "No base fees for the city", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read base fees", body = ErrorBody)
    ))]
pub async fn get_base_fee(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<Json<RegionalBaseFee>, ApiError> {
    let city = city.to_lowercase();
    state
        .base_fees
        .find_base_fee(&city)
        .await?
        .map(Json)
        .ok_or_else(|| city_not_found(&city))
}

#[utoipa::path(
    patch,
    path = "/base-fees/{city}",
    params(
        ("city" = String, Path, description = "City name, any case"),
    ),
    request_body = BaseFeeUpdate,
    responses(
        (status = OK, description = "Updated base fees", body = RegionalBaseFee),
        (status = BAD_REQUEST, description = "A fee is negative", body = ErrorBody),
        (status = NOT_FOUND, description = "No base fees for the city", body = ErrorBody),
        (
            status = INTERNAL_SERVER_ERROR,
            description = "Failed to store base fees",
            body = ErrorBody
        )
    ))]
pub async fn update_base_fee(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
    Json(update): Json<BaseFeeUpdate>,
) -> Result<Json<RegionalBaseFee>, ApiError> {
    let city = city.to_lowercase();
    let updated = state
        .base_fees
        .update_base_fee(&city, update)
        .await?
        .ok_or_else(|| city_not_found(&city))?;

    info!("base fees for {} updated: {:?}", city, updated);
    Ok(Json(updated))
}
