use axum::{extract::State, Json};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    fees::{RuleKind, SurchargeRules},
    ApiError, AppState, ErrorBody, PhenomenonRule, PhenomenonRuleUpdate, TemperatureRule,
    TemperatureRuleUpdate, WindRule, WindRuleUpdate,
};

/// The full surcharge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtraFeeConditions {
    pub air_temperature_conditions: TemperatureRule,
    pub wind_speed_conditions: WindRule,
    pub phenomenon_conditions: PhenomenonRule,
}

impl From<SurchargeRules> for ExtraFeeConditions {
    fn from(rules: SurchargeRules) -> Self {
        Self {
            air_temperature_conditions: rules.temperature,
            wind_speed_conditions: rules.wind,
            phenomenon_conditions: rules.phenomenon,
        }
    }
}

#[utoipa::path(
    get,
    path = "/extra-fees",
    responses(
        (status = OK, description = "All extra fee conditions", body = ExtraFeeConditions),
        (
            status = SERVICE_UNAVAILABLE,
            description = "A condition set is not configured",
            body = ErrorBody
        ),
        (
            status = INTERNAL_SERVER_ERROR,
            description = "Failed to read extra fee conditions",
            body = ErrorBody
        )
    ))]
pub async fn list_extra_fees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExtraFeeConditions>, ApiError> {
    let rules = SurchargeRules::load(state.rules.as_ref()).await?;
    Ok(Json(rules.into()))
}

#[utoipa::path(
    get,
    path = "/extra-fees/air-temperature-conditions",
    responses(
        (status = OK, description = "Air temperature conditions", body = TemperatureRule),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn get_temperature_conditions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TemperatureRule>, ApiError> {
    state
        .rules
        .find_temperature_rule()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_configured(RuleKind::Temperature))
}

#[utoipa::path(
    patch,
    path = "/extra-fees/air-temperature-conditions",
    request_body = TemperatureRuleUpdate,
    responses(
        (status = OK, description = "Updated air temperature conditions", body = TemperatureRule),
        (
            status = BAD_REQUEST,
            description = "Negative fee, unknown vehicle type or inverted band",
            body = ErrorBody
        ),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn update_temperature_conditions(
    State(state): State<Arc<AppState>>,
    Json(update): Json<TemperatureRuleUpdate>,
) -> Result<Json<TemperatureRule>, ApiError> {
    let rule = state
        .rules
        .update_temperature_rule(update)
        .await?
        .ok_or_else(|| ApiError::not_configured(RuleKind::Temperature))?;
    info!("air temperature conditions updated: {:?}", rule);
    Ok(Json(rule))
}

#[utoipa::path(
    get,
    path = "/extra-fees/wind-speed-conditions",
    responses(
        (status = OK, description = "Wind speed conditions", body = WindRule),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn get_wind_conditions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WindRule>, ApiError> {
    state
        .rules
        .find_wind_rule()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_configured(RuleKind::Wind))
}

#[utoipa::path(
    patch,
    path = "/extra-fees/wind-speed-conditions",
    request_body = WindRuleUpdate,
    responses(
        (status = OK, description = "Updated wind speed conditions", body = WindRule),
        (
            status = BAD_REQUEST,
            description = "Negative fee, unknown vehicle type or inverted band",
            body = ErrorBody
        ),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn update_wind_conditions(
    State(state): State<Arc<AppState>>,
    Json(update): Json<WindRuleUpdate>,
) -> Result<Json<WindRule>, ApiError> {
    let rule = state
        .rules
        .update_wind_rule(update)
        .await?
        .ok_or_else(|| ApiError::not_configured(RuleKind::Wind))?;
    info!("wind speed conditions updated: {:?}", rule);
    Ok(Json(rule))
}

#[utoipa::path(
    get,
    path = "/extra-fees/phenomenon-conditions",
    responses(
        (status = OK, description = "Weather phenomenon conditions", body = PhenomenonRule),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn get_phenomenon_conditions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PhenomenonRule>, ApiError> {
    state
        .rules
        .find_phenomenon_rule()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_configured(RuleKind::Phenomenon))
}

#[utoipa::path(
    patch,
    path = "/extra-fees/phenomenon-conditions",
    request_body = PhenomenonRuleUpdate,
    responses(
        (status = OK, description = "Updated weather phenomenon conditions", body = PhenomenonRule),
        (
            status = BAD_REQUEST,
            description = "Negative fee or unknown vehicle type",
            body = ErrorBody
        ),
        (status = SERVICE_UNAVAILABLE, description = "Not configured", body = ErrorBody)
    ))]
pub async fn update_phenomenon_conditions(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PhenomenonRuleUpdate>,
) -> Result<Json<PhenomenonRule>, ApiError> {
    let rule = state
        .rules
        .update_phenomenon_rule(update)
        .await?
        .ok_or_else(|| ApiError::not_configured(RuleKind::Phenomenon))?;
    info!("weather phenomenon conditions updated: {:?}", rule);
    Ok(Json(rule))
}
