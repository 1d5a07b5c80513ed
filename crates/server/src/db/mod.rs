mod sqlite;

pub use sqlite::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Vehicle;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to (de)serialize stored list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid update: {0}")]
    Invalid(String),
    #[error("Database writer unavailable: {0}")]
    Writer(String),
}

/// Flat per-vehicle delivery rates for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionalBaseFee {
    pub id: i64,
    /// Lowercased city name
    pub city: String,
    pub car_fee: f64,
    pub bike_fee: f64,
    pub scooter_fee: f64,
}

impl RegionalBaseFee {
    pub fn fee_for(&self, vehicle: Vehicle) -> f64 {
        match vehicle {
            Vehicle::Car => self.car_fee,
            Vehicle::Bike => self.bike_fee,
            Vehicle::Scooter => self.scooter_fee,
        }
    }
}

/// Partial update of a [`RegionalBaseFee`]; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaseFeeUpdate {
    pub car_fee: Option<f64>,
    pub bike_fee: Option<f64>,
    pub scooter_fee: Option<f64>,
}

impl BaseFeeUpdate {
    pub fn apply(&self, fee: &mut RegionalBaseFee) -> Result<(), Error> {
        fee.car_fee = checked_fee("carFee", self.car_fee)?.unwrap_or(fee.car_fee);
        fee.bike_fee = checked_fee("bikeFee", self.bike_fee)?.unwrap_or(fee.bike_fee);
        fee.scooter_fee = checked_fee("scooterFee", self.scooter_fee)?.unwrap_or(fee.scooter_fee);
        Ok(())
    }
}

/// One reading from a weather station, as stored by the ingestion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    pub station: String,
    #[serde(default)]
    pub station_wmo: Option<String>,
    pub air_temperature: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather_phenomenon: String,
    /// Seconds since the unix epoch, UTC
    pub observation_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRule {
    pub id: i64,
    pub vehicle_types: Vec<Vehicle>,
    pub less_than: f64,
    pub less_than_fee: f64,
    pub between_min: f64,
    pub between_max: f64,
    pub between_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindRule {
    pub id: i64,
    pub vehicle_types: Vec<Vehicle>,
    pub between_min: f64,
    pub between_max: f64,
    pub between_fee: f64,
    pub forbidden_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhenomenonRule {
    pub id: i64,
    pub vehicle_types: Vec<Vehicle>,
    pub snow_or_sleet_fee: f64,
    pub rain_fee: f64,
    pub forbidden_phenomenons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRuleUpdate {
    pub vehicle_types: Option<Vec<String>>,
    pub less_than: Option<f64>,
    pub less_than_fee: Option<f64>,
    pub between_min: Option<f64>,
    pub between_max: Option<f64>,
    pub between_fee: Option<f64>,
}

impl TemperatureRuleUpdate {
    pub fn apply(&self, rule: &mut TemperatureRule) -> Result<(), Error> {
        if let Some(types) = &self.vehicle_types {
            rule.vehicle_types = parse_vehicle_types(types)?;
        }
        rule.less_than = self.less_than.unwrap_or(rule.less_than);
        rule.less_than_fee =
            checked_fee("lessThanFee", self.less_than_fee)?.unwrap_or(rule.less_than_fee);
        rule.between_min = self.between_min.unwrap_or(rule.between_min);
        rule.between_max = self.between_max.unwrap_or(rule.between_max);
        rule.between_fee = checked_fee("betweenFee", self.between_fee)?.unwrap_or(rule.between_fee);
        check_band(rule.between_min, rule.between_max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindRuleUpdate {
    pub vehicle_types: Option<Vec<String>>,
    pub between_min: Option<f64>,
    pub between_max: Option<f64>,
    pub between_fee: Option<f64>,
    pub forbidden_speed: Option<f64>,
}

impl WindRuleUpdate {
    pub fn apply(&self, rule: &mut WindRule) -> Result<(), Error> {
        if let Some(types) = &self.vehicle_types {
            rule.vehicle_types = parse_vehicle_types(types)?;
        }
        rule.between_min = self.between_min.unwrap_or(rule.between_min);
        rule.between_max = self.between_max.unwrap_or(rule.between_max);
        rule.between_fee = checked_fee("betweenFee", self.between_fee)?.unwrap_or(rule.between_fee);
        rule.forbidden_speed = self.forbidden_speed.unwrap_or(rule.forbidden_speed);
        check_band(rule.between_min, rule.between_max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhenomenonRuleUpdate {
    pub vehicle_types: Option<Vec<String>>,
    pub snow_or_sleet_fee: Option<f64>,
    pub rain_fee: Option<f64>,
    pub forbidden_phenomenons: Option<Vec<String>>,
}

impl PhenomenonRuleUpdate {
    pub fn apply(&self, rule: &mut PhenomenonRule) -> Result<(), Error> {
        if let Some(types) = &self.vehicle_types {
            rule.vehicle_types = parse_vehicle_types(types)?;
        }
        rule.snow_or_sleet_fee = checked_fee("snowOrSleetFee", self.snow_or_sleet_fee)?
            .unwrap_or(rule.snow_or_sleet_fee);
        rule.rain_fee = checked_fee("rainFee", self.rain_fee)?.unwrap_or(rule.rain_fee);
        if let Some(forbidden) = &self.forbidden_phenomenons {
            rule.forbidden_phenomenons = forbidden.clone();
        }
        Ok(())
    }
}

fn checked_fee(field: &str, value: Option<f64>) -> Result<Option<f64>, Error> {
    match value {
        Some(fee) if !fee.is_finite() || fee < 0.0 => Err(Error::Invalid(format!(
            "{} must be a non-negative number, got {}",
            field, fee
        ))),
        other => Ok(other),
    }
}

fn check_band(min: f64, max: f64) -> Result<(), Error> {
    if min > max {
        return Err(Error::Invalid(format!(
            "betweenMin ({}) must not be greater than betweenMax ({})",
            min, max
        )));
    }
    Ok(())
}

fn parse_vehicle_types(types: &[String]) -> Result<Vec<Vehicle>, Error> {
    types
        .iter()
        .map(|t| {
            t.parse::<Vehicle>()
                .map_err(|_| Error::Invalid(format!("unknown vehicle type: {}", t)))
        })
        .collect()
}

#[async_trait]
pub trait BaseFeeData: Send + Sync {
    async fn find_base_fee(&self, city: &str) -> Result<Option<RegionalBaseFee>, Error>;
    async fn all_base_fees(&self) -> Result<Vec<RegionalBaseFee>, Error>;
    /// Returns `None` when no row exists for `city`
    async fn update_base_fee(
        &self,
        city: &str,
        update: BaseFeeUpdate,
    ) -> Result<Option<RegionalBaseFee>, Error>;
}

#[async_trait]
pub trait WeatherData: Send + Sync {
    async fn find_latest_observation(
        &self,
        station: &str,
    ) -> Result<Option<WeatherObservation>, Error>;
    async fn find_observation_at(
        &self,
        station: &str,
        timestamp: i64,
    ) -> Result<Option<WeatherObservation>, Error>;
    /// Appends observations, returns how many rows were written
    async fn add_observations(&self, observations: Vec<WeatherObservation>) -> Result<u64, Error>;
}

/// The three singleton surcharge configurations. Each `find_*` returns the
/// active row, `None` when the deployment never seeded one.
#[async_trait]
pub trait SurchargeRuleData: Send + Sync {
    async fn find_temperature_rule(&self) -> Result<Option<TemperatureRule>, Error>;
    async fn find_wind_rule(&self) -> Result<Option<WindRule>, Error>;
    async fn find_phenomenon_rule(&self) -> Result<Option<PhenomenonRule>, Error>;
    async fn update_temperature_rule(
        &self,
        update: TemperatureRuleUpdate,
    ) -> Result<Option<TemperatureRule>, Error>;
    async fn update_wind_rule(&self, update: WindRuleUpdate) -> Result<Option<WindRule>, Error>;
    async fn update_phenomenon_rule(
        &self,
        update: PhenomenonRuleUpdate,
    ) -> Result<Option<PhenomenonRule>, Error>;
}
