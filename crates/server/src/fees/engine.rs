use log::{debug, info};
use std::sync::Arc;
use time::PrimitiveDateTime;

use super::{
    station_for, Error, FeeQuote, ObservationResolver, RateTable, Surcharge, SurchargeRules,
    Vehicle,
};
use crate::{BaseFeeData, SurchargeRuleData, WeatherData};

const INVALID_REQUEST: &str =
    "Invalid request. Make sure you specified the city and vehicle parameters properly.";
const UNREACHABLE_INSTANT: &str =
    "It is not possible to obtain weather data for the specified time period.";

/// Quotes delivery fees. Holds no state of its own; configuration and weather
/// are read from the stores on every call.
pub struct FeeCalculator {
    rates: RateTable,
    resolver: ObservationResolver,
    rules: Arc<dyn SurchargeRuleData>,
}

impl FeeCalculator {
    pub fn new(
        base_fees: Arc<dyn BaseFeeData>,
        weather: Arc<dyn WeatherData>,
        rules: Arc<dyn SurchargeRuleData>,
    ) -> Self {
        Self {
            rates: RateTable::new(base_fees),
            resolver: ObservationResolver::new(weather),
            rules,
        }
    }

    /// `at` is a local (Estonian) date-time; `None` quotes against the latest weather.
    pub async fn quote(
        &self,
        city: Option<&str>,
        vehicle: Option<&str>,
        at: Option<PrimitiveDateTime>,
    ) -> Result<FeeQuote, Error> {
        let (city, vehicle) = match (city, vehicle) {
            (Some(city), Some(vehicle)) if !city.is_empty() && !vehicle.is_empty() => {
                (city.to_lowercase(), vehicle.to_lowercase())
            }
            _ => return Err(Error::BadInput(INVALID_REQUEST.to_owned())),
        };
        let station =
            station_for(&city).ok_or_else(|| Error::BadInput(INVALID_REQUEST.to_owned()))?;
        let parsed_vehicle = vehicle
            .parse::<Vehicle>()
            .map_err(|_| Error::BadInput(INVALID_REQUEST.to_owned()))?;

        let base = self.rates.base_fee(&city, &vehicle).await?;

        let observation = match self.resolver.resolve(station, at).await {
            Err(Error::WeatherDataUnavailable { station, timestamp }) => {
                info!("no observation for {} at bucket {}", station, timestamp);
                return Err(Error::BadInput(UNREACHABLE_INSTANT.to_owned()));
            }
            Err(Error::InstantOutOfRange(at)) => {
                info!("{} cannot be aligned to an ingestion slot", at);
                return Err(Error::BadInput(UNREACHABLE_INSTANT.to_owned()));
            }
            other => other?,
        };

        let rules = SurchargeRules::load(self.rules.as_ref()).await?;
        match rules.evaluate(parsed_vehicle, observation.as_ref()) {
            Surcharge::Forbidden => {
                debug!("{} forbidden in {} by current weather", vehicle, city);
                Ok(FeeQuote::VehicleForbidden)
            }
            Surcharge::Fee(extra) => {
                debug!("{} in {}: base {} + extra {}", vehicle, city, base, extra);
                Ok(FeeQuote::Fee(base + extra))
            }
        }
    }
}
