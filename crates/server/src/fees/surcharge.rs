//! Weather surcharge rules.
//!
//! Each sub-rule maps one weather value to either an additive fee or
//! [`Surcharge::Forbidden`]. A rule only applies to the vehicles listed in
//! its `vehicle_types`; for anything else it contributes nothing.

use log::debug;

use super::{Error, RuleKind, RAIN, SNOW_OR_SLEET};
use crate::{
    PhenomenonRule, SurchargeRuleData, TemperatureRule, Vehicle, WeatherObservation, WindRule,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surcharge {
    Fee(f64),
    Forbidden,
}

impl Surcharge {
    pub const NONE: Surcharge = Surcharge::Fee(0.0);

    /// Sums two surcharges; `Forbidden` absorbs any fee.
    pub fn and(self, other: Surcharge) -> Surcharge {
        match (self, other) {
            (Surcharge::Fee(a), Surcharge::Fee(b)) => Surcharge::Fee(a + b),
            _ => Surcharge::Forbidden,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Surcharge::Forbidden)
    }
}

impl TemperatureRule {
    pub fn surcharge(&self, air_temperature: f64) -> Surcharge {
        if air_temperature <= self.less_than {
            Surcharge::Fee(self.less_than_fee)
        } else if self.between_min < air_temperature && air_temperature < self.between_max {
            Surcharge::Fee(self.between_fee)
        } else {
            Surcharge::NONE
        }
    }
}

impl WindRule {
    /// The between band is strict on both ends and is checked first; the
    /// forbidden cutoff is inclusive and only applies outside the band.
    pub fn surcharge(&self, wind_speed: f64) -> Surcharge {
        if self.between_min < wind_speed && wind_speed < self.between_max {
            Surcharge::Fee(self.between_fee)
        } else if wind_speed >= self.forbidden_speed {
            Surcharge::Forbidden
        } else {
            Surcharge::NONE
        }
    }
}

impl PhenomenonRule {
    /// Snow/sleet and rain categories win over the forbidden list.
    pub fn surcharge(&self, phenomenon: &str) -> Surcharge {
        if SNOW_OR_SLEET.contains(&phenomenon) {
            Surcharge::Fee(self.snow_or_sleet_fee)
        } else if RAIN.contains(&phenomenon) {
            Surcharge::Fee(self.rain_fee)
        } else if self.forbidden_phenomenons.iter().any(|f| f == phenomenon) {
            Surcharge::Forbidden
        } else {
            Surcharge::NONE
        }
    }
}

/// All three rules as read for a single quote
#[derive(Debug, Clone, PartialEq)]
pub struct SurchargeRules {
    pub temperature: TemperatureRule,
    pub wind: WindRule,
    pub phenomenon: PhenomenonRule,
}

impl SurchargeRules {
    /// Reads the active rows; a missing one is reported as [`Error::NotConfigured`].
    pub async fn load(store: &dyn SurchargeRuleData) -> Result<Self, Error> {
        let temperature = store
            .find_temperature_rule()
            .await?
            .ok_or(Error::NotConfigured(RuleKind::Temperature))?;
        let wind = store
            .find_wind_rule()
            .await?
            .ok_or(Error::NotConfigured(RuleKind::Wind))?;
        let phenomenon = store
            .find_phenomenon_rule()
            .await?
            .ok_or(Error::NotConfigured(RuleKind::Phenomenon))?;

        Ok(Self {
            temperature,
            wind,
            phenomenon,
        })
    }

    pub fn evaluate(
        &self,
        vehicle: Vehicle,
        observation: Option<&WeatherObservation>,
    ) -> Surcharge {
        let Some(observation) = observation else {
            debug!("no weather observation, skipping surcharge for {}", vehicle);
            return Surcharge::NONE;
        };

        let mut total = Surcharge::NONE;
        if self.temperature.vehicle_types.contains(&vehicle) {
            total = total.and(self.temperature.surcharge(observation.air_temperature));
        }
        if self.wind.vehicle_types.contains(&vehicle) {
            total = total.and(self.wind.surcharge(observation.wind_speed));
            if total.is_forbidden() {
                return total;
            }
        }
        if self.phenomenon.vehicle_types.contains(&vehicle) {
            total = total.and(self.phenomenon.surcharge(&observation.weather_phenomenon));
        }
        total
    }
}
