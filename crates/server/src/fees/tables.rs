use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Supported cities (lowercased) and the weather station reporting for each.
pub const CITY_STATIONS: [(&str, &str); 3] = [
    ("tallinn", "Tallinn-Harku"),
    ("tartu", "Tartu-Tõravere"),
    ("pärnu", "Pärnu"),
];

pub const SNOW_OR_SLEET: [&str; 10] = [
    "Light snow shower",
    "Moderate snow shower",
    "Heavy snow shower",
    "Light snowfall",
    "Moderate snowfall",
    "Heavy snowfall",
    "Blowing snow",
    "Drifting snow",
    "Light sleet",
    "Moderate sleet",
];

pub const RAIN: [&str; 6] = [
    "Light shower",
    "Moderate shower",
    "Heavy shower",
    "Light rain",
    "Moderate rain",
    "Heavy rain",
];

/// Station for an already lowercased city name
pub fn station_for(city: &str) -> Option<&'static str> {
    CITY_STATIONS
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, station)| *station)
}

pub fn is_known_station(station: &str) -> bool {
    CITY_STATIONS.iter().any(|(_, s)| *s == station)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    Car,
    Bike,
    Scooter,
}

impl Vehicle {
    pub const ALL: [Vehicle; 3] = [Vehicle::Car, Vehicle::Bike, Vehicle::Scooter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Car => "car",
            Vehicle::Bike => "bike",
            Vehicle::Scooter => "scooter",
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVehicle(pub String);

impl fmt::Display for UnknownVehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vehicle: {}", self.0)
    }
}

impl std::error::Error for UnknownVehicle {}

impl FromStr for Vehicle {
    type Err = UnknownVehicle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "car" => Ok(Vehicle::Car),
            "bike" => Ok(Vehicle::Bike),
            "scooter" => Ok(Vehicle::Scooter),
            _ => Err(UnknownVehicle(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_city_has_a_station() {
        assert_eq!(station_for("tallinn"), Some("Tallinn-Harku"));
        assert_eq!(station_for("tartu"), Some("Tartu-Tõravere"));
        assert_eq!(station_for("pärnu"), Some("Pärnu"));
        assert_eq!(station_for("Tallinn"), None);
        assert_eq!(station_for("narva"), None);
    }

    #[test]
    fn vehicle_parsing_ignores_case() {
        assert_eq!("Car".parse::<Vehicle>(), Ok(Vehicle::Car));
        assert_eq!("SCOOTER".parse::<Vehicle>(), Ok(Vehicle::Scooter));
        assert!("truck".parse::<Vehicle>().is_err());
        assert!("".parse::<Vehicle>().is_err());
    }

    #[test]
    fn phenomenon_categories_do_not_overlap() {
        assert!(SNOW_OR_SLEET.iter().all(|label| !RAIN.contains(label)));
    }
}
