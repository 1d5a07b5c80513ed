use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use slog::{error, info, warn, Logger};
use std::sync::Arc;

use crate::XmlFetcher;

/// Root of the ilmateenistus.ee observations document
#[derive(Debug, Deserialize)]
pub struct ObservationData {
    /// Seconds since the unix epoch; shared by every station in the document
    pub timestamp: i64,
    #[serde(rename = "station", default)]
    pub stations: Vec<StationReading>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationReading {
    pub name: String,
    #[serde(default)]
    pub wmocode: String,
    #[serde(default)]
    pub airtemperature: String,
    #[serde(default)]
    pub windspeed: String,
    #[serde(default)]
    pub phenomenon: String,
}

/// An observation in the shape the fee server's ingestion endpoint accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub station: String,
    pub station_wmo: Option<String>,
    pub air_temperature: f64,
    pub wind_speed: f64,
    pub weather_phenomenon: String,
    pub observation_timestamp: i64,
}

/// Empty readings are stored as zero; anything else must parse.
fn reading(logger: &Logger, station: &str, field: &str, raw: &str) -> Result<f64, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        warn!(logger, "{} has no {} reading, storing 0.0", station, field);
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .map_err(|e| anyhow!("invalid {} for {}: {:?} ({})", field, station, raw, e))
}

impl ObservationData {
    /// Keeps the readings of `stations`, stamped with the document timestamp.
    /// A station whose reading cannot be parsed is logged and left out.
    pub fn observations_for(&self, logger: &Logger, stations: &[String]) -> Vec<Observation> {
        let mut observations = vec![];
        for value in self.stations.iter() {
            if !stations.contains(&value.name) {
                continue;
            }

            let readings = reading(logger, &value.name, "airtemperature", &value.airtemperature)
                .and_then(|air| {
                    reading(logger, &value.name, "windspeed", &value.windspeed)
                        .map(|wind| (air, wind))
                });
            let (air_temperature, wind_speed) = match readings {
                Ok(values) => values,
                Err(e) => {
                    error!(logger, "skipping station: {}", e);
                    continue;
                }
            };

            let wmo = value.wmocode.trim();
            observations.push(Observation {
                station: value.name.clone(),
                station_wmo: (!wmo.is_empty()).then(|| wmo.to_owned()),
                air_temperature,
                wind_speed,
                weather_phenomenon: value.phenomenon.trim().to_owned(),
                observation_timestamp: self.timestamp,
            });
        }
        observations
    }
}

pub struct ObservationService {
    pub logger: Logger,
    pub fetcher: Arc<XmlFetcher>,
}

impl ObservationService {
    pub fn new(logger: Logger, fetcher: Arc<XmlFetcher>) -> Self {
        ObservationService { logger, fetcher }
    }

    pub async fn get_observations(
        &self,
        source_url: &str,
        stations: &[String],
    ) -> Result<Vec<Observation>, Error> {
        info!(self.logger, "fetching observations from {}", source_url);
        let raw_observation = self.fetcher.fetch_xml(source_url).await?;
        let converted_xml: ObservationData = serde_xml_rs::from_str(&raw_observation)?;
        info!(
            self.logger,
            "document at {} holds {} stations",
            converted_xml.timestamp,
            converted_xml.stations.len()
        );

        let observations = converted_xml.observations_for(&self.logger, stations);
        if observations.len() < stations.len() {
            warn!(
                self.logger,
                "only {} of {} configured stations reported",
                observations.len(),
                stations.len()
            );
        }
        Ok(observations)
    }
}
