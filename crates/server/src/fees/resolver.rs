use log::{debug, trace};
use std::sync::Arc;
use time::{Duration, PrimitiveDateTime};

use super::Error;
use crate::{WeatherData, WeatherObservation};

/// Observations are ingested every hour at this local minute.
pub const INGEST_MINUTE: u8 = 15;

/// Fixed offset between Estonian local time and UTC. Daylight saving time is
/// not taken into account.
pub const LOCAL_UTC_OFFSET_HOURS: i64 = 2;

/// The feed's timestamps can lag the ingestion slot by up to this many seconds.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 2;

/// Aligns a local date-time to the ingestion slot that covers it and returns
/// that slot's epoch seconds (UTC). `None` when the slot falls before the
/// earliest representable date.
pub fn bucket_timestamp(at: PrimitiveDateTime) -> Option<i64> {
    let minute = i64::from(at.minute());
    let into_hour = if minute >= i64::from(INGEST_MINUTE) {
        minute - i64::from(INGEST_MINUTE)
    } else {
        minute + 60 - i64::from(INGEST_MINUTE)
    };

    at.checked_sub(Duration::minutes(into_hour))
        .and_then(|t| t.checked_sub(Duration::seconds(i64::from(at.second()))))
        .and_then(|t| t.checked_sub(Duration::nanoseconds(i64::from(at.nanosecond()))))
        .and_then(|t| t.checked_sub(Duration::hours(LOCAL_UTC_OFFSET_HOURS)))
        .map(|t| t.assume_utc().unix_timestamp())
}

pub struct ObservationResolver {
    weather: Arc<dyn WeatherData>,
}

impl ObservationResolver {
    pub fn new(weather: Arc<dyn WeatherData>) -> Self {
        Self { weather }
    }

    /// `None` for `at` picks the station's latest observation, which may itself
    /// be absent. A requested instant must resolve or the call fails with
    /// [`Error::WeatherDataUnavailable`] or [`Error::InstantOutOfRange`].
    pub async fn resolve(
        &self,
        station: &str,
        at: Option<PrimitiveDateTime>,
    ) -> Result<Option<WeatherObservation>, Error> {
        match at {
            None => Ok(self.weather.find_latest_observation(station).await?),
            Some(at) => self.resolve_at(station, at).await.map(Some),
        }
    }

    async fn resolve_at(
        &self,
        station: &str,
        at: PrimitiveDateTime,
    ) -> Result<WeatherObservation, Error> {
        let timestamp = bucket_timestamp(at).ok_or(Error::InstantOutOfRange(at))?;
        debug!("{} at {} resolved to bucket {}", station, at, timestamp);

        for skew in 0..=TIMESTAMP_TOLERANCE_SECS {
            trace!("looking up {} at {}", station, timestamp - skew);
            if let Some(observation) = self
                .weather
                .find_observation_at(station, timestamp - skew)
                .await?
            {
                return Ok(observation);
            }
        }

        Err(Error::WeatherDataUnavailable {
            station: station.to_owned(),
            timestamp,
        })
    }
}
