use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{future::Future, path::Path, str::FromStr, time::Duration};
use tokio::{
    fs::create_dir_all,
    sync::{mpsc, oneshot},
};

use super::{
    BaseFeeData, BaseFeeUpdate, Error, PhenomenonRule, PhenomenonRuleUpdate, RegionalBaseFee,
    SurchargeRuleData, TemperatureRule, TemperatureRuleUpdate, WeatherData, WeatherObservation,
    WindRule, WindRuleUpdate,
};

type WriteOperation = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

/// Funnels every write through one task so sqlite only ever sees a single writer.
pub struct DatabaseWriter {
    write_tx: mpsc::UnboundedSender<WriteOperation>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for DatabaseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseWriter {
    pub fn new() -> Self {
        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<WriteOperation>();

        let handle = tokio::spawn(async move {
            while let Some(future) = write_rx.recv().await {
                future.await;
            }
        });

        Self {
            write_tx,
            _handle: handle,
        }
    }

    pub async fn execute<T, F, Fut>(&self, pool: SqlitePool, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel::<Result<T, Error>>();

        let write_op = Box::pin(async move {
            let result = operation(pool).await;
            let _ = result_tx.send(result);
        });

        self.write_tx
            .send(write_op)
            .map_err(|_| Error::Writer(String::from("channel closed")))?;

        result_rx
            .await
            .map_err(|_| Error::Writer(String::from("failed to receive write result")))?
    }
}

pub struct Database {
    pool: SqlitePool,
    writer: DatabaseWriter,
}

impl Database {
    /// Opens (creating if needed) `fees.sqlite` inside `path` and runs migrations,
    /// which also seed the rate table and the surcharge rules.
    pub async fn new(path: &str) -> anyhow::Result<Self> {
        let db_path = format!("{}/fees.sqlite", path);

        if let Some(parent) = Path::new(&db_path).parent() {
            create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory: {parent:?}"))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("SQLite database initialized at: {}", db_path);

        Ok(Self {
            pool,
            writer: DatabaseWriter::new(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database connectivity check failed")?;
        Ok(())
    }

    /// Flush the WAL into the main database file, used on shutdown.
    pub async fn checkpoint(&self) {
        match sqlx::query("PRAGMA wal_checkpoint(TRUNCATE);")
            .execute(&self.pool)
            .await
        {
            Ok(_) => info!("WAL checkpoint completed successfully"),
            Err(e) => log::error!("WAL checkpoint failed: {}", e),
        }
    }
}

const BASE_FEE_COLUMNS: &str = "id, city, car_fee, bike_fee, scooter_fee";
const OBSERVATION_COLUMNS: &str =
    "station, station_wmo, air_temperature, wind_speed, weather_phenomenon, observation_timestamp";

fn row_to_base_fee(row: &SqliteRow) -> RegionalBaseFee {
    RegionalBaseFee {
        id: row.get("id"),
        city: row.get("city"),
        car_fee: row.get("car_fee"),
        bike_fee: row.get("bike_fee"),
        scooter_fee: row.get("scooter_fee"),
    }
}

fn row_to_observation(row: &SqliteRow) -> WeatherObservation {
    WeatherObservation {
        station: row.get("station"),
        station_wmo: row.get("station_wmo"),
        air_temperature: row.get("air_temperature"),
        wind_speed: row.get("wind_speed"),
        weather_phenomenon: row.get("weather_phenomenon"),
        observation_timestamp: row.get("observation_timestamp"),
    }
}

fn row_to_temperature_rule(row: &SqliteRow) -> Result<TemperatureRule, Error> {
    let vehicle_types: String = row.get("vehicle_types");
    Ok(TemperatureRule {
        id: row.get("id"),
        vehicle_types: serde_json::from_str(&vehicle_types)?,
        less_than: row.get("less_than"),
        less_than_fee: row.get("less_than_fee"),
        between_min: row.get("between_min"),
        between_max: row.get("between_max"),
        between_fee: row.get("between_fee"),
    })
}

fn row_to_wind_rule(row: &SqliteRow) -> Result<WindRule, Error> {
    let vehicle_types: String = row.get("vehicle_types");
    Ok(WindRule {
        id: row.get("id"),
        vehicle_types: serde_json::from_str(&vehicle_types)?,
        between_min: row.get("between_min"),
        between_max: row.get("between_max"),
        between_fee: row.get("between_fee"),
        forbidden_speed: row.get("forbidden_speed"),
    })
}

fn row_to_phenomenon_rule(row: &SqliteRow) -> Result<PhenomenonRule, Error> {
    let vehicle_types: String = row.get("vehicle_types");
    let forbidden: String = row.get("forbidden_phenomenons");
    Ok(PhenomenonRule {
        id: row.get("id"),
        vehicle_types: serde_json::from_str(&vehicle_types)?,
        snow_or_sleet_fee: row.get("snow_or_sleet_fee"),
        rain_fee: row.get("rain_fee"),
        forbidden_phenomenons: serde_json::from_str(&forbidden)?,
    })
}

async fn select_temperature_rule(pool: &SqlitePool) -> Result<Option<TemperatureRule>, Error> {
    sqlx::query(
        "SELECT id, vehicle_types, less_than, less_than_fee, between_min, between_max, between_fee
         FROM air_temperature_conditions ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    .as_ref()
    .map(row_to_temperature_rule)
    .transpose()
}

async fn select_wind_rule(pool: &SqlitePool) -> Result<Option<WindRule>, Error> {
    sqlx::query(
        "SELECT id, vehicle_types, between_min, between_max, between_fee, forbidden_speed
         FROM wind_speed_conditions ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    .as_ref()
    .map(row_to_wind_rule)
    .transpose()
}

async fn select_phenomenon_rule(pool: &SqlitePool) -> Result<Option<PhenomenonRule>, Error> {
    sqlx::query(
        "SELECT id, vehicle_types, snow_or_sleet_fee, rain_fee, forbidden_phenomenons
         FROM weather_phenomenon_conditions ORDER BY id LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    .as_ref()
    .map(row_to_phenomenon_rule)
    .transpose()
}

#[async_trait]
impl BaseFeeData for Database {
    async fn find_base_fee(&self, city: &str) -> Result<Option<RegionalBaseFee>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM regional_base_fee WHERE city = ?",
            BASE_FEE_COLUMNS
        ))
        .bind(city)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_base_fee))
    }

    async fn all_base_fees(&self) -> Result<Vec<RegionalBaseFee>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM regional_base_fee ORDER BY id",
            BASE_FEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_base_fee).collect())
    }

    async fn update_base_fee(
        &self,
        city: &str,
        update: BaseFeeUpdate,
    ) -> Result<Option<RegionalBaseFee>, Error> {
        let pool = self.pool.clone();
        let city = city.to_owned();

        self.writer
            .execute(pool, move |pool| async move {
                let row = sqlx::query(&format!(
                    "SELECT {} FROM regional_base_fee WHERE city = ?",
                    BASE_FEE_COLUMNS
                ))
                .bind(&city)
                .fetch_optional(&pool)
                .await?;
                let Some(mut fee) = row.as_ref().map(row_to_base_fee) else {
                    return Ok(None);
                };
                update.apply(&mut fee)?;

                sqlx::query(
                    "UPDATE regional_base_fee SET car_fee = ?, bike_fee = ?, scooter_fee = ?
                     WHERE id = ?",
                )
                .bind(fee.car_fee)
                .bind(fee.bike_fee)
                .bind(fee.scooter_fee)
                .bind(fee.id)
                .execute(&pool)
                .await?;
                debug!("updated base fee for {}", fee.city);
                Ok(Some(fee))
            })
            .await
    }
}

#[async_trait]
impl WeatherData for Database {
    async fn find_latest_observation(
        &self,
        station: &str,
    ) -> Result<Option<WeatherObservation>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM weather_observations WHERE station = ?
             ORDER BY observation_timestamp DESC, id DESC LIMIT 1",
            OBSERVATION_COLUMNS
        ))
        .bind(station)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_observation))
    }

    async fn find_observation_at(
        &self,
        station: &str,
        timestamp: i64,
    ) -> Result<Option<WeatherObservation>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM weather_observations
             WHERE station = ? AND observation_timestamp = ?
             ORDER BY id DESC LIMIT 1",
            OBSERVATION_COLUMNS
        ))
        .bind(station)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_observation))
    }

    async fn add_observations(&self, observations: Vec<WeatherObservation>) -> Result<u64, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let mut tx = pool.begin().await?;
                let mut written = 0;

                for observation in observations {
                    written += sqlx::query(
                        "INSERT INTO weather_observations
                         (station, station_wmo, air_temperature, wind_speed,
                          weather_phenomenon, observation_timestamp)
                         VALUES (?, ?, ?, ?, ?, ?)",
                    )
                    .bind(&observation.station)
                    .bind(&observation.station_wmo)
                    .bind(observation.air_temperature)
                    .bind(observation.wind_speed)
                    .bind(&observation.weather_phenomenon)
                    .bind(observation.observation_timestamp)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                }

                tx.commit().await?;
                Ok(written)
            })
            .await
    }
}

#[async_trait]
impl SurchargeRuleData for Database {
    async fn find_temperature_rule(&self) -> Result<Option<TemperatureRule>, Error> {
        select_temperature_rule(&self.pool).await
    }

    async fn find_wind_rule(&self) -> Result<Option<WindRule>, Error> {
        select_wind_rule(&self.pool).await
    }

    async fn find_phenomenon_rule(&self) -> Result<Option<PhenomenonRule>, Error> {
        select_phenomenon_rule(&self.pool).await
    }

    async fn update_temperature_rule(
        &self,
        update: TemperatureRuleUpdate,
    ) -> Result<Option<TemperatureRule>, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let Some(mut rule) = select_temperature_rule(&pool).await? else {
                    return Ok(None);
                };
                update.apply(&mut rule)?;

                sqlx::query(
                    "UPDATE air_temperature_conditions
                     SET vehicle_types = ?, less_than = ?, less_than_fee = ?,
                         between_min = ?, between_max = ?, between_fee = ?
                     WHERE id = ?",
                )
                .bind(serde_json::to_string(&rule.vehicle_types)?)
                .bind(rule.less_than)
                .bind(rule.less_than_fee)
                .bind(rule.between_min)
                .bind(rule.between_max)
                .bind(rule.between_fee)
                .bind(rule.id)
                .execute(&pool)
                .await?;
                Ok(Some(rule))
            })
            .await
    }

    async fn update_wind_rule(&self, update: WindRuleUpdate) -> Result<Option<WindRule>, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let Some(mut rule) = select_wind_rule(&pool).await? else {
                    return Ok(None);
                };
                update.apply(&mut rule)?;

                sqlx::query(
                    "UPDATE wind_speed_conditions
                     SET vehicle_types = ?, between_min = ?, between_max = ?,
                         between_fee = ?, forbidden_speed = ?
                     WHERE id = ?",
                )
                .bind(serde_json::to_string(&rule.vehicle_types)?)
                .bind(rule.between_min)
                .bind(rule.between_max)
                .bind(rule.between_fee)
                .bind(rule.forbidden_speed)
                .bind(rule.id)
                .execute(&pool)
                .await?;
                Ok(Some(rule))
            })
            .await
    }

    async fn update_phenomenon_rule(
        &self,
        update: PhenomenonRuleUpdate,
    ) -> Result<Option<PhenomenonRule>, Error> {
        let pool = self.pool.clone();

        self.writer
            .execute(pool, move |pool| async move {
                let Some(mut rule) = select_phenomenon_rule(&pool).await? else {
                    return Ok(None);
                };
                update.apply(&mut rule)?;

                sqlx::query(
                    "UPDATE weather_phenomenon_conditions
                     SET vehicle_types = ?, snow_or_sleet_fee = ?, rain_fee = ?,
                         forbidden_phenomenons = ?
                     WHERE id = ?",
                )
                .bind(serde_json::to_string(&rule.vehicle_types)?)
                .bind(rule.snow_or_sleet_fee)
                .bind(rule.rain_fee)
                .bind(serde_json::to_string(&rule.forbidden_phenomenons)?)
                .bind(rule.id)
                .execute(&pool)
                .await?;
                Ok(Some(rule))
            })
            .await
    }
}
