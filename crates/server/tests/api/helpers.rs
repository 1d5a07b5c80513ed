use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use fee_server::{app, db, AppState, Database, WeatherData, WeatherObservation};
use hyper::{header, Method};
use mockall::mock;
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;
use uuid::Uuid;

mock! {
    pub WeatherAccess {}

    #[async_trait]
    impl WeatherData for WeatherAccess {
        async fn find_latest_observation(
            &self,
            station: &str,
        ) -> Result<Option<WeatherObservation>, db::Error>;
        async fn find_observation_at(
            &self,
            station: &str,
            timestamp: i64,
        ) -> Result<Option<WeatherObservation>, db::Error>;
        async fn add_observations(
            &self,
            observations: Vec<WeatherObservation>,
        ) -> Result<u64, db::Error>;
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: Arc<Database>,
    pub data_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

async fn test_database() -> (Arc<Database>, PathBuf) {
    let data_dir = std::env::temp_dir().join(format!("fee-server-test-{}", Uuid::new_v4()));
    let db = Database::new(data_dir.to_str().unwrap())
        .await
        .expect("failed to set up test database");
    (Arc::new(db), data_dir)
}

/// App backed entirely by a fresh, seeded sqlite database
pub async fn spawn_app() -> TestApp {
    let (db, data_dir) = test_database().await;
    let state = AppState::new(db.clone(), db.clone(), db.clone());
    TestApp {
        app: app(state),
        db,
        data_dir,
    }
}

/// Seeded sqlite for rates and rules, `weather` for observations
pub async fn spawn_app_with_weather(weather: Arc<dyn WeatherData>) -> TestApp {
    let (db, data_dir) = test_database().await;
    let state = AppState::new(db.clone(), weather, db.clone());
    TestApp {
        app: app(state),
        db,
        data_dir,
    }
}

pub fn observation(
    station: &str,
    air_temperature: f64,
    wind_speed: f64,
    weather_phenomenon: &str,
    observation_timestamp: i64,
) -> WeatherObservation {
    WeatherObservation {
        station: station.to_owned(),
        station_wmo: None,
        air_temperature,
        wind_speed,
        weather_phenomenon: weather_phenomenon.to_owned(),
        observation_timestamp,
    }
}
