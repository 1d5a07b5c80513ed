use crate::helpers::{
    observation, spawn_app, spawn_app_with_weather, MockWeatherAccess, TestApp,
};
use axum::http::StatusCode;
use serde_json::{json, to_value};
use std::sync::Arc;

// 2024-03-20 12:15:00 UTC, the slot covering 14:15-15:14 local time
const AFTERNOON_BUCKET: i64 = 1_710_936_900;

const INVALID_REQUEST: &str =
    "Invalid request. Make sure you specified the city and vehicle parameters properly.";

async fn store(app: &TestApp, station: &str, temp: f64, wind: f64, phenomenon: &str) {
    let stored = vec![observation(station, temp, wind, phenomenon, AFTERNOON_BUCKET)];
    let (status, _) = app
        .post("/weather/observations", to_value(stored).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn quotes_base_fee_when_no_weather_is_stored() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/fee?city=Tallinn&vehicle=car").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"fee": 4.0, "city": "tallinn", "vehicle": "car", "dateTime": null})
    );
}

#[tokio::test]
async fn extreme_cold_bike_in_tallinn() {
    let test_app = spawn_app().await;
    store(&test_app, "Tallinn-Harku", -15.0, 5.0, "").await;

    let (status, body) = test_app.get("/fee?city=tallinn&vehicle=bike").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee"], json!(4.0));
}

#[tokio::test]
async fn cold_and_windy_bike_adds_both_surcharges() {
    let test_app = spawn_app().await;
    store(&test_app, "Tallinn-Harku", -12.0, 15.0, "").await;

    let (status, body) = test_app.get("/fee?city=tallinn&vehicle=bike").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee"], json!(4.5));
}

#[tokio::test]
async fn thunder_forbids_bike() {
    let test_app = spawn_app().await;
    store(&test_app, "Tallinn-Harku", -12.0, 15.0, "Thunder").await;

    let (status, body) = test_app.get("/fee?city=tallinn&vehicle=bike").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"error": "Usage of selected vehicle type is forbidden"})
    );
}

#[tokio::test]
async fn light_rain_scooter() {
    let test_app = spawn_app().await;
    store(&test_app, "Tallinn-Harku", 10.0, 5.0, "Light rain").await;

    let (status, body) = test_app.get("/fee?city=tallinn&vehicle=scooter").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee"], json!(4.0));
}

#[tokio::test]
async fn car_ignores_weather() {
    let test_app = spawn_app().await;
    store(&test_app, "Tallinn-Harku", -15.0, 30.0, "Thunder").await;

    let (status, body) = test_app.get("/fee?city=tallinn&vehicle=car").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee"], json!(4.0));
}

#[tokio::test]
async fn strong_wind_forbids_bike_in_parnu() {
    let test_app = spawn_app().await;
    store(&test_app, "Pärnu", 5.0, 20.0, "").await;

    let (status, _) = test_app.get("/fee?city=p%C3%A4rnu&vehicle=bike").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejects_missing_or_unknown_parameters() {
    let test_app = spawn_app().await;

    for uri in [
        "/fee?city=&vehicle=car",
        "/fee?vehicle=car",
        "/fee?city=tartu",
        "/fee?city=narva&vehicle=car",
        "/fee?city=tartu&vehicle=truck",
    ] {
        let (status, body) = test_app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], json!(INVALID_REQUEST));
    }
}

#[tokio::test]
async fn rejects_unparsable_date_time() {
    let test_app = spawn_app().await;

    let (status, body) = test_app
        .get("/fee?city=tartu&vehicle=car&dateTime=last-tuesday")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("last-tuesday"));
}

#[tokio::test]
async fn point_in_time_uses_the_covering_slot() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_find_observation_at()
        .withf(|station, timestamp| {
            station == "Tartu-Tõravere" && *timestamp == AFTERNOON_BUCKET
        })
        .times(1)
        .returning(|station, timestamp| {
            Ok(Some(observation(station, -5.0, 3.0, "Light snowfall", timestamp)))
        });
    let test_app = spawn_app_with_weather(Arc::new(weather)).await;

    let (status, body) = test_app
        .get("/fee?city=tartu&vehicle=scooter&dateTime=2024-03-20T14:30:00")
        .await;

    assert_eq!(status, StatusCode::OK);
    // 3.0 base + 0.5 cold + 1.0 snow
    assert_eq!(
        body,
        json!({
            "fee": 4.5,
            "city": "tartu",
            "vehicle": "scooter",
            "dateTime": "2024-03-20T14:30:00"
        })
    );
}

#[tokio::test]
async fn point_in_time_without_data_is_a_bad_request() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_find_observation_at()
        .times(3)
        .returning(|_, _| Ok(None));
    weather.expect_find_latest_observation().never();
    let test_app = spawn_app_with_weather(Arc::new(weather)).await;

    let (status, body) = test_app
        .get("/fee?city=tallinn&vehicle=bike&dateTime=2024-03-20T15:05:00")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("It is not possible to obtain weather data for the specified time period.")
    );
}

#[tokio::test]
async fn instant_before_the_earliest_slot_is_a_bad_request() {
    let mut weather = MockWeatherAccess::new();
    weather.expect_find_observation_at().never();
    weather.expect_find_latest_observation().never();
    let test_app = spawn_app_with_weather(Arc::new(weather)).await;

    let (status, body) = test_app
        .get("/fee?city=tartu&vehicle=car&dateTime=-009999-01-01T00:05:00")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("It is not possible to obtain weather data for the specified time period.")
    );
}

#[tokio::test]
async fn api_path_quotes_like_fee() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/api?city=tallinn&vehicle=car").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"fee": 4.0, "city": "tallinn", "vehicle": "car", "dateTime": null})
    );
}

#[tokio::test]
async fn missing_rate_row_is_unavailable() {
    let test_app = spawn_app().await;
    sqlx::query("DELETE FROM regional_base_fee WHERE city = 'tartu'")
        .execute(test_app.db.pool())
        .await
        .unwrap();

    let (status, _) = test_app.get("/fee?city=tartu&vehicle=car").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
