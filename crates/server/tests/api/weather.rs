use crate::helpers::{observation, spawn_app};
use axum::http::StatusCode;
use serde_json::{json, to_value};

#[tokio::test]
async fn stores_and_returns_latest_observation() {
    let test_app = spawn_app().await;

    let (status, body) = test_app
        .post(
            "/weather/observations",
            to_value(vec![
                observation("Tallinn-Harku", -1.0, 4.0, "Light snowfall", 1_710_936_900),
                observation("Tallinn-Harku", 0.5, 6.0, "Light rain", 1_710_940_500),
                observation("Pärnu", 2.0, 3.0, "", 1_710_940_500),
            ])
            .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"stored": 3}));

    let (status, body) = test_app
        .get("/weather/observations/Tallinn-Harku/latest")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["airTemperature"], json!(0.5));
    assert_eq!(body["weatherPhenomenon"], json!("Light rain"));
    assert_eq!(body["observationTimestamp"], json!(1_710_940_500));
}

#[tokio::test]
async fn unknown_station_is_rejected_as_a_whole() {
    let test_app = spawn_app().await;

    let (status, body) = test_app
        .post(
            "/weather/observations",
            to_value(vec![
                observation("Tallinn-Harku", 1.0, 1.0, "", 1_710_936_900),
                observation("Narva", 1.0, 1.0, "", 1_710_936_900),
            ])
            .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Unknown weather station: Narva"));

    let (status, _) = test_app
        .get("/weather/observations/Tallinn-Harku/latest")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_fields_default_when_posted() {
    let test_app = spawn_app().await;

    let (status, _) = test_app
        .post(
            "/weather/observations",
            json!([{
                "station": "Tartu-Tõravere",
                "airTemperature": -3.0,
                "windSpeed": 2.0,
                "observationTimestamp": 1_710_936_900
            }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, quote) = test_app.get("/fee?city=tartu&vehicle=scooter").await;
    assert_eq!(quote["fee"], json!(3.5));
}
