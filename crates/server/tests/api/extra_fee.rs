use crate::helpers::{observation, spawn_app};
use axum::http::StatusCode;
use serde_json::{json, to_value};

#[tokio::test]
async fn lists_all_conditions() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/extra-fees").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["airTemperatureConditions"]["vehicleTypes"],
        json!(["scooter", "bike"])
    );
    assert_eq!(body["windSpeedConditions"]["forbiddenSpeed"], json!(20.0));
    assert_eq!(
        body["phenomenonConditions"]["forbiddenPhenomenons"],
        json!(["Glaze", "Hail", "Thunder"])
    );
}

#[tokio::test]
async fn updated_wind_conditions_apply_to_quotes() {
    let test_app = spawn_app().await;
    let (status, _) = test_app
        .post(
            "/weather/observations",
            to_value(vec![observation("Tartu-Tõravere", 5.0, 16.0, "", 1_710_936_900)]).unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, before) = test_app.get("/fee?city=tartu&vehicle=bike").await;
    assert_eq!(before["fee"], json!(3.0));

    let (status, body) = test_app
        .patch(
            "/extra-fees/wind-speed-conditions",
            json!({"forbiddenSpeed": 15.0, "betweenMax": 15.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forbiddenSpeed"], json!(15.0));
    assert_eq!(body["betweenMax"], json!(15.0));
    assert_eq!(body["betweenFee"], json!(0.5));

    let (status, _) = test_app.get("/fee?city=tartu&vehicle=bike").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wind_band_is_charged_before_a_cutoff_inside_it() {
    let test_app = spawn_app().await;
    let (status, _) = test_app
        .post(
            "/weather/observations",
            to_value(vec![observation("Tartu-Tõravere", 5.0, 16.0, "", 1_710_936_900)]).unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = test_app
        .patch(
            "/extra-fees/wind-speed-conditions",
            json!({"forbiddenSpeed": 15.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = test_app.get("/fee?city=tartu&vehicle=bike").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee"], json!(3.0));
}

#[tokio::test]
async fn vehicle_types_can_be_replaced() {
    let test_app = spawn_app().await;

    let (status, body) = test_app
        .patch(
            "/extra-fees/air-temperature-conditions",
            json!({"vehicleTypes": ["Car", "bike"]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicleTypes"], json!(["car", "bike"]));
    assert_eq!(body["lessThanFee"], json!(1.0));
}

#[tokio::test]
async fn rejects_invalid_updates() {
    let test_app = spawn_app().await;

    let cases = [
        (
            "/extra-fees/air-temperature-conditions",
            json!({"vehicleTypes": ["truck"]}),
        ),
        (
            "/extra-fees/wind-speed-conditions",
            json!({"betweenMin": 25.0}),
        ),
        (
            "/extra-fees/phenomenon-conditions",
            json!({"rainFee": -0.5}),
        ),
    ];

    for (uri, update) in cases {
        let (status, body) = test_app.patch(uri, update).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string());
    }

    let (_, wind) = test_app.get("/extra-fees/wind-speed-conditions").await;
    assert_eq!(wind["betweenMin"], json!(10.0));
}

#[tokio::test]
async fn missing_condition_row_is_unavailable() {
    let test_app = spawn_app().await;
    sqlx::query("DELETE FROM weather_phenomenon_conditions")
        .execute(test_app.db.pool())
        .await
        .unwrap();

    let (status, body) = test_app.get("/extra-fees").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["error"],
        json!("Extra fee conditions for weather phenomenon are not configured")
    );

    let (status, _) = test_app.get("/extra-fees/phenomenon-conditions").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = test_app
        .patch("/extra-fees/phenomenon-conditions", json!({"rainFee": 1.0}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = test_app.get("/fee?city=tallinn&vehicle=car").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
