use crate::helpers::spawn_app;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn lists_seeded_base_fees() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/base-fees").await;

    assert_eq!(status, StatusCode::OK);
    let cities: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["city"].as_str().unwrap())
        .collect();
    assert_eq!(cities, vec!["tallinn", "tartu", "pärnu"]);
}

#[tokio::test]
async fn city_lookup_ignores_case() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/base-fees/TARTU").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carFee"], json!(3.5));
    assert_eq!(body["bikeFee"], json!(2.5));
    assert_eq!(body["scooterFee"], json!(3.0));
}

#[tokio::test]
async fn unknown_city_is_not_found() {
    let test_app = spawn_app().await;

    let (status, body) = test_app.get("/base-fees/narva").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "Could not find regional base fee for city narva"})
    );
}

#[tokio::test]
async fn partial_update_keeps_other_fees() {
    let test_app = spawn_app().await;

    let (status, body) = test_app
        .patch("/base-fees/Tallinn", json!({"bikeFee": 3.25}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carFee"], json!(4.0));
    assert_eq!(body["bikeFee"], json!(3.25));
    assert_eq!(body["scooterFee"], json!(3.5));

    let (_, quote) = test_app.get("/fee?city=tallinn&vehicle=bike").await;
    assert_eq!(quote["fee"], json!(3.25));
}

#[tokio::test]
async fn negative_fee_is_rejected() {
    let test_app = spawn_app().await;

    let (status, _) = test_app
        .patch("/base-fees/tartu", json!({"carFee": -1.0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = test_app.get("/base-fees/tartu").await;
    assert_eq!(body["carFee"], json!(3.5));
}

#[tokio::test]
async fn updating_unknown_city_is_not_found() {
    let test_app = spawn_app().await;

    let (status, _) = test_app
        .patch("/base-fees/narva", json!({"carFee": 2.0}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
