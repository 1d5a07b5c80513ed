use crate::{
    db, routes, BaseFeeData, Database, FeeCalculator, SurchargeRuleData, Vehicle, WeatherData,
    add_observations, get_base_fee, get_fee, get_phenomenon_conditions,
    get_temperature_conditions, get_wind_conditions, latest_observation, list_base_fees,
    list_extra_fees, update_base_fee, update_phenomenon_conditions,
    update_temperature_conditions, update_wind_conditions,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[derive(Clone)]
pub struct AppState {
    pub calculator: Arc<FeeCalculator>,
    pub base_fees: Arc<dyn BaseFeeData>,
    pub weather: Arc<dyn WeatherData>,
    pub rules: Arc<dyn SurchargeRuleData>,
}

impl AppState {
    /// Wires the calculator to the same stores the management endpoints use.
    pub fn new(
        base_fees: Arc<dyn BaseFeeData>,
        weather: Arc<dyn WeatherData>,
        rules: Arc<dyn SurchargeRuleData>,
    ) -> Self {
        let calculator = Arc::new(FeeCalculator::new(
            base_fees.clone(),
            weather.clone(),
            rules.clone(),
        ));
        Self {
            calculator,
            base_fees,
            weather,
            rules,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::fee::get_fee,
        routes::base_fees::list_base_fees,
        routes::base_fees::get_base_fee,
        routes::base_fees::update_base_fee,
        routes::extra_fees::list_extra_fees,
        routes::extra_fees::get_temperature_conditions,
        routes::extra_fees::update_temperature_conditions,
        routes::extra_fees::get_wind_conditions,
        routes::extra_fees::update_wind_conditions,
        routes::extra_fees::get_phenomenon_conditions,
        routes::extra_fees::update_phenomenon_conditions,
        routes::weather::add_observations,
        routes::weather::latest_observation,
    ),
    components(
        schemas(
                Vehicle,
                db::RegionalBaseFee,
                db::BaseFeeUpdate,
                db::WeatherObservation,
                db::TemperatureRule,
                db::TemperatureRuleUpdate,
                db::WindRule,
                db::WindRuleUpdate,
                db::PhenomenonRule,
                db::PhenomenonRuleUpdate,
                routes::fee::FeeResponse,
                routes::extra_fees::ExtraFeeConditions,
                routes::weather::StoredObservations,
                routes::error::ErrorBody
            )
    ),
    tags(
        (
            name = "delivery fee api",
            description = "a RESTful api quoting courier delivery fees from regional base fees \
                and current weather"
        )
    )
)]
struct ApiDoc;

pub async fn build_app_state(data_dir: &str) -> Result<(AppState, Arc<Database>), anyhow::Error> {
    let db = Arc::new(
        Database::new(data_dir)
            .await
            .map_err(|e| anyhow!("error setting up SQLite database: {}", e))?,
    );
    db.health_check().await?;

    let state = AppState::new(db.clone(), db.clone(), db.clone());
    Ok((state, db))
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/fee", get(get_fee))
        .route("/api", get(get_fee))
        .route("/base-fees", get(list_base_fees))
        .route(
            "/base-fees/{city}",
            get(get_base_fee).patch(update_base_fee),
        )
        .route("/extra-fees", get(list_extra_fees))
        .route(
            "/extra-fees/air-temperature-conditions",
            get(get_temperature_conditions).patch(update_temperature_conditions),
        )
        .route(
            "/extra-fees/wind-speed-conditions",
            get(get_wind_conditions).patch(update_wind_conditions),
        )
        .route(
            "/extra-fees/phenomenon-conditions",
            get(get_phenomenon_conditions).patch(update_phenomenon_conditions),
        )
        .route("/weather/observations", post(add_observations))
        .route(
            "/weather/observations/{station}/latest",
            get(latest_observation),
        )
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request","new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(
        target: "http_response",
        "response, code: {}, time: {}",
        response.status().as_str(),
        response_time
    );

    response
}
