use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db, fees};

pub const VEHICLE_FORBIDDEN: &str = "Usage of selected vehicle type is forbidden";

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn not_configured(kind: fees::RuleKind) -> Self {
        fees::Error::NotConfigured(kind).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<fees::Error> for ApiError {
    fn from(err: fees::Error) -> Self {
        let status = match &err {
            fees::Error::BadInput(_)
            | fees::Error::WeatherDataUnavailable { .. }
            | fees::Error::InstantOutOfRange(_) => StatusCode::BAD_REQUEST,
            fees::Error::NotConfigured(_) | fees::Error::CityNotFound(_) => {
                error!("fee configuration fault: {}", err);
                StatusCode::SERVICE_UNAVAILABLE
            }
            fees::Error::Storage(db_err) => return ApiError::from_storage(db_err),
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<db::Error> for ApiError {
    fn from(err: db::Error) -> Self {
        ApiError::from_storage(&err)
    }
}

impl ApiError {
    fn from_storage(err: &db::Error) -> Self {
        match err {
            db::Error::Invalid(message) => ApiError::new(StatusCode::BAD_REQUEST, message.clone()),
            other => {
                error!("storage failure: {}", other);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}
