use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Which upstream call a failure belongs to.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Geocode,
    Places,
    Card,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Geocode => "Geocode",
            Stage::Places => "Places",
            Stage::Card => "Card",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("{stage} error: {status}")]
    UpstreamHttp { stage: Stage, status: u16 },

    #[error("{stage} request failed: {detail}")]
    UpstreamUnreachable { stage: Stage, detail: String },

    #[error("{stage} returned an unexpected response: {detail}")]
    MalformedResponse { stage: Stage, detail: String },

    #[error("City not found: {city}")]
    NotFound { city: String },
}

impl SearchError {
    pub fn from_reqwest(stage: Stage, e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SearchError::UpstreamHttp {
                stage,
                status: status.as_u16(),
            },
            None if e.is_decode() => SearchError::MalformedResponse {
                stage,
                detail: e.to_string(),
            },
            None => SearchError::UpstreamUnreachable {
                stage,
                detail: e.to_string(),
            },
        }
    }
}

/// Field name to messages, rendered as a flat JSON object.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid review payload")]
    Validation(ValidationErrors),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error(transparent)]
    Upstream(#[from] SearchError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            AppError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Something went wrong, please try again" })),
            )
                .into_response(),
        }
    }
}
