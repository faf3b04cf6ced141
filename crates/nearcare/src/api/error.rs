use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nearcare_data::DataError;
use serde::Serialize;
use tracing::error;

use crate::error::NearcareError;
use crate::search::SearchError;

/// An error as sent to API clients: a status and `{message, error?}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            detail: None,
        }
    }

    pub fn server_error(message: impl Into<String>, detail: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: &self.message,
            error: self.detail.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::BadRequest { message, detail } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                detail,
            },
            SearchError::Repository(e) => {
                error!(error = %e, "Facility query failed");
                Self::server_error("Error fetching hospitals", e)
            }
        }
    }
}

impl From<NearcareError> for ApiError {
    fn from(e: NearcareError) -> Self {
        match e {
            NearcareError::DataError(DataError::EmptyUpload) => {
                Self::bad_request("File required (CSV)")
            }
            NearcareError::DataError(e @ DataError::NoValidRows) => Self::bad_request(e.to_string()),
            NearcareError::SearchError(e) => e.into(),
            e => {
                error!(error = %e, "Upload failed");
                Self::server_error("Error uploading file", e)
            }
        }
    }
}
