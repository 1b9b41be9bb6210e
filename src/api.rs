mod natural_language;
mod strings;

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use warp::{
    http::StatusCode,
    reject,
    reply::{self, Reply, Response},
    Rejection,
};

pub(crate) use self::natural_language::filter_by_natural_language;
pub(crate) use self::strings::{create_string, delete_string, get_string, list_strings};
use crate::{
    analyzer::StringProperties,
    database::{StoreError, StoredString},
    semantic_parsing::InterpretError,
};

/// A stored string as returned to clients.
#[derive(Debug, Serialize)]
pub(crate) struct StringResponse {
    pub(crate) id: String,
    pub(crate) value: String,
    pub(crate) properties: StringProperties,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<StoredString> for StringResponse {
    fn from(record: StoredString) -> Self {
        Self {
            id: record.properties.sha256_hash.clone(),
            value: record.value,
            properties: record.properties,
            created_at: record.created_at,
        }
    }
}

/// Every failure a client can see.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("Query parameter is required")]
    MissingQuery,

    #[error("Unable to parse natural language query")]
    Uninterpretable { original: String },

    #[error("Invalid request body")]
    MalformedBody,

    #[error("Invalid data type for \"value\" (must be string)")]
    InvalidValue,

    #[error("{0}")]
    InvalidParameter(&'static str),

    #[error("Invalid string in path")]
    InvalidPath,

    #[error("String already exists in the system")]
    Conflict,

    #[error("String does not exist in the system")]
    NotFound,

    #[error("Invalid query string")]
    InvalidQuery,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Content-Length header is required")]
    LengthRequired,

    #[error("Request body is too large")]
    BodyTooLarge,

    #[error("Unsupported request")]
    Unsupported,

    #[error("Internal server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingQuery
            | ApiError::Uninterpretable { .. }
            | ApiError::MalformedBody
            | ApiError::InvalidParameter(_)
            | ApiError::InvalidPath
            | ApiError::InvalidQuery
            | ApiError::Unsupported => StatusCode::BAD_REQUEST,
            ApiError::InvalidValue => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ApiError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn into_reply(self) -> Response {
        let body = match &self {
            ApiError::Uninterpretable { original } => json!({
                "error": self.to_string(),
                "interpreted_query": {
                    "original": original,
                    "parsed_filters": {},
                },
            }),
            ApiError::Internal(source) => {
                error!("Problem while accessing the database. {source}");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        reply::with_status(reply::json(&body), self.status()).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict => ApiError::Conflict,
            other => ApiError::Internal(other),
        }
    }
}

impl From<InterpretError> for ApiError {
    fn from(error: InterpretError) -> Self {
        match error {
            InterpretError::EmptyQuery => ApiError::MissingQuery,
            InterpretError::NoIntent { original } => ApiError::Uninterpretable { original },
        }
    }
}

impl From<&Rejection> for ApiError {
    /// Body and method rejections win over the `not found` of routes whose
    /// path did not match.
    fn from(rejection: &Rejection) -> Self {
        if rejection.find::<reject::PayloadTooLarge>().is_some() {
            ApiError::BodyTooLarge
        } else if rejection.find::<reject::LengthRequired>().is_some() {
            ApiError::LengthRequired
        } else if rejection.find::<reject::InvalidQuery>().is_some() {
            ApiError::InvalidQuery
        } else if rejection.find::<reject::MethodNotAllowed>().is_some() {
            ApiError::MethodNotAllowed
        } else if rejection.is_not_found() {
            ApiError::RouteNotFound
        } else {
            ApiError::Unsupported
        }
    }
}

/// Answers every request no route accepted with a JSON error body.
pub(crate) async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let error = ApiError::from(&rejection);
    if matches!(error, ApiError::Unsupported) {
        warn!(?rejection, "unhandled rejection");
    }
    Ok(error.into_reply())
}

/// Turns a handler result into a reply, so that warp never sees a rejection
/// for a request that reached a handler.
fn respond(result: Result<Response, ApiError>) -> Result<Response, Infallible> {
    Ok(result.unwrap_or_else(ApiError::into_reply))
}

#[cfg(test)]
struct TestServer {
    _dir: tempfile::TempDir, // to prevent the data directory from being deleted while the test is running
    db: crate::database::Database,
}

#[cfg(test)]
impl TestServer {
    fn new() -> Self {
        let db_dir = tempfile::tempdir().unwrap();
        let db = crate::database::Database::connect(db_dir.path()).unwrap();
        Self { _dir: db_dir, db }
    }

    async fn request(&self, method: &str, path: &str, body: &str) -> (StatusCode, String) {
        let res = warp::test::request()
            .method(method)
            .path(path)
            .body(body.to_string())
            .reply(&crate::web::routes(self.db.clone()))
            .await;
        let body = String::from_utf8(res.body().to_vec()).unwrap();
        (res.status(), body)
    }

    async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.request("GET", path, "").await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn post(&self, body: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.request("POST", "/strings", body).await;
        (status, serde_json::from_str(&body).unwrap())
    }
}
