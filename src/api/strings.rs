use std::{collections::BTreeMap, convert::Infallible};

use serde::Serialize;
use serde_json::Value;
use warp::{
    http::StatusCode,
    hyper::body::Bytes,
    reply::{self, Reply, Response},
};

use super::{respond, ApiError, StringResponse};
use crate::{database::Database, filter::StringFilter};

#[derive(Serialize)]
struct StringList<'a> {
    data: Vec<StringResponse>,
    count: usize,
    filters_applied: &'a BTreeMap<String, String>,
}

/// `POST /strings`
pub(crate) async fn create_string(db: Database, body: Bytes) -> Result<Response, Infallible> {
    respond(create(&db, &body))
}

/// `GET /strings/{value}`
pub(crate) async fn get_string(value: String, db: Database) -> Result<Response, Infallible> {
    respond(get(&db, &value))
}

/// `GET /strings`, filtered by query parameters.
pub(crate) async fn list_strings(
    db: Database,
    params: BTreeMap<String, String>,
) -> Result<Response, Infallible> {
    respond(list(&db, &params))
}

/// `DELETE /strings/{value}`
pub(crate) async fn delete_string(value: String, db: Database) -> Result<Response, Infallible> {
    respond(delete(&db, &value))
}

fn create(db: &Database, body: &[u8]) -> Result<Response, ApiError> {
    let value = parse_value(body)?;
    let record = db.insert_string(&value)?;
    Ok(reply::with_status(
        reply::json(&StringResponse::from(record)),
        StatusCode::CREATED,
    )
    .into_response())
}

fn get(db: &Database, raw: &str) -> Result<Response, ApiError> {
    let value = decode_path(raw)?;
    let record = db.get_string(&value)?.ok_or(ApiError::NotFound)?;
    Ok(reply::json(&StringResponse::from(record)).into_response())
}

fn list(db: &Database, params: &BTreeMap<String, String>) -> Result<Response, ApiError> {
    let filter = filter_from_params(params)?;
    let data: Vec<StringResponse> = db
        .find_strings(&filter)?
        .into_iter()
        .map(StringResponse::from)
        .collect();
    Ok(reply::json(&StringList {
        count: data.len(),
        data,
        filters_applied: params,
    })
    .into_response())
}

fn delete(db: &Database, raw: &str) -> Result<Response, ApiError> {
    let value = decode_path(raw)?;
    db.remove_string(&value)?.ok_or(ApiError::NotFound)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn decode_path(raw: &str) -> Result<String, ApiError> {
    urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .map_err(|_| ApiError::InvalidPath)
}

/// Builds a filter from the explicit parameters of `GET /strings`.
///
/// Unknown parameters are ignored.
fn filter_from_params(params: &BTreeMap<String, String>) -> Result<StringFilter, ApiError> {
    let mut filter = StringFilter::default();

    if let Some(raw) = params.get("is_palindrome") {
        filter.is_palindrome = Some(match raw.as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(ApiError::InvalidParameter(
                    "is_palindrome must be 'true' or 'false'",
                ))
            }
        });
    }
    if let Some(raw) = params.get("min_length") {
        let min = non_negative(raw).ok_or(ApiError::InvalidParameter(
            "min_length must be a positive integer",
        ))?;
        filter = filter.with_min_length(min);
    }
    if let Some(raw) = params.get("max_length") {
        let max = non_negative(raw).ok_or(ApiError::InvalidParameter(
            "max_length must be a positive integer",
        ))?;
        filter = filter.with_max_length(max);
    }
    if let Some(raw) = params.get("word_count") {
        let count = non_negative(raw)
            .and_then(|count| usize::try_from(count).ok())
            .ok_or(ApiError::InvalidParameter(
                "word_count must be a positive integer",
            ))?;
        filter.word_count = Some(count);
    }
    if let Some(raw) = params.get("contains_character") {
        let mut chars = raw.chars();
        filter.contains_character = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => {
                return Err(ApiError::InvalidParameter(
                    "contains_character must be a single character",
                ))
            }
        };
    }

    Ok(filter)
}

fn non_negative(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|n| *n >= 0)
}

/// Extracts the `value` field of a JSON request body.
fn parse_value(body: &[u8]) -> Result<String, ApiError> {
    let body: Value = serde_json::from_slice(body).map_err(|_| ApiError::MalformedBody)?;
    match body.get("value") {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ApiError::InvalidValue),
    }
}
