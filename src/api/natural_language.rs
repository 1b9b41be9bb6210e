use std::convert::Infallible;

use serde::Serialize;
use tracing::info;
use warp::reply::{self, Reply, Response};

use super::{respond, ApiError, StringResponse};
use crate::{database::Database, filter::StringFilter, semantic_parsing::interpret};

#[derive(Serialize)]
struct InterpretedQuery<'a> {
    original: &'a str,
    parsed_filters: &'a StringFilter,
}

#[derive(Serialize)]
struct NaturalLanguageResult<'a> {
    data: Vec<StringResponse>,
    count: usize,
    interpreted_query: InterpretedQuery<'a>,
}

/// `GET /strings/filter-by-natural-language?query=...`
///
/// Takes the raw query pairs: a repeated or bracketed `query` is answered here
/// as a missing query, never by the `/strings/{value}` route.
pub(crate) async fn filter_by_natural_language(
    db: Database,
    params: Vec<(String, String)>,
) -> Result<Response, Infallible> {
    respond(
        single_query(&params)
            .ok_or(ApiError::MissingQuery)
            .and_then(|query| search(&db, query)),
    )
}

/// The `query` parameter, unless it is absent or given more than once.
fn single_query(params: &[(String, String)]) -> Option<&str> {
    let mut queries = params
        .iter()
        .filter(|(key, _)| key == "query")
        .map(|(_, value)| value.as_str());
    match (queries.next(), queries.next()) {
        (Some(query), None) => Some(query),
        _ => None,
    }
}

fn search(db: &Database, query: &str) -> Result<Response, ApiError> {
    let filter = interpret(query)?;
    info!(query, ?filter, "interpreted natural language query");

    let data: Vec<StringResponse> = db
        .find_strings(&filter)?
        .into_iter()
        .map(StringResponse::from)
        .collect();
    Ok(reply::json(&NaturalLanguageResult {
        count: data.len(),
        data,
        interpreted_query: InterpretedQuery {
            original: query,
            parsed_filters: &filter,
        },
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use warp::http::StatusCode;

    use super::single_query;
    use crate::api::TestServer;

    async fn seeded() -> TestServer {
        let server = TestServer::new();
        for value in ["racecar", "level", "a", "banana", "hello world", "abba"] {
            let (status, _) = server.post(&json!({ "value": value }).to_string()).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        server
    }

    fn values(body: &serde_json::Value) -> Vec<String> {
        let mut values: Vec<String> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["value"].as_str().unwrap().to_string())
            .collect();
        values.sort();
        values
    }

    #[tokio::test]
    async fn missing_query() {
        let server = TestServer::new();
        for path in [
            "/strings/filter-by-natural-language",
            "/strings/filter-by-natural-language?query=",
        ] {
            let (status, body) = server.get(path).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body, json!({ "error": "Query parameter is required" }));
        }
    }

    #[tokio::test]
    async fn unparsable_query() {
        let server = TestServer::new();
        let (status, body) = server
            .get("/strings/filter-by-natural-language?query=hello%20world")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "error": "Unable to parse natural language query",
                "interpreted_query": {
                    "original": "hello world",
                    "parsed_filters": {},
                },
            })
        );
    }

    #[tokio::test]
    async fn palindromes_longer_than() {
        let server = seeded().await;
        let (status, body) = server
            .get("/strings/filter-by-natural-language?query=palindromic%20strings%20longer%20than%204%20characters")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(values(&body), ["level", "racecar"]);
        assert_eq!(body["count"], 2);
        assert_eq!(
            body["interpreted_query"],
            json!({
                "original": "palindromic strings longer than 4 characters",
                "parsed_filters": {
                    "is_palindrome": true,
                    "length": { "min": 5 },
                },
            })
        );
    }

    #[tokio::test]
    async fn single_word_palindromes_containing() {
        let server = seeded().await;
        let (status, body) = server
            .get("/strings/filter-by-natural-language?query=Single+word+palindromes+containing+the+letter+A")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(values(&body), ["a", "abba", "racecar"]);
        assert_eq!(
            body["interpreted_query"]["parsed_filters"],
            json!({
                "is_palindrome": true,
                "word_count": 1,
                "contains_character": "a",
            })
        );
    }

    #[tokio::test]
    async fn unsatisfiable_bound_returns_no_data() {
        let server = seeded().await;
        let (status, body) = server
            .get("/strings/filter-by-natural-language?query=shorter%20than%200%20characters")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert_eq!(
            body["interpreted_query"]["parsed_filters"],
            json!({ "length": { "max": -1 } })
        );
    }

    #[tokio::test]
    async fn repeated_or_nested_query_is_missing() {
        let server = TestServer::new();
        let (status, _) = server.post(r#"{"value": "filter-by-natural-language"}"#).await;
        assert_eq!(status, StatusCode::CREATED);

        for path in [
            "/strings/filter-by-natural-language?query=palindrome&query=x",
            "/strings/filter-by-natural-language?query%5B%5D=palindrome",
            "/strings/filter-by-natural-language?query%5Bkey%5D=palindrome",
            "/strings/filter-by-natural-language?query",
        ] {
            let (status, body) = server.get(path).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body, json!({ "error": "Query parameter is required" }), "{path}");
        }
    }

    #[test]
    fn single_query_value() {
        let pairs = |list: &[(&str, &str)]| -> Vec<(String, String)> {
            list.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };
        assert_eq!(
            single_query(&pairs(&[("other", "1"), ("query", "palindromes")])),
            Some("palindromes")
        );
        assert_eq!(single_query(&pairs(&[("query", "")])), Some(""));
        assert_eq!(single_query(&pairs(&[("query", "a"), ("query", "b")])), None);
        assert_eq!(single_query(&pairs(&[("queries", "a")])), None);
    }

    #[tokio::test]
    async fn route_is_not_taken_as_a_string_value() {
        let server = TestServer::new();
        let (status, _) = server.post(r#"{"value": "filter-by-natural-language"}"#).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = server
            .get("/strings/filter-by-natural-language?query=palindrome")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }
}
