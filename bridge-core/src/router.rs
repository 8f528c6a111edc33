//! Request routing
//!
//! Maps a parsed request line onto the fixed endpoint set and renders the JSON body.

use crate::error::LookupError;
use crate::history::{HistoryStats, HistoryStore};
use crate::response::{ApiResponse, Status};
use crate::{Result, AUTHOR, EXTENSION_NAME, VERSION};
use serde::Serialize;
use std::num::IntErrorKind;

/// Endpoints listed in the 404 hint.
pub const AVAILABLE_ENDPOINTS: [&str; 4] = ["/health", "/history", "/history/N", "/stats"];

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    extension: &'static str,
    version: &'static str,
    author: &'static str,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    version: &'static str,
    author: &'static str,
    #[serde(flatten)]
    stats: HistoryStats,
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<&'a [&'a str]>,
}

/// Build the response for one request.
pub fn route(method: &str, path: &str, history: &HistoryStore) -> Result<ApiResponse> {
    if method == "OPTIONS" {
        return Ok(ApiResponse::empty(Status::Ok));
    }
    if method != "GET" {
        return endpoint_not_found();
    }

    match path {
        "/health" => ApiResponse::json(
            Status::Ok,
            &HealthResponse {
                status: "ok",
                extension: EXTENSION_NAME,
                version: VERSION,
                author: AUTHOR,
            },
        ),
        "/history" => ApiResponse::pretty_json(Status::Ok, &history.get_all()),
        "/stats" => ApiResponse::pretty_json(
            Status::Ok,
            &StatsResponse {
                version: VERSION,
                author: AUTHOR,
                stats: history.stats(),
            },
        ),
        p if p.starts_with("/history/") => history_item(p, history),
        _ => endpoint_not_found(),
    }
}

fn history_item(path: &str, history: &HistoryStore) -> Result<ApiResponse> {
    let lookup = parse_index(path).and_then(|index| history.get_by_index(index));
    match lookup {
        Ok(entry) => ApiResponse::pretty_json(Status::Ok, entry.as_ref()),
        Err(err @ LookupError::InvalidIndex) => error_response(Status::BadRequest, err),
        Err(err @ LookupError::NotFound) => error_response(Status::NotFound, err),
    }
}

/// Trailing path segment as a signed integer. Negative values parse and are later
/// reported as not found, as are integers too large for `i64`.
pub fn parse_index(path: &str) -> std::result::Result<i64, LookupError> {
    path.rsplit('/')
        .next()
        .unwrap_or_default()
        .parse::<i64>()
        .map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => LookupError::NotFound,
            _ => LookupError::InvalidIndex,
        })
}

fn error_response(status: Status, err: LookupError) -> Result<ApiResponse> {
    ApiResponse::json(
        status,
        &ErrorResponse {
            error: &err.to_string(),
            available: None,
        },
    )
}

fn endpoint_not_found() -> Result<ApiResponse> {
    ApiResponse::json(
        Status::NotFound,
        &ErrorResponse {
            error: "Endpoint not found",
            available: Some(&AVAILABLE_ENDPOINTS[..]),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::entry;
    use serde_json::{json, Value};

    fn body(resp: &ApiResponse) -> Value {
        serde_json::from_str(&resp.body).unwrap()
    }

    #[test]
    fn health_body() {
        let store = HistoryStore::new(10);
        let resp = route("GET", "/health", &store).unwrap();
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(
            body(&resp),
            json!({"status": "ok", "extension": "Burp AI Bridge", "version": "1.0.0", "author": "Can Hieu"})
        );
    }

    #[test]
    fn options_is_empty_for_any_path() {
        let store = HistoryStore::new(10);
        for path in ["*", "/anything", "/history/abc"] {
            let resp = route("OPTIONS", path, &store).unwrap();
            assert_eq!(resp, ApiResponse::empty(Status::Ok));
        }
    }

    #[test]
    fn history_item_outcomes() {
        let store = HistoryStore::new(10);
        let resp = route("GET", "/history/5", &store).unwrap();
        assert_eq!(resp.status, Status::NotFound);
        assert_eq!(resp.body, r#"{"error":"Item not found"}"#);

        let resp = route("GET", "/history/abc", &store).unwrap();
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(resp.body, r#"{"error":"Invalid index"}"#);

        let resp = route("GET", "/history/", &store).unwrap();
        assert_eq!(resp.status, Status::BadRequest);

        store.append(entry("example.com", "GET"));
        let resp = route("GET", "/history/0", &store).unwrap();
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(body(&resp)["host"], "example.com");

        let resp = route("GET", "/history/-1", &store).unwrap();
        assert_eq!(resp.status, Status::NotFound);

        for huge in ["/history/99999999999999999999", "/history/-99999999999999999999"] {
            let resp = route("GET", huge, &store).unwrap();
            assert_eq!(resp.status, Status::NotFound);
            assert_eq!(resp.body, r#"{"error":"Item not found"}"#);
        }
    }

    #[test]
    fn history_lists_snapshot() {
        let store = HistoryStore::new(10);
        assert_eq!(route("GET", "/history", &store).unwrap().body, "[]");

        store.append(entry("a.com", "GET"));
        store.append(entry("b.com", "POST"));
        let resp = route("GET", "/history", &store).unwrap();
        let list = body(&resp);
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[1]["index"], 1);
        assert_eq!(list[1]["method"], "POST");
    }

    #[test]
    fn stats_after_single_entry() {
        let store = HistoryStore::new(10);
        store.append(entry("example.com", "GET"));
        let resp = route("GET", "/stats", &store).unwrap();
        assert_eq!(
            body(&resp),
            json!({
                "version": "1.0.0",
                "author": "Can Hieu",
                "total_requests": 1,
                "hosts": ["example.com"],
                "methods": {"GET": 1}
            })
        );
    }

    #[test]
    fn unknown_routes_list_available_endpoints() {
        let store = HistoryStore::new(10);
        for (method, path) in [("GET", "/nope"), ("POST", "/health"), ("DELETE", "/history")] {
            let resp = route(method, path, &store).unwrap();
            assert_eq!(resp.status, Status::NotFound);
            assert_eq!(
                body(&resp),
                json!({"error": "Endpoint not found", "available": ["/health", "/history", "/history/N", "/stats"]})
            );
        }
    }

    #[test]
    fn parse_index_uses_last_segment() {
        assert_eq!(parse_index("/history/12"), Ok(12));
        assert_eq!(parse_index("/history/1/7"), Ok(7));
        assert_eq!(parse_index("/history/-3"), Ok(-3));
        assert_eq!(parse_index("/history/x1"), Err(LookupError::InvalidIndex));
        assert_eq!(parse_index("/history/"), Err(LookupError::InvalidIndex));
        assert_eq!(
            parse_index("/history/18446744073709551616"),
            Err(LookupError::NotFound)
        );
    }
}
