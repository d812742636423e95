use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// Query parameter naming the key to process
pub const KEY_PARAM: &str = "key";

/// Counter of handled requests, labelled by `outcome`
pub const REQUESTS_TOTAL: &str = "zipgate_requests_total";

/// Soft rejection body sent when the key is already claimed
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlreadyProcessing {
    #[serde(rename = "Error")]
    pub error: String,
}

impl Default for AlreadyProcessing {
    fn default() -> Self {
        Self {
            error: "already processing".to_string(),
        }
    }
}

/// Successful outcomes of an unzip request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnzipOutcome {
    /// Key was claimed and the archiver ran without error
    Processed,
    /// Key was already claimed; nothing ran
    AlreadyProcessing,
}

impl UnzipOutcome {
    fn label(self) -> &'static str {
        match self {
            UnzipOutcome::Processed => "claimed",
            UnzipOutcome::AlreadyProcessing => "busy",
        }
    }
}

impl IntoResponse for UnzipOutcome {
    fn into_response(self) -> Response {
        match self {
            UnzipOutcome::Processed => StatusCode::OK.into_response(),
            UnzipOutcome::AlreadyProcessing => {
                (StatusCode::OK, Json(AlreadyProcessing::default())).into_response()
            }
        }
    }
}

/// Claim the requested key and process its archive.
///
/// Accepts any method on any path. The first `key` query value is used, see
/// [`parse_query`] for how the query string is decoded.
///
/// # Responses
///
/// - `200` with an empty body when the key was free and processing succeeded
/// - `200` with `{"Error":"already processing"}` when the key is still busy
/// - `500` with a plain-text message for a missing key or a processing failure
///
/// The key stays busy for the configured release delay after the claim, even
/// if processing fails.
pub async fn unzip_key(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
) -> ServerResult<UnzipOutcome> {
    let result = handle_unzip(&state, query.as_deref().unwrap_or_default()).await;

    let outcome = match &result {
        Ok(outcome) => outcome.label(),
        Err(err) => err.kind(),
    };
    metrics::counter!(REQUESTS_TOTAL, "outcome" => outcome).increment(1);

    result
}

async fn handle_unzip(state: &ServerState, query: &str) -> ServerResult<UnzipOutcome> {
    let params = parse_query(query);
    let key = required_param(&params, KEY_PARAM)?;

    let Some(claim) = state.registry.try_claim(key) else {
        tracing::info!(key, "already processing, request dropped");
        return Ok(UnzipOutcome::AlreadyProcessing);
    };

    // Scheduled before processing so a failed run still frees the key.
    state.registry.schedule_release(claim, state.release_delay());

    state.archiver.process(key, &state.config.archive).await?;

    tracing::info!(key, "key processed");
    Ok(UnzipOutcome::Processed)
}

/// Decode a raw query string into its `name=value` pairs, in order.
///
/// `+` decodes to a space. A pair is dropped when it contains `;`, a `%` not
/// followed by two hex digits, or an escape sequence that is not valid UTF-8.
/// Dropping never fails the request by itself: a dropped `key` surfaces as a
/// missing parameter.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            match (decode_component(name), decode_component(value)) {
                (Some(name), Some(value)) if !pair.contains(';') => Some((name, value)),
                _ => {
                    tracing::debug!(pair, "malformed query pair dropped");
                    None
                }
            }
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let escapes_valid = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    });
    if !escapes_valid {
        return None;
    }

    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}

/// First value of `name`, which must be present and non-empty
pub fn required_param<'a>(
    params: &'a [(String, String)],
    name: &'static str,
) -> ServerResult<&'a str> {
    params
        .iter()
        .find(|(param, _)| param == name)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(ServerError::MissingParameter(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_value_wins() {
        let p = params(&[("other", "x"), ("key", "abc"), ("key", "def")]);
        assert_eq!(required_param(&p, "key").unwrap(), "abc");
    }

    #[test]
    fn absent_param_is_missing() {
        let p = params(&[("other", "x")]);
        let err = required_param(&p, "key").unwrap_err();
        assert_eq!(err.to_string(), "Missing param key");
    }

    #[test]
    fn empty_first_value_is_missing() {
        let p = params(&[("key", ""), ("key", "abc")]);
        assert!(matches!(
            required_param(&p, "key"),
            Err(ServerError::MissingParameter("key"))
        ));
    }

    #[test]
    fn query_pairs_are_decoded_in_order() {
        let pairs = parse_query("key=a%2Fb+c&flag&other=%E2%9C%93");
        assert_eq!(
            pairs,
            params(&[("key", "a/b c"), ("flag", ""), ("other", "\u{2713}")])
        );
    }

    #[test]
    fn malformed_pairs_are_dropped() {
        assert!(parse_query("key=%ZZ").is_empty());
        assert!(parse_query("key=%FF%FE").is_empty());
        assert!(parse_query("key=abc%").is_empty());
        assert!(parse_query("key=abc;def").is_empty());
        assert_eq!(parse_query("key=a&&&=&%"), params(&[("key", "a"), ("", "")]));
    }

    #[test]
    fn dropped_key_is_missing() {
        let pairs = parse_query("key=%ZZ&key=abc");
        assert_eq!(required_param(&pairs, "key").unwrap(), "abc");

        let pairs = parse_query("key=%4");
        assert!(matches!(
            required_param(&pairs, "key"),
            Err(ServerError::MissingParameter("key"))
        ));
    }

    #[test]
    fn already_processing_body() {
        let body = serde_json::to_string(&AlreadyProcessing::default()).unwrap();
        assert_eq!(body, r#"{"Error":"already processing"}"#);
    }
}
