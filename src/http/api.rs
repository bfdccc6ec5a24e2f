//! JSON match API
//!
//! `GET /api/match` lists the pairings still to be played, `POST /api/match`
//! stores a finished match and `GET /api/rank` returns the standings. Every
//! route takes the draw in the `type` query parameter.

use crate::auth::require_permissions;
use crate::error::TrackerError;
use crate::service::app::AppState;
use crate::sheets::ValueGrid;
use crate::types::Draw;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

/// Query string shared by the match API routes
#[derive(Debug, Default, Deserialize)]
pub struct DrawQuery {
    #[serde(rename = "type")]
    pub draw: Option<String>,
}

impl DrawQuery {
    fn draw(&self) -> Result<Draw, ApiError> {
        match self.draw.as_deref() {
            None | Some("") => Ok(Draw::default()),
            Some(name) => name.parse().map_err(|e: TrackerError| ApiError::bad_request(e.to_string())),
        }
    }
}

/// An error answered as JSON
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "error": "Unauthorized" }),
        }
    }

    /// Map an operation failure to a response; `context` is what the caller
    /// sees for server-side failures
    pub fn from_error(error: anyhow::Error, context: &str) -> Self {
        match error.downcast_ref::<TrackerError>() {
            Some(TrackerError::UnknownDraw { .. })
            | Some(TrackerError::InvalidSubmission { .. })
            | Some(TrackerError::Scoreboard { .. }) => {
                warn!("Rejected request: {}", error);
                Self::bad_request(error.to_string())
            }
            Some(TrackerError::Unauthorized { reason }) => {
                warn!("Unauthorized request: {}", reason);
                Self::unauthorized()
            }
            _ => {
                error!("{}: {:#}", context, error);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: json!({ "message": context }),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse a submission body: a JSON array of rows of cells
pub fn parse_submission_body(body: &[u8]) -> Result<ValueGrid, ApiError> {
    let rows: Vec<Vec<Value>> = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid Request Body: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

/// `GET /api/match?type=<draw>`
pub async fn remaining_matches_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DrawQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let draw = query.draw()?;

    let remaining = state
        .ledger()
        .remaining_matches(draw)
        .await
        .map_err(|e| ApiError::from_error(e, "Error fetching data"))?;

    Ok(Json(remaining))
}

/// `POST /api/match?type=<draw>` with a bearer token holding the write permission
pub async fn record_match_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DrawQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let required = [state.config().auth.write_permission.clone()];

    require_permissions(state.authenticator().as_ref(), authorization, &required)
        .await
        .map_err(|e| ApiError::from_error(e, "Error checking permissions"))?;

    let draw = query.draw()?;
    let rows = parse_submission_body(&body)?;

    let receipt = state
        .ledger()
        .record_match(draw, rows)
        .await
        .map_err(|e| ApiError::from_error(e, "Error appending data"))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /api/rank?type=<draw>`
pub async fn standings_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DrawQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let draw = query.draw()?;

    let standings = state
        .ledger()
        .standings(draw)
        .await
        .map_err(|e| ApiError::from_error(e, "Error computing rankings"))?;

    Ok(Json(standings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submission_body_accepts_numbers_and_strings() {
        let rows = parse_submission_body(br#"[["Ana", 11, "-", 1, 0], ["Mia", "9", null]]"#).unwrap();
        assert_eq!(rows[0], vec!["Ana", "11", "-", "1", "0"]);
        assert_eq!(rows[1], vec!["Mia", "9", ""]);
    }

    #[test]
    fn test_parse_submission_body_rejects_non_arrays() {
        let err = parse_submission_body(br#"{"rows": []}"#).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(parse_submission_body(b"not json").is_err());
    }

    #[test]
    fn test_error_mapping() {
        let bad = ApiError::from_error(TrackerError::invalid_submission("odd rows").into(), "ctx");
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let denied = ApiError::from_error(TrackerError::unauthorized("no token").into(), "ctx");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let failed = ApiError::from_error(anyhow::anyhow!("connection reset"), "Error appending data");
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.body, json!({ "message": "Error appending data" }));
    }

    #[test]
    fn test_draw_query_defaults_to_single() {
        assert_eq!(DrawQuery::default().draw().unwrap(), Draw::Single);
        let query = DrawQuery {
            draw: Some("double-final".to_string()),
        };
        assert_eq!(query.draw().unwrap(), Draw::DoubleFinal);
        let unknown = DrawQuery {
            draw: Some("mixed".to_string()),
        };
        assert_eq!(unknown.draw().unwrap_err().status(), StatusCode::BAD_REQUEST);
    }
}
