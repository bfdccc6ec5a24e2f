//! Integration tests for the rally-ledger match tracker
//!
//! These tests drive the HTTP router end to end over the in-memory
//! spreadsheet, including:
//! - Remaining pairings for singles and doubles draws
//! - Standings tables
//! - Authenticated match submission and winner highlighting
//! - Error responses and monitoring endpoints

// Modules for organizing tests
mod fixtures;

use axum::http::StatusCode;
use fixtures::{create_test_app, get_json, post_json, send, READER_TOKEN, WRITER_TOKEN};
use rally_ledger::scoreboard::{Phase, Scoreboard};
use rally_ledger::types::Side;
use serde_json::{json, Value};

fn names(rows: &Value, field: &str) -> Vec<String> {
    rows.as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row[field].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_remaining_singles_pairings() {
    let (app, _sheets, _state) = create_test_app().await;

    let (status, body) = get_json(&app, "/api/match?type=single").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["remainingMatches"],
        json!(["Ana vs Zoe", "Leo vs Mia", "Mia vs Zoe"])
    );
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_missing_draw_defaults_to_single() {
    let (app, _sheets, _state) = create_test_app().await;

    let (status, body) = get_json(&app, "/api/match").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remainingMatches"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_remaining_doubles_series() {
    let (app, _sheets, _state) = create_test_app().await;

    let (status, body) = get_json(&app, "/api/match?type=double").await;

    assert_eq!(status, StatusCode::OK);
    // Eagles have already taken two of three against the Hawks
    assert_eq!(
        body["remainingMatches"],
        json!(["Eagles vs Owls", "Hawks vs Owls"])
    );
    assert_eq!(body["data"]["Eagles"]["Hawks"], json!({ "win": 2, "lose": 1 }));
    assert_eq!(body["data"]["Hawks"]["Eagles"], json!({ "win": 1, "lose": 2 }));
}

#[tokio::test]
async fn test_singles_standings() {
    let (app, _sheets, _state) = create_test_app().await;

    let (status, body) = get_json(&app, "/api/rank?type=single").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body, "name"), vec!["Leo", "Ana", "Mia", "Zoe"]);
    assert_eq!(
        body[0],
        json!({
            "name": "Leo",
            "win": 2,
            "lose": 0,
            "rank": 1,
            "totalPlayed": 2,
            "matchLeft": 1
        })
    );
    assert_eq!(body[1]["rank"], 2);
    // Mia and Zoe share the third place
    assert_eq!(body[2]["rank"], 3);
    assert_eq!(body[3]["rank"], 3);
    assert_eq!(body[3]["matchLeft"], 2);
}

#[tokio::test]
async fn test_doubles_standings() {
    let (app, _sheets, _state) = create_test_app().await;

    let (status, body) = get_json(&app, "/api/rank?type=double").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body, "name"), vec!["Eagles", "Hawks"]);

    let eagles = &body[0];
    assert_eq!(eagles["seriesWin"], 1);
    assert_eq!(eagles["seriesLose"], 0);
    assert_eq!(eagles["totalMatchPlayed"], 3);
    assert_eq!(eagles["seriesLeft"], 6);
    assert_eq!(eagles["points"].as_f64(), Some(2.5));

    let hawks = &body[1];
    assert_eq!(hawks["seriesLose"], 1);
    assert_eq!(hawks["points"].as_f64(), Some(-7.5));
    assert_eq!(hawks["rank"], 2);
}

#[tokio::test]
async fn test_unknown_draw_is_rejected() {
    let (app, _sheets, _state) = create_test_app().await;

    for uri in ["/api/match?type=mixed", "/api/rank?type=mixed"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["message"].as_str().unwrap_or_default().contains("mixed"));
    }

    let (status, _) = post_json(
        &app,
        "/api/match?type=mixed",
        Some(WRITER_TOKEN),
        &json!([["Mia", "11"], ["Zoe", "5"]]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_match_updates_sheet_and_tables() {
    let (app, sheets, _state) = create_test_app().await;

    let (status, receipt) = post_json(
        &app,
        "/api/match?type=single",
        Some(WRITER_TOKEN),
        &json!([["Mia", 11], ["Zoe", "5"]]),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["updatedRows"], 3);
    assert!(receipt["updatedRange"]
        .as_str()
        .unwrap_or_default()
        .starts_with("single!"));
    assert!(receipt["submissionId"].as_str().is_some());

    let rows = sheets.rows("single").unwrap();
    let tail: Vec<Vec<String>> = rows[rows.len() - 2..].to_vec();
    assert_eq!(tail, vec![vec!["Mia", "11"], vec!["Zoe", "5"]]);

    // One highlight rule per side of the new match
    assert_eq!(sheets.conditional_formats().len(), 2);

    let (_, remaining) = get_json(&app, "/api/match?type=single").await;
    assert_eq!(remaining["remainingMatches"], json!(["Ana vs Zoe", "Leo vs Mia"]));

    let (_, standings) = get_json(&app, "/api/rank?type=single").await;
    assert_eq!(names(&standings, "name"), vec!["Leo", "Ana", "Mia", "Zoe"]);
    // Ana and Mia are level at 1-1
    assert_eq!(standings[2]["win"], 1);
    assert_eq!(standings[1]["rank"], 2);
    assert_eq!(standings[2]["rank"], 2);
    assert_eq!(standings[3]["rank"], 3);
}

#[tokio::test]
async fn test_scoreboard_upload_round_trip() {
    let (app, sheets, _state) = create_test_app().await;

    let mut board = Scoreboard::new();
    board.select("Zoe vs Ana").unwrap();
    board.start().unwrap();
    for _ in 0..10 {
        board.point(Side::Home).unwrap();
    }
    board.point(Side::Away).unwrap();
    let phase = board.point(Side::Home).unwrap();
    assert_eq!(phase, Phase::Finished { winner: Side::Home });

    let rows = board.begin_upload().unwrap();
    let (status, _) = post_json(
        &app,
        "/api/match?type=single",
        Some(WRITER_TOKEN),
        &serde_json::to_value(&rows).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    board.upload_succeeded().unwrap();

    let stored = sheets.rows("single").unwrap();
    let zoe = &stored[stored.len() - 2];
    assert_eq!(&zoe[..3], &["Zoe", "11", "-"]);
    assert_eq!(zoe.len(), 3 + 12);

    let (_, standings) = get_json(&app, "/api/rank?type=single").await;
    let zoe = standings
        .as_array()
        .and_then(|rows| rows.iter().find(|row| row["name"] == "Zoe"))
        .cloned()
        .unwrap();
    assert_eq!(zoe["win"], 1);
    assert_eq!(zoe["lose"], 1);
}

#[tokio::test]
async fn test_submit_requires_write_permission() {
    let (app, sheets, _state) = create_test_app().await;
    let body = json!([["Mia", "11"], ["Zoe", "5"]]);
    let before = sheets.rows("single").unwrap().len();

    for token in [None, Some(READER_TOKEN), Some("forged")] {
        let (status, response) = post_json(&app, "/api/match?type=single", token, &body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{token:?}");
        assert_eq!(response, json!({ "error": "Unauthorized" }));
    }

    assert_eq!(sheets.rows("single").unwrap().len(), before);
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let (app, sheets, _state) = create_test_app().await;
    let before = sheets.rows("single").unwrap().len();

    let cases = [
        json!({ "rows": [] }),
        json!([["Mia", "11"]]),
        json!([["Mia", "11"], ["Mia", "5"]]),
        json!([["Mia", "10"], ["Zoe", "9"]]),
        json!([["Mia", 11], ["Zoe", 4294967295u64]]),
        json!([["Mia", "11"], ["Zoe", "1e20"]]),
    ];
    for body in cases {
        let (status, response) =
            post_json(&app, "/api/match?type=single", Some(WRITER_TOKEN), &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response["message"].is_string());
    }

    assert_eq!(sheets.rows("single").unwrap().len(), before);
    assert!(sheets.conditional_formats().is_empty());
}

#[tokio::test]
async fn test_concurrent_reads() {
    let (app, _sheets, _state) = create_test_app().await;

    let requests = (0..16).map(|i| {
        let app = app.clone();
        async move {
            let uri = if i % 2 == 0 {
                "/api/match?type=single"
            } else {
                "/api/rank?type=double"
            };
            get_json(&app, uri).await.0
        }
    });

    let statuses = futures::future::join_all(requests).await;
    assert!(statuses.iter().all(|status| *status == StatusCode::OK));
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let (app, _sheets, state) = create_test_app().await;

    let (status, health) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "rally-ledger-test");

    let (status, stats) = get_json(&app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["sheets_backend"], "memory");
    assert_eq!(stats["stats"]["auth_backend"], "static");

    post_json(
        &app,
        "/api/match?type=single",
        Some(WRITER_TOKEN),
        &json!([["Mia", "11"], ["Zoe", "5"]]),
    )
    .await;

    let request = axum::http::Request::builder()
        .uri("/metrics")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    let metrics = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(metrics.contains("rally_ledger_http_requests_total"));
    assert!(metrics.contains("rally_ledger_matches_submitted_total"));
    assert!(metrics.contains("rally_ledger_uptime_seconds"));

    state.shutdown().await.unwrap();
    let (status, _) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
