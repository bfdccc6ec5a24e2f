//! Google Sheets REST client
//!
//! Talks to the Sheets v4 API with a service account. Tokens come from one
//! shared yup-oauth2 authenticator, which keeps them until they expire;
//! every call is timed into the metrics collector.

use crate::config::SheetsSettings;
use crate::error::{Result, TrackerError};
use crate::metrics::MetricsCollector;
use crate::sheets::client::{AppendOutcome, ConditionalFormatRule, SheetsClient, ValueGrid};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator, ServiceAccountKey};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

type ApiResult<T> = std::result::Result<T, GoogleSheetsError>;

#[derive(Debug, thiserror::Error)]
pub enum GoogleSheetsError {
    #[error(transparent)]
    OAuth(#[from] yup_oauth2::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("invalid request URL: {0}")]
    Url(String),
    #[error("Sheets API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("empty token is not valid")]
    EmptyToken,
    #[error("OAuth token is expired")]
    TokenExpired,
}

impl From<GoogleSheetsError> for TrackerError {
    fn from(e: GoogleSheetsError) -> Self {
        TrackerError::SheetRequestFailed {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Credentials {
    KeyFile(PathBuf),
    Inline(ServiceAccountKey),
}

/// Spreadsheet client backed by the Google Sheets API
pub struct GoogleSheetsClient {
    http_client: reqwest::Client,
    spreadsheet_id: String,
    credentials: Credentials,
    /// Built on first use
    authenticator: OnceCell<DefaultAuthenticator>,
    metrics: Arc<MetricsCollector>,
}

/// Service account key from the inline settings; `\n` escapes in the key become newlines
fn inline_key(settings: &SheetsSettings) -> Result<ServiceAccountKey> {
    let (Some(client_email), Some(private_key)) = (&settings.client_email, &settings.private_key)
    else {
        return Err(TrackerError::ConfigurationError {
            message: "CLIENT_EMAIL and PRIVATE_KEY are required without a credentials file"
                .to_string(),
        }
        .into());
    };

    let key = json!({
        "type": "service_account",
        "project_id": settings.project_id,
        "private_key": private_key.replace("\\n", "\n"),
        "client_email": client_email,
        "token_uri": TOKEN_URI,
    });
    Ok(serde_json::from_value(key)?)
}

/// Numbers go out as numbers so sheet formulas compare them numerically
fn cell_value(cell: String) -> Value {
    match cell.parse::<u64>() {
        Ok(number) => Value::from(number),
        Err(_) => Value::String(cell),
    }
}

fn rule_request(rule: &ConditionalFormatRule) -> Value {
    json!({
        "addConditionalFormatRule": {
            "rule": {
                "ranges": [{
                    "sheetId": rule.sheet_id,
                    "startRowIndex": rule.start_row_index,
                    "endRowIndex": rule.end_row_index,
                    "startColumnIndex": rule.start_column_index,
                    "endColumnIndex": rule.end_column_index,
                }],
                "booleanRule": {
                    "condition": {
                        "type": "CUSTOM_FORMULA",
                        "values": [{ "userEnteredValue": rule.formula }],
                    },
                    "format": {
                        "backgroundColor": {
                            "red": rule.background.red,
                            "green": rule.background.green,
                            "blue": rule.background.blue,
                        },
                    },
                },
            },
        },
    })
}

impl GoogleSheetsClient {
    /// Create a client for the configured spreadsheet
    pub fn new(
        settings: &SheetsSettings,
        request_timeout: Duration,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let credentials = match &settings.credentials_path {
            Some(path) => Credentials::KeyFile(path.clone()),
            None => Credentials::Inline(inline_key(settings)?),
        };

        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            spreadsheet_id: settings.spreadsheet_id.clone(),
            credentials,
            authenticator: OnceCell::new(),
            metrics,
        })
    }

    async fn authenticator(&self) -> ApiResult<&DefaultAuthenticator> {
        self.authenticator
            .get_or_try_init(|| async {
                let key = match &self.credentials {
                    Credentials::KeyFile(path) => read_service_account_key(path).await?,
                    Credentials::Inline(key) => key.clone(),
                };
                debug!("Building service account authenticator");
                let auth = ServiceAccountAuthenticator::builder(key).build().await?;
                Ok::<_, GoogleSheetsError>(auth)
            })
            .await
    }

    async fn access_token(&self) -> ApiResult<String> {
        let token = self.authenticator().await?.token(SCOPES).await?;
        if token.is_expired() {
            return Err(GoogleSheetsError::TokenExpired);
        }
        match token.token() {
            Some(token) if !token.is_empty() => Ok(token.to_owned()),
            _ => Err(GoogleSheetsError::EmptyToken),
        }
    }

    /// `{API_BASE}/{spreadsheet_id}{suffix}/{segments...}`
    fn endpoint(&self, suffix: &str, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(API_BASE).map_err(|e| GoogleSheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GoogleSheetsError::Url(API_BASE.to_string()))?
            .push(&format!("{}{}", self.spreadsheet_id, suffix))
            .extend(segments);
        Ok(url)
    }

    async fn send_checked(request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GoogleSheetsError::Api { status, body })
        }
    }

    /// Run one API call, recording its outcome and duration
    async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let start = Instant::now();
        let result = call.await;
        let elapsed = start.elapsed();
        self.metrics
            .record_sheet_request(operation, result.is_ok(), elapsed);

        match result {
            Ok(value) => {
                debug!(
                    "Sheets {} succeeded in {:.2}ms",
                    operation,
                    elapsed.as_secs_f64() * 1000.0
                );
                Ok(value)
            }
            Err(e) => {
                warn!("Sheets {} failed: {}", operation, e);
                Err(TrackerError::from(e).into())
            }
        }
    }
}

#[async_trait]
impl SheetsClient for GoogleSheetsClient {
    async fn batch_get(&self, ranges: &[String]) -> Result<Vec<ValueGrid>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct BatchGetResponse {
            #[serde(default)]
            value_ranges: Vec<ValueRange>,
        }

        #[derive(Deserialize)]
        struct ValueRange {
            #[serde(default)]
            values: ValueGrid,
        }

        self.timed("batch_get", async {
            let token = self.access_token().await?;
            let mut query: Vec<(&str, &str)> =
                ranges.iter().map(|r| ("ranges", r.as_str())).collect();
            query.extend([
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "FORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ]);

            let url = self.endpoint("", &["values:batchGet"])?;
            let response: BatchGetResponse = Self::send_checked(
                self.http_client.get(url).bearer_auth(&token).query(&query),
            )
            .await?
            .json()
            .await?;

            let mut grids: Vec<ValueGrid> = response
                .value_ranges
                .into_iter()
                .map(|range| range.values)
                .collect();
            grids.resize(ranges.len(), Vec::new());
            Ok::<_, GoogleSheetsError>(grids)
        })
        .await
    }

    async fn append(&self, sheet: &str, rows: ValueGrid) -> Result<AppendOutcome> {
        #[derive(Deserialize)]
        struct AppendResponse {
            updates: AppendOutcome,
        }

        let values: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_value).collect())
            .collect();

        self.timed("append", async {
            let token = self.access_token().await?;
            let url = self.endpoint("", &["values", &format!("{sheet}:append")])?;
            let response: AppendResponse = Self::send_checked(
                self.http_client
                    .post(url)
                    .bearer_auth(&token)
                    .query(&[
                        ("valueInputOption", "RAW"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&json!({ "values": values })),
            )
            .await?
            .json()
            .await?;
            Ok::<_, GoogleSheetsError>(response.updates)
        })
        .await
    }

    async fn sheet_id(&self, title: &str) -> Result<Option<i64>> {
        #[derive(Deserialize)]
        struct Spreadsheet {
            #[serde(default)]
            sheets: Vec<Sheet>,
        }

        #[derive(Deserialize)]
        struct Sheet {
            properties: SheetProperties,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SheetProperties {
            sheet_id: i64,
            title: String,
        }

        self.timed("get_spreadsheet", async {
            let token = self.access_token().await?;
            let url = self.endpoint("", &[])?;
            let spreadsheet: Spreadsheet = Self::send_checked(
                self.http_client
                    .get(url)
                    .bearer_auth(&token)
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await?
            .json()
            .await?;

            Ok::<_, GoogleSheetsError>(spreadsheet
                .sheets
                .into_iter()
                .find(|sheet| sheet.properties.title == title)
                .map(|sheet| sheet.properties.sheet_id))
        })
        .await
    }

    async fn add_conditional_formats(&self, rules: Vec<ConditionalFormatRule>) -> Result<()> {
        if rules.is_empty() {
            return Ok(());
        }
        let requests: Vec<Value> = rules.iter().map(rule_request).collect();

        self.timed("batch_update", async {
            let token = self.access_token().await?;
            let url = self.endpoint(":batchUpdate", &[])?;
            Self::send_checked(
                self.http_client
                    .post(url)
                    .bearer_auth(&token)
                    .json(&json!({ "requests": requests })),
            )
            .await?;
            Ok::<_, GoogleSheetsError>(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "google"
    }
}
