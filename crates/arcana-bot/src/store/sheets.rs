//! Spreadsheet values API over HTTP.
//!
//! Uses `ureq` (sync) inside `tokio::task::spawn_blocking`. Reads are
//! `GET {base}/v4/spreadsheets/{doc}/values/{range}`; appends are
//! `POST .../values/{range}:append?valueInputOption=RAW` with a
//! `{"values": [[...]]}` body.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use arcana_core::{Row, StoreError, StoreResult, TabularStore};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a [String]; 1],
}

/// Store backed by a remote spreadsheet document.
pub struct SheetsStore {
    base_url: String,
    document_id: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl SheetsStore {
    /// Create a store for `document_id`, authenticating with a bearer `token`.
    pub fn new(base_url: &str, document_id: &str, token: Option<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            document_id: document_id.to_string(),
            token: token.filter(|t| !t.is_empty()),
            agent,
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            encode_segment(&self.document_id),
            encode_segment(range)
        )
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

/// Percent-encode a path segment, keeping the characters A1 ranges use.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b':' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Render a JSON cell as the string a spreadsheet would display.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn unavailable(url: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{url}: {e}"))
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Unavailable(format!("store task failed: {e}"))
}

#[async_trait]
impl TabularStore for SheetsStore {
    async fn read_range(&self, range: &str) -> StoreResult<Vec<Row>> {
        let url = self.values_url(range);
        let auth = self.auth_header();
        let agent = self.agent.clone();
        debug!("reading {range}");

        let body: ValueRange = tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            if let Some(auth) = &auth {
                request = request.header("Authorization", auth);
            }
            let response = request.call().map_err(|e| unavailable(&url, e))?;
            response
                .into_body()
                .read_json::<ValueRange>()
                .map_err(|e| StoreError::Malformed(format!("{url}: {e}")))
        })
        .await
        .map_err(join_error)??;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn append_row(&self, range: &str, row: Row) -> StoreResult<()> {
        let url = format!("{}:append?valueInputOption=RAW", self.values_url(range));
        let auth = self.auth_header();
        let agent = self.agent.clone();
        debug!("appending to {range}");

        tokio::task::spawn_blocking(move || {
            let mut request = agent.post(&url);
            if let Some(auth) = &auth {
                request = request.header("Authorization", auth);
            }
            request
                .send_json(AppendBody { values: [&row] })
                .map_err(|e| unavailable(&url, e))?;
            Ok(())
        })
        .await
        .map_err(join_error)?
    }
}
