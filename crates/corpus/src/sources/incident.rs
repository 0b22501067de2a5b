//! Incident tracker API reader.
//!
//! Pages through `GET {base}/api/incidents?limit=N&offset=M` until a short
//! page or the configured page cap. Payloads are ServiceNow-shaped:
//! `{ "result": [ { "number", "short_description", "description", "state",
//! "updated_at" } ] }`, with the tracker's legacy field names accepted as
//! aliases.

use crate::sources::{parse_timestamp, SourceReader};
use crate::types::{Provenance, RawUnit, SourceBatch, SourceType};
use recall_core::{RecallError, RecallResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Reader for the incident tracker API.
pub struct IncidentReader {
    client: Client,
    base_url: String,
    token: Option<String>,
    page_size: usize,
    max_pages: usize,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct IncidentPage {
    #[serde(default)]
    result: Vec<IncidentRow>,
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    number: String,

    #[serde(default)]
    short_description: String,

    #[serde(default)]
    description: String,

    #[serde(default, alias = "status")]
    state: String,

    #[serde(default, alias = "sys_updated_on")]
    updated_at: Option<String>,
}

impl IncidentRow {
    fn to_text(&self) -> String {
        format!(
            "{} | {} | {} | state:{}",
            self.number, self.short_description, self.description, self.state
        )
    }
}

impl IncidentReader {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        page_size: usize,
        max_pages: usize,
        timeout: Duration,
    ) -> RecallResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecallError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            page_size,
            max_pages,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn page_url(&self, offset: usize) -> String {
        format!(
            "{}/api/incidents?limit={}&offset={}",
            self.base_url, self.page_size, offset
        )
    }

    async fn fetch_page(&self, offset: usize) -> RecallResult<IncidentPage> {
        let url = self.page_url(offset);
        tracing::debug!("Fetching incident page at {}", url);

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RecallError::Timeout("Incident API request".to_string(), self.timeout_secs)
            } else {
                RecallError::Api(format!("Failed to reach incident API: {}", e))
            }
        })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RecallError::Api(format!(
                "Incident API authentication failed ({})",
                status
            )));
        }

        if !status.is_success() {
            return Err(RecallError::Api(format!(
                "Incident API returned {}",
                status
            )));
        }

        response
            .json::<IncidentPage>()
            .await
            .map_err(|e| RecallError::Api(format!("Malformed incident payload: {}", e)))
    }
}

#[async_trait::async_trait]
impl SourceReader for IncidentReader {
    fn source_type(&self) -> SourceType {
        SourceType::Incident
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn read(&self) -> RecallResult<SourceBatch> {
        let mut units = Vec::new();
        let mut offset = 0;
        let mut complete = true;

        for page_index in 0.. {
            if page_index == self.max_pages {
                tracing::warn!(
                    "Stopping incident pagination at the {}-page cap; result set is incomplete",
                    self.max_pages
                );
                complete = false;
                break;
            }

            let page = self.fetch_page(offset).await?;
            let fetched = page.result.len();

            for row in page.result {
                units.push(RawUnit {
                    text: row.to_text(),
                    provenance: Provenance::Incident {
                        number: row.number.clone(),
                    },
                    created_at: row.updated_at.as_deref().and_then(parse_timestamp),
                });
            }

            // a short page means the tracker is exhausted
            if fetched < self.page_size {
                break;
            }

            offset += self.page_size;
        }

        tracing::debug!(
            "Read {} incidents from {} (complete: {})",
            units.len(),
            self.base_url,
            complete
        );

        Ok(SourceBatch {
            source_type: SourceType::Incident,
            units,
            complete,
        })
    }
}
