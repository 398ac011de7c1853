//! Warehouse sink: loads a [`Table`] into a `BigQuery` table through a
//! multipart load job and blocks until the job finishes.

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use staydb_core::{AppConfig, WarehouseNamespace};
use uuid::Uuid;

use crate::auth::{load_service_account, TokenSource};
use crate::error::SinkError;
use crate::table::Table;

const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com";

/// What a load does when the destination table already has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDisposition {
    /// Overwrite the table's contents.
    #[default]
    Replace,
    Append,
    /// Refuse to load into a non-empty table.
    Fail,
}

impl WriteDisposition {
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            WriteDisposition::Replace => "WRITE_TRUNCATE",
            WriteDisposition::Append => "WRITE_APPEND",
            WriteDisposition::Fail => "WRITE_EMPTY",
        }
    }
}

impl std::fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteDisposition::Replace => write!(f, "replace"),
            WriteDisposition::Append => write!(f, "append"),
            WriteDisposition::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for WriteDisposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(WriteDisposition::Replace),
            "append" => Ok(WriteDisposition::Append),
            "fail" => Ok(WriteDisposition::Fail),
            other => Err(format!(
                "unknown write disposition '{other}'; expected replace, append or fail"
            )),
        }
    }
}

/// Outcome of a finished load job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub job_id: String,
    pub rows: usize,
}

#[derive(Debug, Deserialize)]
struct Job {
    status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    message: Option<String>,
}

/// Client for `BigQuery` load jobs.
///
/// Use [`BigQueryClient::new`] for production or
/// [`BigQueryClient::with_base_url`] to point at a mock server in tests.
pub struct BigQueryClient {
    client: Client,
    base_url: String,
    tokens: TokenSource,
    poll_interval: Duration,
    max_polls: u32,
}

impl BigQueryClient {
    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the HTTP client cannot be built.
    pub fn new(tokens: TokenSource, timeout_secs: u64) -> Result<Self, SinkError> {
        Self::with_base_url(tokens, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        tokens: TokenSource,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("staydb/0.1 (warehouse-load)")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            tokens,
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        })
    }

    /// Builds a client from the warehouse settings in `config`.
    ///
    /// A configured access token is used as-is; otherwise the
    /// service-account key file is read.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] or [`SinkError::Credentials`] if the key
    /// file is unusable, or [`SinkError::Http`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> Result<Self, SinkError> {
        let tokens = match &config.warehouse_access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::ServiceAccount(load_service_account(
                &config.warehouse_credentials_path,
            )?),
        };
        Ok(Self::with_base_url(
            tokens,
            config.warehouse_timeout_secs,
            &config.warehouse_base_url,
        )?
        .with_polling(
            Duration::from_millis(config.warehouse_poll_interval_ms),
            config.warehouse_max_polls,
        ))
    }

    /// Overrides how often and how many times a running job is polled.
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Loads `table` into `namespace` and waits for the job to finish.
    ///
    /// The CSV header row names the columns; column types are detected by
    /// the warehouse.
    ///
    /// # Errors
    ///
    /// - [`SinkError::EmptyRecords`] if `table` has no rows.
    /// - [`SinkError::TableExists`] under [`WriteDisposition::Fail`] when the
    ///   table already holds data.
    /// - [`SinkError::LoadFailed`] if the job reports an error or does not
    ///   finish within the polling budget.
    /// - [`SinkError::UnexpectedStatus`] for non-2xx API responses.
    /// - [`SinkError::Auth`] / [`SinkError::Http`] for auth and network failures.
    pub async fn load_table(
        &self,
        table: &Table,
        namespace: &WarehouseNamespace,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, SinkError> {
        if table.is_empty() {
            return Err(SinkError::EmptyRecords {
                target: namespace.to_string(),
            });
        }

        let token = self.tokens.token(&self.client).await?;
        let job_id = format!("staydb_load_{}", Uuid::new_v4().simple());
        let boundary = format!("staydb_{}", Uuid::new_v4().simple());

        let job_config = json!({
            "jobReference": {
                "projectId": namespace.project,
                "jobId": job_id,
            },
            "configuration": {
                "load": {
                    "destinationTable": {
                        "projectId": namespace.project,
                        "datasetId": namespace.dataset,
                        "tableId": namespace.table,
                    },
                    "sourceFormat": "CSV",
                    "skipLeadingRows": 1,
                    "autodetect": true,
                    "createDisposition": "CREATE_IF_NEEDED",
                    "writeDisposition": disposition.as_api_str(),
                }
            }
        });
        let body = multipart_body(&boundary, &job_config.to_string(), &table.to_csv_bytes()?);

        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs?uploadType=multipart",
            self.base_url, namespace.project
        );
        tracing::info!(
            table = %namespace,
            job_id = %job_id,
            rows = table.len(),
            disposition = %disposition,
            "submitting warehouse load job"
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let mut job = parse_job(response, "load job insert").await?;

        let mut polls = 0u32;
        while job.status.state != "DONE" {
            if polls >= self.max_polls {
                return Err(SinkError::LoadFailed {
                    table: namespace.to_string(),
                    reason: format!("job {job_id} still {} after {polls} polls", job.status.state),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let url = format!(
                "{}/bigquery/v2/projects/{}/jobs/{job_id}",
                self.base_url, namespace.project
            );
            let response = self.client.get(&url).bearer_auth(&token).send().await?;
            job = parse_job(response, "load job status").await?;
            tracing::debug!(job_id = %job_id, state = %job.status.state, polls, "polled load job");
        }

        if let Some(error) = job.status.error_result {
            let reason = error.reason.unwrap_or_default();
            if disposition == WriteDisposition::Fail && reason == "duplicate" {
                return Err(SinkError::TableExists {
                    table: namespace.to_string(),
                });
            }
            return Err(SinkError::LoadFailed {
                table: namespace.to_string(),
                reason: format!("{reason}: {}", error.message.unwrap_or_default()),
            });
        }

        tracing::info!(table = %namespace, job_id = %job_id, rows = table.len(), "warehouse load finished");
        Ok(LoadSummary {
            job_id,
            rows: table.len(),
        })
    }
}

/// Two-part `multipart/related` payload: job metadata then the CSV media.
fn multipart_body(boundary: &str, metadata: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/octet-stream\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn parse_job(response: reqwest::Response, context: &str) -> Result<Job, SinkError> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(SinkError::UnexpectedStatus {
            context: context.to_owned(),
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|source| SinkError::Json {
        context: context.to_owned(),
        source,
    })
}
