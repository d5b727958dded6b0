//! graph::http
//!
//! Graph sink for a Neo4j server's transactional HTTP endpoint.
//!
//! Each statement is sent as its own auto-committed transaction:
//!
//! ```text
//! POST {url}/db/{database}/tx/commit
//! {"statements": [{"statement": "...", "parameters": {...}}]}
//! ```
//!
//! The response carries `results` (columns plus data rows) and `errors`.
//! A non-empty `errors` list is a query failure even on HTTP 200.
//!
//! The engine is synchronous, so the sink owns a private tokio runtime
//! and blocks on each request.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing::{debug, trace};

use super::{GraphSink, Row, SinkError, Statement};
use crate::core::config::Config;

/// User-Agent header value for graph requests.
const USER_AGENT_VALUE: &str = "git2graph";

/// Graph sink over HTTP.
pub struct HttpGraphSink {
    client: Client,
    runtime: Runtime,
    /// Full `tx/commit` URL.
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for HttpGraphSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGraphSink")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxData>,
}

#[derive(Debug, Deserialize)]
struct TxData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl HttpGraphSink {
    /// Sink for `database` on the server at `base_url`
    /// (e.g. `http://localhost:7474`).
    pub fn new(base_url: &str, database: &str) -> Result<Self, SinkError> {
        let runtime = Runtime::new().map_err(|e| SinkError::Connection {
            url: base_url.to_string(),
            message: format!("cannot start runtime: {e}"),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SinkError::Connection {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            runtime,
            endpoint: format!("{}/db/{}/tx/commit", base_url.trim_end_matches('/'), database),
            username: None,
            password: None,
        })
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_basic_auth(mut self, username: &str, password: Option<&str>) -> Self {
        self.username = Some(username.to_string());
        self.password = password.map(String::from);
        self
    }

    /// Sink configured from the `[graph]` section.
    pub fn from_config(config: &Config) -> Result<Self, SinkError> {
        let sink = Self::new(config.graph_url(), config.database())?;
        Ok(match config.graph_auth() {
            Some((user, password)) => sink.with_basic_auth(user, password),
            None => sink,
        })
    }

    /// The transaction endpoint statements are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        let body = json!({
            "statements": [{
                "statement": statement.cypher(),
                "parameters": statement.parameters(),
            }]
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_ref());
        }

        let response = request.send().await.map_err(|e| SinkError::Connection {
            url: self.endpoint.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SinkError::Status {
                    status: status.as_u16(),
                    message: format!("authentication rejected: {}", message.trim()),
                },
                _ => SinkError::Status {
                    status: status.as_u16(),
                    message: message.trim().to_string(),
                },
            });
        }

        let decoded: TxResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Decode(e.to_string()))?;
        rows_from(decoded)
    }
}

fn rows_from(response: TxResponse) -> Result<Vec<Row>, SinkError> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(SinkError::Query {
            code: error.code,
            message: error.message,
        });
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(vec![]);
    };

    result
        .data
        .into_iter()
        .map(|data| {
            if data.row.len() != result.columns.len() {
                return Err(SinkError::Decode(format!(
                    "row has {} values for {} columns",
                    data.row.len(),
                    result.columns.len()
                )));
            }
            Ok(result.columns.iter().cloned().zip(data.row).collect::<Row>())
        })
        .collect()
}

impl GraphSink for HttpGraphSink {
    fn run(&mut self, statement: &Statement) -> Result<Vec<Row>, SinkError> {
        trace!(kind = %statement.kind(), cypher = %statement.cypher(), "graph statement");
        let rows = self.runtime.block_on(self.execute(statement))?;
        debug!(kind = %statement.kind(), rows = rows.len(), "graph statement done");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: Value) -> Result<Vec<Row>, SinkError> {
        rows_from(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn endpoint_from_base_url() {
        let sink = HttpGraphSink::new("http://localhost:7474/", "commits").unwrap();
        assert_eq!(sink.endpoint(), "http://localhost:7474/db/commits/tx/commit");
    }

    #[test]
    fn debug_hides_password() {
        let sink = HttpGraphSink::new("http://localhost:7474", "neo4j")
            .unwrap()
            .with_basic_auth("neo4j", Some("hunter2"));
        assert!(!format!("{sink:?}").contains("hunter2"));
    }

    #[test]
    fn rows_zip_columns() {
        let rows = decode(json!({
            "results": [{"columns": ["count"], "data": [{"row": [3], "meta": [null]}]}],
            "errors": []
        }))
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["count"], json!(3));
    }

    #[test]
    fn errors_become_query_failures() {
        let err = decode(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Schema.ConstraintValidationFailed", "message": "dup"}]
        }))
        .unwrap_err();
        assert!(matches!(err, SinkError::Query { ref code, .. } if code.ends_with("ConstraintValidationFailed")));
    }

    #[test]
    fn empty_results_are_no_rows() {
        assert!(decode(json!({"results": [], "errors": []})).unwrap().is_empty());
    }

    #[test]
    fn ragged_row_is_decode_error() {
        let err = decode(json!({
            "results": [{"columns": ["a", "b"], "data": [{"row": [1]}]}],
            "errors": []
        }))
        .unwrap_err();
        assert!(matches!(err, SinkError::Decode(_)));
    }
}
