//! Boundary to the external bitmap-index query engine.
//!
//! Queries are POSTed as plain text to `/index/<index>/query`; the engine
//! answers with a JSON body carrying one result object per query statement
//! in the payload. The [`Engine`] trait is the seam the dispatch and grouped
//! runners work against, so tests substitute an in-process fake.

use serde::Deserialize;

use crate::BenchError;

/// Substring the engine uses to reject range predicates it does not
/// understand. Older engine builds fail `><` (BETWEEN) filters this way.
pub const UNSUPPORTED_RANGE_MSG: &str = "invalid argument value";

/// One aggregate answer from the engine. Sum queries fill both fields,
/// count queries only `count`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EngineValue {
    #[serde(default)]
    pub sum: i64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<EngineValue>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// Anything that can answer a payload of query statements with one
/// [`EngineValue`] per statement. Shared across worker threads.
pub trait Engine: Sync {
    fn query(&self, pql: &str) -> Result<Vec<EngineValue>, BenchError>;
}

/// HTTP client for a real engine endpoint. Cheap to clone URLs out of;
/// the underlying connection pool is shared by reference across threads.
pub struct EngineClient {
    http: reqwest::blocking::Client,
    query_url: String,
    base_url: String,
}

impl EngineClient {
    /// `addr` is `host:port`; `index` names the engine-side index to query.
    pub fn new(addr: &str, index: &str) -> Result<EngineClient, BenchError> {
        // benchmark payloads can run for minutes, so no total request timeout
        let http = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| BenchError::EngineCall(format!("building http client: {}", e)))?;
        let base_url = format!("http://{}", addr);
        let query_url = format!("{}/index/{}/query", base_url, index);
        Ok(EngineClient { http, query_url, base_url })
    }

    /// Engine build version from `GET /version`.
    pub fn server_version(&self) -> Result<String, BenchError> {
        let resp = self
            .http
            .get(format!("{}/version", self.base_url))
            .send()
            .map_err(|e| BenchError::EngineCall(e.to_string()))?;
        let v: VersionResponse = resp
            .json()
            .map_err(|e| BenchError::EngineCall(format!("bad version response: {}", e)))?;
        Ok(v.version)
    }

    /// Total record count of the data set, computed by summing the
    /// cardinality of each manufacturer row. Every record carries exactly
    /// one manufacturer, so the rows partition the record space.
    pub fn record_count(&self) -> Result<u64, BenchError> {
        let mut total = 0u64;
        for mfgr in 0..5 {
            let q = format!("Count(Bitmap(frame=\"p_mfgr\", rowID={}))", mfgr);
            let results = self.query(&q)?;
            total += results.first().map(|r| r.count).unwrap_or(0);
        }
        Ok(total)
    }
}

impl Engine for EngineClient {
    fn query(&self, pql: &str) -> Result<Vec<EngineValue>, BenchError> {
        let resp = self
            .http
            .post(&self.query_url)
            .body(pql.to_string())
            .send()
            .map_err(|e| BenchError::EngineCall(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| BenchError::EngineCall(e.to_string()))?;
        if !status.is_success() {
            return Err(classify(format!("status {}: {}", status, body.trim())));
        }
        let parsed: QueryResponse = serde_json::from_str(&body)
            .map_err(|e| BenchError::EngineCall(format!("bad response body: {}", e)))?;
        if let Some(msg) = parsed.error {
            return Err(classify(msg));
        }
        Ok(parsed.results)
    }
}

fn classify(msg: String) -> BenchError {
    if msg.contains(UNSUPPORTED_RANGE_MSG) {
        BenchError::EngineUnsupported(msg)
    } else {
        BenchError::EngineCall(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        let err = classify("executing: invalid argument value".to_string());
        assert!(matches!(err, BenchError::EngineUnsupported(_)));
        let err = classify("connection refused".to_string());
        assert!(matches!(err, BenchError::EngineCall(_)));
    }

    #[test]
    fn response_parsing() {
        let body = r#"{"results":[{"sum":100,"count":3},{"sum":-2,"count":1}]}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].sum, 100);
        assert_eq!(parsed.results[1].sum, -2);
        assert!(parsed.error.is_none());

        // count-only answers leave sum at its default
        let body = r#"{"results":[{"count":7}]}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results[0].count, 7);
        assert_eq!(parsed.results[0].sum, 0);

        let body = r#"{"error":"executing: parse error"}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.results.is_empty());
        assert_eq!(parsed.error.as_deref(), Some("executing: parse error"));
    }
}
