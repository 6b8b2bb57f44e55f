use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::search::model::RawSymbol;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request cancelled")]
    Cancelled,

    #[error("symbol search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("symbol search returned status {0}")]
    Status(StatusCode),

    #[error("failed to decode symbol search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Upstream provider of raw symbol records for a free-text query.
#[async_trait]
pub trait SuggestionSource: Send + Sync + 'static {
    async fn search(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<RawSymbol>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct HttpSuggestionSource {
    pub endpoint: String,
    pub query_param: String,
    pub(crate) inner: reqwest::Client,
}

impl HttpSuggestionSource {
    pub fn new(
        endpoint: impl Into<String>,
        query_param: impl Into<String>,
        http: &HttpConfig,
    ) -> Result<Self, SourceError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(http.connect_timeout_ms))
            .timeout(Duration::from_millis(http.request_timeout_ms))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            query_param: query_param.into(),
            inner,
        })
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
    async fn search(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<RawSymbol>, SourceError> {
        let req = self
            .inner
            .get(&self.endpoint)
            .query(&[(self.query_param.as_str(), query)]);

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(query, "symbol search cancelled before response");
                return Err(SourceError::Cancelled);
            }
            res = req.send() => res?,
        };

        let status = resp.status();
        if !status.is_success() {
            info!(query, status = %status.as_u16(), "symbol search non-success status");
            return Err(SourceError::Status(status));
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(query, "symbol search cancelled during body read");
                return Err(SourceError::Cancelled);
            }
            res = resp.text() => res?,
        };

        parse_records(&body)
    }
}

/// Decode a response body. A body that is valid JSON but not an array yields
/// no records; array elements that do not fit the record shape are skipped.
pub fn parse_records(body: &str) -> Result<Vec<RawSymbol>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let serde_json::Value::Array(items) = value else {
        debug!("symbol search response is not an array");
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawSymbol>(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};

    fn source(server: &Server) -> HttpSuggestionSource {
        HttpSuggestionSource::new(
            server.url_str("/symbol_search"),
            "text",
            &HttpConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn search_sends_query_parameter() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/symbol_search"),
                request::query(url_decoded(contains(("text", "RELI")))),
            ])
            .respond_with(json_encoded(serde_json::json!([
                {"full_name": "NSE:RELIANCE", "symbol": "RELIANCE", "exchange": "NSE", "type": "stock"},
                {"full_name": "BSE:RELIANCE", "symbol": "RELIANCE", "exchange": "BSE", "type": "stock"}
            ]))),
        );

        let records = source(&server)
            .search("RELI", CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].full_name.as_deref(), Some("NSE:RELIANCE"));
        assert_eq!(records[1].kind.as_deref(), Some("stock"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/symbol_search"))
                .respond_with(status_code(503).body("busy")),
        );
        let err = source(&server)
            .search("AAPL", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let source = HttpSuggestionSource::new(
            format!("http://127.0.0.1:{port}/symbol_search"),
            "text",
            &HttpConfig::default(),
        )
        .unwrap();
        let err = source
            .search("AAPL", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let server = Server::run();
        let token = CancellationToken::new();
        token.cancel();
        let err = source(&server).search("AAPL", token).await.unwrap_err();
        assert!(matches!(err, SourceError::Cancelled));
    }

    #[test]
    fn non_array_body_is_empty() {
        assert!(parse_records(r#"{"symbols": []}"#).unwrap().is_empty());
        assert!(parse_records("null").unwrap().is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let body = r#"[
            {"full_name": "NSE:TCS", "symbol": "TCS"},
            42,
            {"full_name": "NSE:INFY", "symbol": "INFY", "exchange": 7},
            {"full_name": "NSE:WIPRO", "symbol": "WIPRO"}
        ]"#;
        let records = parse_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].symbol.as_deref(), Some("WIPRO"));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(
            parse_records("<html>"),
            Err(SourceError::Decode(_))
        ));
    }
}
