//! HttpQueryBackend -- concrete [`QueryBackend`] over the analytics HTTP API.
//!
//! Two endpoints:
//! - `POST /api/data-lake {company_id}` initializes a data source.
//! - `POST /api/process-query {company_id, query}` answers a query with
//!   `{type: "text", answer}` or `{type: "graph", graphData}`.
//!
//! The optional API key is wrapped in [`secrecy::SecretString`] and only
//! exposed when building the `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use lakechat_core::backend::QueryBackend;
use lakechat_types::config::ClientConfig;
use lakechat_types::error::BackendError;
use lakechat_types::query::QueryResult;

const DATA_LAKE_PATH: &str = "/api/data-lake";
const PROCESS_QUERY_PATH: &str = "/api/process-query";

#[derive(Serialize)]
struct DataLakeRequest<'a> {
    company_id: &'a str,
}

#[derive(Serialize)]
struct ProcessQueryRequest<'a> {
    company_id: &'a str,
    query: &'a str,
}

/// Query backend reached over HTTP.
///
/// Does not derive Debug: the api key must never reach logs.
pub struct HttpQueryBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpQueryBackend {
    /// Create a client for the backend at `base_url`.
    ///
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key: None,
            timeout,
        })
    }

    /// Build a client from the loaded client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        let backend = Self::new(config.backend_url.clone(), config.request_timeout())?;
        Ok(match &config.api_key {
            Some(key) => backend.with_api_key(SecretString::from(key.clone())),
            None => backend,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and return the response text of a 2xx reply.
    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<String, BackendError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => BackendError::Unauthenticated,
                _ => BackendError::Unavailable(format!("HTTP {status}: {text}")),
            });
        }

        Ok(text)
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Unavailable(format!("HTTP request failed: {e}"))
        }
    }
}

impl QueryBackend for HttpQueryBackend {
    async fn initialize_data_source(&self, company_id: &str) -> Result<(), BackendError> {
        self.post(DATA_LAKE_PATH, &DataLakeRequest { company_id })
            .await?;
        debug!("Data source initialized");
        Ok(())
    }

    async fn submit_query(&self, company_id: &str, query: &str) -> Result<QueryResult, BackendError> {
        let body = self
            .post(PROCESS_QUERY_PATH, &ProcessQueryRequest { company_id, query })
            .await?;

        let result: QueryResult = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(format!("failed to parse reply: {e}")))?;

        debug!(graph = result.is_graph(), "Query answered");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use lakechat_types::chart::ChartKind;
    use serde_json::{Value, json};

    #[derive(Clone, Default)]
    struct Recorded {
        bodies: Arc<Mutex<Vec<Value>>>,
        auth: Arc<Mutex<Vec<Option<String>>>>,
    }

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn recording_router(reply: Value) -> (Router, Recorded) {
        let recorded = Recorded::default();
        let reply = Arc::new(reply);
        let router = Router::new()
            .route(
                "/api/data-lake",
                post(
                    |State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        rec.bodies.lock().unwrap().push(body);
                        rec.auth.lock().unwrap().push(
                            headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string),
                        );
                        StatusCode::OK
                    },
                ),
            )
            .route(
                "/api/process-query",
                post({
                    let reply = Arc::clone(&reply);
                    move |State(rec): State<Recorded>, Json(body): Json<Value>| {
                        let reply = Arc::clone(&reply);
                        async move {
                            rec.bodies.lock().unwrap().push(body);
                            Json((*reply).clone())
                        }
                    }
                }),
            )
            .with_state(recorded.clone());
        (router, recorded)
    }

    #[tokio::test]
    async fn test_initialize_sends_company_id() {
        let (router, recorded) = recording_router(json!({}));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        backend.initialize_data_source("acme-co").await.unwrap();

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies[0], json!({"company_id": "acme-co"}));
        assert_eq!(recorded.auth.lock().unwrap()[0], None);
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let (router, recorded) = recording_router(json!({}));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5))
            .unwrap()
            .with_api_key(SecretString::from("s3cret".to_string()));

        backend.initialize_data_source("acme-co").await.unwrap();

        assert_eq!(
            recorded.auth.lock().unwrap()[0].as_deref(),
            Some("Bearer s3cret")
        );
    }

    #[tokio::test]
    async fn test_text_reply() {
        let (router, recorded) =
            recording_router(json!({"type": "text", "answer": "42 orders last week"}));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let result = backend
            .submit_query("acme-co", "how many orders?")
            .await
            .unwrap();

        assert_eq!(
            result,
            QueryResult::Text {
                answer: "42 orders last week".to_string()
            }
        );
        assert_eq!(
            recorded.bodies.lock().unwrap()[0],
            json!({"company_id": "acme-co", "query": "how many orders?"})
        );
    }

    #[tokio::test]
    async fn test_graph_reply() {
        let (router, _recorded) = recording_router(json!({
            "type": "graph",
            "graphData": {"kind": "bar", "series": [{"name": "revenue", "data": [10, 20, 30, 40]}]}
        }));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let result = backend.submit_query("acme-co", "revenue").await.unwrap();

        match result {
            QueryResult::Graph { graph_data } => {
                assert_eq!(graph_data.kind, ChartKind::Bar);
                assert_eq!(graph_data.series_count(), 1);
            }
            other => panic!("expected graph reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_reply_type_is_malformed() {
        let (router, _recorded) = recording_router(json!({"type": "table", "rows": []}));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let err = backend.submit_query("acme-co", "x").await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_text_reply_without_answer_is_malformed() {
        let (router, _recorded) = recording_router(json!({"type": "text"}));
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let err = backend.submit_query("acme-co", "x").await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/api/process-query",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "warehouse offline") }),
        );
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let err = backend.submit_query("acme-co", "x").await.unwrap_err();
        match err {
            BackendError::Unavailable(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("warehouse offline"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_unauthenticated() {
        let router = Router::new().route(
            "/api/data-lake",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let base = serve(router).await;
        let backend = HttpQueryBackend::new(base, Duration::from_secs(5)).unwrap();

        let err = backend.initialize_data_source("acme-co").await.unwrap_err();
        assert_eq!(err, BackendError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let router = Router::new().route(
            "/api/process-query",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let base = serve(router).await;
        let timeout = Duration::from_millis(100);
        let backend = HttpQueryBackend::new(base, timeout).unwrap();

        let err = backend.submit_query("acme-co", "x").await.unwrap_err();
        assert_eq!(err, BackendError::Timeout(timeout));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend =
            HttpQueryBackend::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let err = backend.initialize_data_source("acme-co").await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend =
            HttpQueryBackend::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_from_config_applies_timeout_floor() {
        let config = ClientConfig {
            request_timeout_secs: 0,
            api_key: Some("k".to_string()),
            ..ClientConfig::default()
        };
        let backend = HttpQueryBackend::from_config(&config).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(1));
        assert!(backend.api_key.is_some());
    }
}
