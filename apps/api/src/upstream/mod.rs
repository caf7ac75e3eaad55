//! Upstream client: the single point of entry for all calls to the prompt REST API.
//!
//! Every request carries the current bearer token. A 401 clears the token so the
//! dashboard is forced to re-authenticate; all other failures are classified into
//! `ApiError` variants that `AppError` turns into user-facing messages.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod resources;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound { message: Option<String> },

    #[error("Throttled (status {status})")]
    Throttled { status: u16, message: Option<String> },

    #[error("Upstream server error (status {status})")]
    Server { status: u16, message: Option<String> },

    #[error("Upstream returned status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The message supplied by the upstream response body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { message }
            | ApiError::Throttled { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extracts the `message` field from an error response body.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

/// Maps a non-success status and its body to an `ApiError`.
fn classify(status: StatusCode, body: &str) -> ApiError {
    let message = extract_message(body);
    match status.as_u16() {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound { message },
        409 | 429 => ApiError::Throttled {
            status: status.as_u16(),
            message,
        },
        s if status.is_server_error() => ApiError::Server { status: s, message },
        s => ApiError::Status { status: s, message },
    }
}

/// HTTP client for the upstream prompt API.
/// Cheap to clone; clones share the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Builds an endpoint URL from path segments. Segments are percent-encoded,
    /// so ids and tags can never escape their position in the path.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and returns the raw body of a successful response.
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<String, ApiError> {
        let url = self.url(segments)?;
        debug!("{} {}", method, url.path());

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok(text);
        }

        let error = classify(status, &text);
        if matches!(error, ApiError::Unauthorized) {
            warn!("Upstream rejected credentials on {} {}; clearing token", method, url.path());
            self.set_token(None);
        } else {
            warn!("Upstream {} {} returned {}", method, url.path(), status);
        }
        Err(error)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let text = self.execute(method, segments, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn send_empty(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<(), ApiError> {
        self.execute(method, segments, body).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> ApiClient {
        ApiClient::new(url, Some("secret".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_classify_status_codes() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, ""),
            ApiError::Forbidden
        ));
        assert!(matches!(
            classify(StatusCode::CONFLICT, ""),
            ApiError::Throttled { status: 409, .. }
        ));
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::Throttled { status: 429, .. }
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, ""),
            ApiError::Server { status: 502, .. }
        ));
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, ""),
            ApiError::Status { status: 400, .. }
        ));
    }

    #[test]
    fn test_classify_extracts_message() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            r#"{"message": "versionTag already exists"}"#,
        );
        assert_eq!(err.server_message(), Some("versionTag already exists"));
    }

    #[test]
    fn test_classify_ignores_non_json_body() {
        let err = classify(StatusCode::NOT_FOUND, "<html>gone</html>");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_url_encodes_segments() {
        let c = client("http://localhost:9000/api/");
        let url = c.url(&["projects", "p 1", "prompts", "../x"]).unwrap();
        assert_eq!(url.path(), "/api/projects/p%201/prompts/..%2Fx");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url", None, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let c = client(&server.url());
        let body: Value = c.send_json(Method::GET, &["health"], None).await.unwrap();
        assert_eq!(body["status"], "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects")
            .with_status(401)
            .create_async()
            .await;

        let c = client(&server.url());
        assert!(c.has_token());
        let err = c
            .send_json::<Value>(Method::GET, &["projects"], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!c.has_token());
    }

    #[tokio::test]
    async fn test_forbidden_keeps_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects")
            .with_status(403)
            .create_async()
            .await;

        let c = client(&server.url());
        let err = c
            .send_json::<Value>(Method::GET, &["projects"], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert!(c.has_token());
    }
}
