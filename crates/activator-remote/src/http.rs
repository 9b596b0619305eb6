// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared JSON-over-HTTP plumbing.
//!
//! Each adapter maps [`HttpError`] onto the `ActivatorError` kind of its
//! concern (inference, execution, cluster control).

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to a collaborator.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// JSON client bound to one collaborator base URL.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl JsonClient {
    /// Build a client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Disable retries for non-idempotent endpoints.
    pub fn without_retries(mut self) -> Self {
        self.max_retries = 0;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` as JSON and decode the JSON reply.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.send(&url, || self.client.post(&url).json(body)).await
    }

    /// POST `body` as JSON, ignoring the reply body.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        self.send_raw(&url, || self.client.post(&url).json(body))
            .await
            .map(|_| ())
    }

    /// GET and decode the JSON reply.
    pub async fn get<T>(&self, path: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.send(&url, || self.client.get(&url)).await
    }

    async fn send<T, F>(&self, url: &str, build: F) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let body = self.send_raw(url, build).await?;
        serde_json::from_str(&body).map_err(|e| HttpError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Send with one retry on transient statuses; returns the body text.
    async fn send_raw<F>(&self, url: &str, build: F) -> Result<String, HttpError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build().send().await.map_err(|source| HttpError::Transport {
                url: url.to_string(),
                source,
            })?;
            let status = response.status();
            debug!(url, status = %status, attempt, "collaborator responded");

            let body = response.text().await.map_err(|source| HttpError::Transport {
                url: url.to_string(),
                source,
            })?;
            if status.is_success() {
                return Ok(body);
            }
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(url, status = %status, "transient error, will retry");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }
            return Err(HttpError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn url_joins_without_double_slash() {
        let client = JsonClient::new("http://svc:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/infer"), "http://svc:8000/infer");
        assert_eq!(client.url("tiers/a/status"), "http://svc:8000/tiers/a/status");
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = JsonClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let body: serde_json::Value = client.get("/ping").await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn no_retry_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/run"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = JsonClient::new(&server.uri(), Duration::from_secs(5))
            .unwrap()
            .without_retries();
        let err = client
            .post::<_, serde_json::Value>("/run", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Status { ref body, .. } if body == "busy"));
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = JsonClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.get::<serde_json::Value>("/status").await.unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
    }
}
