use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, RequestBuilder};

use crate::domain::DomainError;

/// Body of an outbound request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Binary(Bytes),
}

/// Trait for HTTP client operations (for mocking)
///
/// Responses are decoded as JSON; an empty response body yields `Value::Null`.
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: RequestBody,
    ) -> Result<serde_json::Value, DomainError>;

    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
    ) -> Result<serde_json::Value, DomainError> {
        self.send(Method::GET, url, headers, RequestBody::Empty).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        self.send(Method::POST, url, headers, RequestBody::Json(body.clone()))
            .await
    }

    async fn put_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        self.send(Method::PUT, url, headers, RequestBody::Json(body.clone()))
            .await
    }

    async fn post_bytes(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: Bytes,
    ) -> Result<serde_json::Value, DomainError> {
        self.send(Method::POST, url, headers, RequestBody::Binary(body))
            .await
    }
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn attach_body(request: RequestBuilder, body: RequestBody) -> RequestBuilder {
        match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Binary(bytes) => request.body(bytes),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: RequestBody,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.request(method, url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = Self::attach_body(request, body)
            .send()
            .await
            .map_err(|e| DomainError::service("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::service(
                "http",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::service("http", format!("Failed to read response: {}", e)))?;

        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::service("http", format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::RwLock;

    /// A request captured by the mock client
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: RequestBody,
    }

    #[derive(Debug)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, VecDeque<serde_json::Value>>>,
        errors: RwLock<HashMap<String, String>>,
        requests: RwLock<Vec<RecordedRequest>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self {
                responses: RwLock::new(HashMap::new()),
                errors: RwLock::new(HashMap::new()),
                requests: RwLock::new(Vec::new()),
            }
        }

        /// Respond to every request for `url` with `response`
        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.with_responses(url, vec![response])
        }

        /// Respond with each value in turn; the last one repeats
        pub fn with_responses(
            self,
            url: impl Into<String>,
            responses: Vec<serde_json::Value>,
        ) -> Self {
            self.responses
                .write()
                .unwrap()
                .insert(url.into(), responses.into());
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            self.errors.write().unwrap().insert(url.into(), error.into());
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.read().unwrap().clone()
        }
    }

    impl Default for MockHttpClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn send(
            &self,
            method: Method,
            url: &str,
            headers: Vec<(&str, &str)>,
            body: RequestBody,
        ) -> Result<serde_json::Value, DomainError> {
            self.requests.write().unwrap().push(RecordedRequest {
                method,
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body,
            });

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(DomainError::service("mock", error));
            }

            let mut responses = self.responses.write().unwrap();
            let queue = responses.get_mut(url).ok_or_else(|| {
                DomainError::service("mock", format!("No mock response for {}", url))
            })?;

            if queue.len() > 1 {
                Ok(queue.pop_front().unwrap_or_default())
            } else {
                Ok(queue.front().cloned().unwrap_or_default())
            }
        }
    }
}
