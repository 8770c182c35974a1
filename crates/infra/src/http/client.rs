use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use taskbridge_common::resilience::policies::ClassifiedRetry;
use taskbridge_common::{RetryConfig, RetryError, RetryExecutor};
use taskbridge_core::{Attempted, RemoteError, RemoteFailure, RemoteResult};
use taskbridge_domain::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use taskbridge_domain::{RetryPolicy, TaskBridgeError};
use tracing::{debug, instrument};

use crate::errors::{remote_error, InfraError};

/// HTTP client with built-in retry and timeout support.
///
/// Every call runs through the shared retry executor: transient statuses,
/// timeouts and refused connections are retried with exponential backoff,
/// anything else ends the call on the first attempt.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryConfig,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TaskBridgeError> {
        Self::builder().build()
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Execute one request with retry semantics and return the response text.
    ///
    /// The request is rebuilt for every attempt. A non-success status becomes
    /// [`RemoteError::Http`] carrying the response body when it is JSON.
    #[instrument(skip_all, fields(%method, %url))]
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> RemoteResult<String> {
        let executor = RetryExecutor::new(self.retry.clone(), ClassifiedRetry);
        let outcome =
            executor.execute_with_outcome(|| self.attempt(method.clone(), url, body)).await;
        let retries = outcome.retries();

        match outcome.result {
            Ok(text) => Ok(Attempted::new(text, retries)),
            Err(
                RetryError::AttemptsExhausted { error, .. }
                | RetryError::NonRetryable { error, .. },
            ) => Err(RemoteFailure::new(error, retries)),
            Err(RetryError::InvalidConfiguration { message }) => {
                Err(RemoteFailure::new(RemoteError::Transport(message), retries))
            }
        }
    }

    /// [`Self::execute`] followed by JSON decoding of the success body.
    ///
    /// An empty success body decodes as `{}`.
    pub async fn execute_json<T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> RemoteResult<T>
    where
        T: DeserializeOwned,
    {
        let attempted = self.execute(method, url, body).await?;
        let retries = attempted.retries;
        let text = if attempted.value.trim().is_empty() { "{}" } else { attempted.value.as_str() };

        serde_json::from_str(text)
            .map(|value| Attempted::new(value, retries))
            .map_err(|err| RemoteFailure::new(RemoteError::Decode(err.to_string()), retries))
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<String, RemoteError> {
        let mut builder = self.client.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "sending HTTP request");
        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            remote_error(err)
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");
        let text = response.text().await.map_err(remote_error)?;

        if status.is_success() {
            Ok(text)
        } else {
            let body = serde_json::from_str(&text).ok();
            Err(RemoteError::Http { status: status.as_u16(), body })
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry_policy: RetryPolicy,
    user_agent: String,
    default_headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
            user_agent: USER_AGENT.to_string(),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry budget and backoff applied to every call.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, TaskBridgeError> {
        let retry = RetryConfig::builder()
            .max_attempts(self.retry_policy.total_attempts())
            .exponential_backoff(
                self.retry_policy.initial_delay(),
                self.retry_policy.backoff_factor,
            )
            .build()
            .map_err(|err| TaskBridgeError::Config(err.to_string()))?;

        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).user_agent(self.user_agent).no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            TaskBridgeError::from(infra)
        })?;

        Ok(HttpClient { client, retry })
    }
}
