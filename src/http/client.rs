//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::LINK;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable};

/// A decoded JSON body together with the response's `Link` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked<T> {
    pub body: T,
    pub link: Option<String>,
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Overrides the pause between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_query(url, &[]).await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        Ok(self.get_json_with_link(url, query).await?.body)
    }

    /// Like [`get_json_with_query`](Self::get_json_with_query), but also
    /// returns the `Link` header used for pagination.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_link<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Linked<T>> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            let link = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .map(String::from);

            let body = response
                .json::<T>()
                .await
                .context("Failed to parse JSON response")?;

            Ok(Linked { body, link })
        })
        .await
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name,
                            attempt,
                            MAX_RETRIES,
                            e,
                            self.retry_delay.as_millis()
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}

/// Everything that isn't explicitly non-retryable is retried.
fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
