use std::{fmt, time::Duration};

use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::sleep;

use crate::config;

/// Retry-After values above this are treated as abnormal and ignored in
/// favor of the computed backoff.
const RETRY_AFTER_SANITY_CAP: u64 = 120;

/// Error surface of the retrying remote client.
#[derive(Debug)]
pub enum RemoteError {
    /// All retry attempts were exhausted on transient failures. Fails the
    /// enclosing batch, never the whole run.
    Unavailable { attempts: u32, last: String },
    /// A non-transient HTTP, network or decoding failure.
    Http(reqwest::Error),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Unavailable { attempts, last } => {
                write!(f, "remote unavailable after {} attempts ({})", attempts, last)
            }
            RemoteError::Http(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Http(err)
    }
}

/// Retry behavior for transient remote failures: a bounded number of
/// attempts with an exponential delay clamped into a min/max window.
///
/// The policy is a plain value so it can be exercised in isolation; the
/// [`RetryClient`] composes it with an HTTP client and a per-request timeout.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        Self {
            max_attempts: config::max_retries().max(1),
            ..Self::default()
        }
    }

    /// Statuses the Spotify API returns for transient conditions worth
    /// retrying: rate limiting and server-side errors.
    pub fn is_transient(status: StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
    }

    /// Delay before the retry following the given attempt (1-based).
    ///
    /// A server-provided `Retry-After` hint wins as long as it is not
    /// abnormally high; otherwise the delay doubles per attempt, clamped
    /// into the `min_delay..=max_delay` window.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        if let Some(secs) = retry_after {
            if secs <= RETRY_AFTER_SANITY_CAP {
                return Duration::from_secs(secs);
            }
        }

        let shift = attempt.saturating_sub(1).min(16);
        let exp = self.min_delay.as_secs().saturating_mul(1u64 << shift);
        Duration::from_secs(exp.clamp(self.min_delay.as_secs(), self.max_delay.as_secs()))
    }
}

/// Thin fault-tolerant wrapper around `reqwest::Client`.
///
/// Every request runs under the configured per-request timeout; timeouts,
/// connection errors and transient HTTP statuses are retried according to
/// the [`RetryPolicy`]. Once the attempt budget is spent the call fails with
/// [`RemoteError::Unavailable`].
#[derive(Clone)]
pub struct RetryClient {
    http: Client,
    policy: RetryPolicy,
}

impl RetryClient {
    pub fn new(policy: RetryPolicy, request_timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, policy }
    }

    pub fn from_env() -> Self {
        Self::new(
            RetryPolicy::from_env(),
            Duration::from_secs(config::request_timeout()),
        )
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, RemoteError> {
        self.execute_json(|| self.http.get(url).bearer_auth(token))
            .await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        self.execute_json(|| self.http.post(url).bearer_auth(token).json(body))
            .await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        self.execute_json(|| self.http.put(url).bearer_auth(token).json(body))
            .await
    }

    async fn execute_json<T, F>(&self, build: F) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match build().send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if RetryPolicy::is_transient(status) {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok());
                        last = format!("HTTP {}", status);
                        if attempt < self.policy.max_attempts {
                            sleep(self.policy.delay_for(attempt, retry_after)).await;
                        }
                        continue;
                    }

                    return match resp.error_for_status() {
                        Ok(valid) => Ok(valid.json::<T>().await?),
                        Err(err) => Err(RemoteError::Http(err)),
                    };
                }
                Err(err) => {
                    // a request exceeding the timeout counts as transient
                    if err.is_timeout() || err.is_connect() {
                        last = err.to_string();
                        if attempt < self.policy.max_attempts {
                            sleep(self.policy.delay_for(attempt, None)).await;
                        }
                        continue;
                    }
                    return Err(RemoteError::Http(err));
                }
            }
        }

        Err(RemoteError::Unavailable {
            attempts: self.policy.max_attempts,
            last,
        })
    }
}
