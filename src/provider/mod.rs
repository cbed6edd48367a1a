/// Enhanced-transactions provider client
///
/// Two operations, both consumed by the sync coordinator: newest-first
/// signature listing over JSON-RPC and enhanced-transaction batch decoding.
/// Calls go through per-endpoint rate-limit floors and a retry loop with
/// exponential backoff that escalates on explicit 429 responses.

pub mod types;

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::errors::AnalyticsError;
use crate::logger::{ self, LogTag };
use crate::rate_limiter::RateLimiter;
use types::{ EnhancedTransaction, SignatureInfo };

/// Source of signatures and enhanced records. The coordinator is generic
/// over this so tests can script provider responses.
pub trait TransactionSource {
    fn signatures(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize
    ) -> impl std::future::Future<Output = Result<Vec<SignatureInfo>, AnalyticsError>> + Send;

    fn enhance(
        &self,
        signatures: &[String]
    ) -> impl std::future::Future<Output = Result<Vec<EnhancedTransaction>, AnalyticsError>> + Send;
}

/// HTTP client for the hosted enhanced-transactions API
pub struct EnhancedTxProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    rpc_limiter: RateLimiter,
    enhance_limiter: RateLimiter,
}

impl EnhancedTxProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, AnalyticsError> {
        let client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AnalyticsError::ProviderUnavailable {
                endpoint: config.api_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
            rpc_limiter: RateLimiter::new(Duration::from_millis(config.rpc_min_interval_ms)),
            enhance_limiter: RateLimiter::new(
                Duration::from_millis(config.enhance_min_interval_ms)
            ),
        })
    }

    /// Run one provider call with retries. Backoff starts at the configured
    /// base, doubles per attempt and triples on explicit rate limits.
    async fn with_retry<T, F, Fut>(&self, endpoint: &str, mut call: F) -> Result<T, AnalyticsError>
        where F: FnMut() -> Fut, Fut: std::future::Future<Output = Result<T, AnalyticsError>>
    {
        let mut delay_ms = self.config.retry_backoff_ms;
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => {
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    logger::warning(
                        LogTag::Provider,
                        &format!(
                            "{} failed (attempt {}/{}), retrying in {}ms: {}",
                            endpoint,
                            attempt,
                            self.config.max_retries,
                            delay_ms,
                            e
                        )
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms *= if e.is_rate_limit() { 3 } else { 2 };
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_signatures_once(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize
    ) -> Result<Vec<SignatureInfo>, AnalyticsError> {
        self.rpc_limiter.wait_for_request().await;

        let url = format!("{}/?api-key={}", self.config.rpc_url, self.config.api_key);
        let mut options = serde_json::json!({ "limit": limit, "commitment": "confirmed" });
        if let Some(before) = before {
            options["before"] = serde_json::json!(before);
        }
        if let Some(until) = until {
            options["until"] = serde_json::json!(until);
        }

        let payload =
            serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSignaturesForAddress",
            "params": [address, options]
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        self.check_status(&self.config.rpc_url, response.status())?;

        let body: serde_json::Value = response
            .json().await
            .map_err(|e| AnalyticsError::ProviderMalformed {
                endpoint: self.config.rpc_url.clone(),
                detail: e.to_string(),
            })?;

        let result = body
            .get("result")
            .ok_or_else(|| AnalyticsError::ProviderMalformed {
                endpoint: self.config.rpc_url.clone(),
                detail: "missing result field".to_string(),
            })?;

        serde_json
            ::from_value(result.clone())
            .map_err(|e| AnalyticsError::ProviderMalformed {
                endpoint: self.config.rpc_url.clone(),
                detail: e.to_string(),
            })
    }

    async fn enhance_once(
        &self,
        signatures: &[String]
    ) -> Result<Vec<EnhancedTransaction>, AnalyticsError> {
        self.enhance_limiter.wait_for_request().await;

        let url = format!(
            "{}/transactions?api-key={}",
            self.config.api_url,
            self.config.api_key
        );
        let payload = serde_json::json!({ "transactions": signatures });

        let response = self.client.post(&url).json(&payload).send().await?;
        self.check_status(&self.config.api_url, response.status())?;

        response.json().await.map_err(|e| AnalyticsError::ProviderMalformed {
            endpoint: self.config.api_url.clone(),
            detail: e.to_string(),
        })
    }

    fn check_status(
        &self,
        endpoint: &str,
        status: reqwest::StatusCode
    ) -> Result<(), AnalyticsError> {
        if status.as_u16() == 429 {
            return Err(AnalyticsError::ProviderRateLimited {
                endpoint: endpoint.to_string(),
                retry_after: None,
            });
        }
        if status.is_server_error() {
            return Err(AnalyticsError::ProviderUnavailable {
                endpoint: endpoint.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            return Err(AnalyticsError::ProviderMalformed {
                endpoint: endpoint.to_string(),
                detail: format!("unexpected HTTP {}", status),
            });
        }
        Ok(())
    }
}

impl TransactionSource for EnhancedTxProvider {
    async fn signatures(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize
    ) -> Result<Vec<SignatureInfo>, AnalyticsError> {
        let limit = limit.min(crate::constants::SIGNATURE_PAGE_LIMIT);
        self.with_retry("signatures", || {
            self.fetch_signatures_once(address, before, until, limit)
        }).await
    }

    async fn enhance(
        &self,
        signatures: &[String]
    ) -> Result<Vec<EnhancedTransaction>, AnalyticsError> {
        if signatures.is_empty() {
            return Ok(Vec::new());
        }
        if signatures.len() > crate::constants::ENHANCE_BATCH_SIZE {
            return Err(AnalyticsError::ProviderMalformed {
                endpoint: self.config.api_url.clone(),
                detail: format!("enhance batch too large: {}", signatures.len()),
            });
        }
        self.with_retry("enhance", || self.enhance_once(signatures)).await
    }
}
