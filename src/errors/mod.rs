/// Structured error types for the analytics pipeline
///
/// Provider failures carry enough context for the coordinator's retry policy;
/// store failures distinguish constraint conflicts from corruption. Errors are
/// Clone so a sync outcome can be fanned out to every attached caller.
use chrono::{ DateTime, Utc };

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Debug, Clone)]
pub enum AnalyticsError {
    /// Wallet address failed base58/pubkey validation
    InvalidAddress {
        address: String,
        reason: String,
    },

    /// Provider network failure or 5xx
    ProviderUnavailable {
        endpoint: String,
        message: String,
    },

    /// Provider returned 429; retried with extended backoff before surfacing
    ProviderRateLimited {
        endpoint: String,
        retry_after: Option<DateTime<Utc>>,
    },

    /// Provider call exceeded the client timeout
    ProviderTimeout {
        endpoint: String,
        timeout_ms: u64,
    },

    /// Provider payload could not be decoded
    ProviderMalformed {
        endpoint: String,
        detail: String,
    },

    /// Unexpected constraint violation; fatal to the in-flight commit
    StoreConflict {
        detail: String,
    },

    /// Store corruption or pool failure; the run aborts
    StoreCorrupt {
        detail: String,
    },

    /// The run was cancelled before its commit
    Cancelled {
        wallet: String,
    },
}

impl std::fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticsError::InvalidAddress { address, reason } => {
                write!(f, "Invalid wallet address '{}': {}", address, reason)
            }
            AnalyticsError::ProviderUnavailable { endpoint, message } => {
                write!(f, "Provider unavailable at {}: {}", endpoint, message)
            }
            AnalyticsError::ProviderRateLimited { endpoint, retry_after } => {
                match retry_after {
                    Some(at) => write!(f, "Provider rate limited at {} until {}", endpoint, at),
                    None => write!(f, "Provider rate limited at {}", endpoint),
                }
            }
            AnalyticsError::ProviderTimeout { endpoint, timeout_ms } => {
                write!(f, "Provider timeout at {} after {}ms", endpoint, timeout_ms)
            }
            AnalyticsError::ProviderMalformed { endpoint, detail } => {
                write!(f, "Malformed provider payload from {}: {}", endpoint, detail)
            }
            AnalyticsError::StoreConflict { detail } => {
                write!(f, "Store constraint violation: {}", detail)
            }
            AnalyticsError::StoreCorrupt { detail } => {
                write!(f, "Store corruption: {}", detail)
            }
            AnalyticsError::Cancelled { wallet } => {
                write!(f, "Sync cancelled for wallet {}", wallet)
            }
        }
    }
}

impl std::error::Error for AnalyticsError {}

// =============================================================================
// CLASSIFICATION
// =============================================================================

impl AnalyticsError {
    /// True for failures the coordinator may retry within its budget
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalyticsError::ProviderUnavailable { .. } |
                AnalyticsError::ProviderRateLimited { .. } |
                AnalyticsError::ProviderTimeout { .. }
        )
    }

    /// True for explicit rate-limit responses, which get a larger backoff multiplier
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AnalyticsError::ProviderRateLimited { .. })
    }

    /// Short kind tag for status events and bulk results
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidAddress { .. } => "invalid_address",
            AnalyticsError::ProviderUnavailable { .. } => "provider_unavailable",
            AnalyticsError::ProviderRateLimited { .. } => "provider_rate_limited",
            AnalyticsError::ProviderTimeout { .. } => "provider_timeout",
            AnalyticsError::ProviderMalformed { .. } => "provider_malformed",
            AnalyticsError::StoreConflict { .. } => "store_conflict",
            AnalyticsError::StoreCorrupt { .. } => "store_corrupt",
            AnalyticsError::Cancelled { .. } => "cancelled",
        }
    }

    /// Map a database-layer error message into a store error kind.
    /// Constraint violations stay distinguishable from corruption.
    pub fn from_store_message(message: String) -> Self {
        if message.contains("UNIQUE") || message.contains("constraint") {
            AnalyticsError::StoreConflict { detail: message }
        } else {
            AnalyticsError::StoreCorrupt { detail: message }
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<reqwest::Error> for AnalyticsError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if err.is_timeout() {
            AnalyticsError::ProviderTimeout {
                endpoint,
                timeout_ms: 30_000,
            }
        } else {
            AnalyticsError::ProviderUnavailable {
                endpoint,
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::ProviderMalformed {
            endpoint: "unknown".to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let rate_limited = AnalyticsError::ProviderRateLimited {
            endpoint: "https://api.example.com".to_string(),
            retry_after: None,
        };
        assert!(rate_limited.is_retryable());
        assert!(rate_limited.is_rate_limit());

        let conflict = AnalyticsError::StoreConflict { detail: "UNIQUE failed".to_string() };
        assert!(!conflict.is_retryable());
    }

    #[test]
    fn test_store_message_mapping() {
        let err = AnalyticsError::from_store_message("UNIQUE constraint failed: trades.id".into());
        assert_eq!(err.kind(), "store_conflict");

        let err = AnalyticsError::from_store_message("database disk image is malformed".into());
        assert_eq!(err.kind(), "store_corrupt");
    }
}
