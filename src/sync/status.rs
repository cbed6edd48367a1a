/// Sync status broadcast
///
/// Single-producer, multi-subscriber fan-out over a bounded broadcast
/// channel. Slow subscribers lag and lose the oldest events instead of
/// blocking the coordinator; late subscribers miss prior events. Nothing
/// is persisted.

use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::broadcast;

const STATUS_BROADCAST_CAPACITY: usize = 256;

static STATUS_TX: OnceCell<broadcast::Sender<SyncEvent>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Progress,
    Success,
    Error,
    Warning,
}

/// One typed status event from the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct SyncEvent {
    pub level: StatusLevel,
    pub message: String,
    pub wallet: Option<String>,
    pub current: Option<u64>,
    pub total: Option<u64>,
    pub percentage: Option<f64>,
    pub timestamp: i64,
}

impl SyncEvent {
    fn new(level: StatusLevel, wallet: Option<&str>, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
            wallet: wallet.map(|w| w.to_string()),
            current: None,
            total: None,
            percentage: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn info(wallet: &str, message: &str) -> Self {
        Self::new(StatusLevel::Info, Some(wallet), message)
    }

    pub fn success(wallet: &str, message: &str) -> Self {
        Self::new(StatusLevel::Success, Some(wallet), message)
    }

    pub fn error(wallet: &str, message: &str) -> Self {
        Self::new(StatusLevel::Error, Some(wallet), message)
    }

    pub fn warning(wallet: &str, message: &str) -> Self {
        Self::new(StatusLevel::Warning, Some(wallet), message)
    }

    pub fn progress(wallet: &str, message: &str, current: u64, total: u64) -> Self {
        let mut event = Self::new(StatusLevel::Progress, Some(wallet), message);
        event.current = Some(current);
        event.total = Some(total);
        event.percentage = if total > 0 {
            Some(((current as f64) / (total as f64)) * 100.0)
        } else {
            None
        };
        event
    }
}

fn sender() -> &'static broadcast::Sender<SyncEvent> {
    STATUS_TX.get_or_init(|| broadcast::channel(STATUS_BROADCAST_CAPACITY).0)
}

/// Subscribe to coordinator status events
pub fn subscribe() -> broadcast::Receiver<SyncEvent> {
    sender().subscribe()
}

/// Publish an event. A send with no subscribers is not an error.
pub fn emit(event: SyncEvent) {
    let _ = sender().send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let mut rx = subscribe();
        emit(SyncEvent::progress("addr1", "parsing", 50, 200));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.level, StatusLevel::Progress);
        assert_eq!(event.wallet.as_deref(), Some("addr1"));
        assert_eq!(event.percentage, Some(25.0));
    }

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        emit(SyncEvent::info("addr1", "no one listening"));
    }
}
