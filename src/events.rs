//! Engine notification boundary
//!
//! Events fan out over a broadcast channel consumed by the (out-of-scope)
//! presentation layer; slow subscribers lag, they never block settlement.
//! The chain recorder stands in for the external ledger-notification
//! service: fire-and-forget, always succeeds.

use crate::games::types::{GameKind, Outcome};
use crate::money::Amount;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why the balance moved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BalanceChange {
    Reserved,
    Settled,
    Refunded,
}

/// Notifications emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Emitted once per terminal round
    RoundSettled { outcome: Outcome },
    /// Emitted on every ledger mutation
    BalanceChanged {
        new_balance: Amount,
        change: BalanceChange,
    },
    /// Emitted when a committed round is force-aborted with a refund
    RoundAborted {
        round_id: String,
        game: GameKind,
        stake_refunded: Amount,
    },
}

/// Broadcast fan-out for engine events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Send to all subscribers; a receiver-less bus is not an error
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// External notification categories mirrored to the chain recorder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChainEventKind {
    RoundCommitted,
    MoveRecorded,
    RoundSettled,
    RewardClaimed,
}

/// Opaque receipt returned by the recorder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReference {
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
}

/// Ledger-notification sink consumed by the engine.
///
/// Implementations must be cheap to call inline from the settle path and
/// must always succeed; the engine never inspects failures.
#[async_trait]
pub trait ChainRecorder: Send + Sync {
    async fn record(&self, kind: ChainEventKind, payload: serde_json::Value) -> ChainReference;
}

/// Default recorder: logs the event and fabricates a reference
pub struct MockChainRecorder;

#[async_trait]
impl ChainRecorder for MockChainRecorder {
    async fn record(&self, kind: ChainEventKind, payload: serde_json::Value) -> ChainReference {
        let reference = format!("mock-{}", uuid::Uuid::new_v4());
        tracing::debug!(?kind, %payload, reference, "chain event recorded");
        ChainReference {
            reference,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::GameKind;

    #[tokio::test]
    async fn test_event_fan_out() {
        let bus = EventBus::default();
        let mut rx_a = bus.subscribe();
        let mut rx_b = bus.subscribe();

        bus.emit(EngineEvent::BalanceChanged {
            new_balance: Amount::from_units(90),
            change: BalanceChange::Reserved,
        });

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.recv().await.unwrap() {
                EngineEvent::BalanceChanged { new_balance, change } => {
                    assert_eq!(new_balance, Amount::from_units(90));
                    assert_eq!(change, BalanceChange::Reserved);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(EngineEvent::RoundAborted {
            round_id: "r-1".to_string(),
            game: GameKind::Crash,
            stake_refunded: Amount::from_units(10),
        });
    }

    #[tokio::test]
    async fn test_mock_recorder_always_succeeds() {
        let recorder = MockChainRecorder;
        let reference = recorder
            .record(
                ChainEventKind::RoundSettled,
                serde_json::json!({"round_id": "r-1"}),
            )
            .await;
        assert!(reference.reference.starts_with("mock-"));
        let again = recorder
            .record(ChainEventKind::RewardClaimed, serde_json::json!({}))
            .await;
        assert_ne!(reference.reference, again.reference);
    }
}
