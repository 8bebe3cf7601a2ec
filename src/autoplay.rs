//! Autoplay orchestrator
//!
//! Drives a bounded sequence of unattended rounds with the same
//! configuration against one engine, evaluating stop conditions between
//! rounds. A new round is never issued while the previous one is still
//! in flight, and cancellation takes effect only after the current round
//! settles.

use crate::engine::GameEngine;
use crate::errors::{EngineError, EngineResult};
use crate::games::types::RoundConfig;
use crate::money::Amount;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Bounds and stop targets for one autoplay sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoplayPlan {
    /// Maximum rounds to play; `u32::MAX` is effectively unbounded
    pub rounds: u32,
    /// Stop once the session is up this much since the sequence started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_on_profit: Option<Amount>,
    /// Stop once the session is down this much since the sequence started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_on_loss: Option<Amount>,
}

impl AutoplayPlan {
    pub fn rounds(rounds: u32) -> Self {
        Self {
            rounds,
            stop_on_profit: None,
            stop_on_loss: None,
        }
    }
}

/// Why the sequence ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    RoundsExhausted,
    /// The next stake no longer fits the balance
    InsufficientBalance,
    ProfitTarget,
    LossLimit,
    Cancelled,
    /// A round failed for a reason autoplay will not retry blindly
    RoundFailed { error: String },
}

/// Final accounting for one autoplay sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoplayReport {
    pub rounds_settled: u32,
    pub rounds_aborted: u32,
    pub total_wagered: Amount,
    pub total_returned: Amount,
    pub final_balance: Amount,
    pub stop_reason: StopReason,
}

/// Running sequence; cancel is safe to call at any time
#[derive(Debug)]
pub struct AutoplayHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<AutoplayReport>,
}

impl AutoplayHandle {
    /// Request a stop after the in-flight round settles
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the sequence to end and take its report
    pub async fn join(self) -> AutoplayReport {
        self.task.await.expect("autoplay task panicked")
    }
}

/// Start an autoplay sequence on its own task.
///
/// The round configuration is validated up front so a sequence never
/// starts on a config that every round would reject.
pub fn start(
    engine: Arc<GameEngine>,
    config: RoundConfig,
    plan: AutoplayPlan,
) -> EngineResult<AutoplayHandle> {
    config.validate()?;
    match &config {
        RoundConfig::Crash(c) if c.auto_cash_out_bps.is_none() => {
            return Err(EngineError::InvalidConfiguration(
                "autoplay crash rounds need an auto cash-out".to_string(),
            ));
        }
        RoundConfig::Mines(c) if c.auto_reveal.is_none() => {
            return Err(EngineError::InvalidConfiguration(
                "autoplay mines rounds need an auto reveal count".to_string(),
            ));
        }
        _ => {}
    }

    let delay = Duration::from_millis(engine.config().autoplay.inter_round_delay_ms);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let task = tokio::spawn(run_sequence(engine, config, plan, delay, cancel_rx));
    Ok(AutoplayHandle { cancel_tx, task })
}

async fn run_sequence(
    engine: Arc<GameEngine>,
    config: RoundConfig,
    plan: AutoplayPlan,
    delay: Duration,
    cancel_rx: watch::Receiver<bool>,
) -> AutoplayReport {
    let start_balance = engine.balance();
    let mut report = AutoplayReport {
        rounds_settled: 0,
        rounds_aborted: 0,
        total_wagered: Amount::ZERO,
        total_returned: Amount::ZERO,
        final_balance: start_balance,
        stop_reason: StopReason::RoundsExhausted,
    };

    for round_no in 0..plan.rounds {
        if *cancel_rx.borrow() {
            report.stop_reason = StopReason::Cancelled;
            break;
        }
        if round_no > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
            // a cancel during the delay stops before the next round
            if *cancel_rx.borrow() {
                report.stop_reason = StopReason::Cancelled;
                break;
            }
        }

        match engine.play(&config).await {
            Ok(outcome) => {
                report.rounds_settled += 1;
                report.total_wagered = report.total_wagered.saturating_add(outcome.stake);
                report.total_returned = report.total_returned.saturating_add(outcome.payout);
            }
            Err(EngineError::InsufficientFunds { .. }) => {
                report.rounds_aborted += 1;
                report.stop_reason = StopReason::InsufficientBalance;
                break;
            }
            Err(error) => {
                report.stop_reason = StopReason::RoundFailed {
                    error: error.to_string(),
                };
                break;
            }
        }

        let balance = engine.balance();
        if let Some(target) = plan.stop_on_profit {
            if balance >= start_balance.saturating_add(target) {
                report.stop_reason = StopReason::ProfitTarget;
                break;
            }
        }
        if let Some(limit) = plan.stop_on_loss {
            if balance <= start_balance.checked_sub(limit).unwrap_or(Amount::ZERO) {
                report.stop_reason = StopReason::LossLimit;
                break;
            }
        }
    }

    report.final_balance = engine.balance();
    tracing::info!(
        settled = report.rounds_settled,
        aborted = report.rounds_aborted,
        reason = ?report.stop_reason,
        balance = %report.final_balance,
        "autoplay sequence ended"
    );
    report
}
