//! Session ledger
//!
//! Single source of truth for the player's balance. Reserve/apply pairs are
//! serialized behind one lock so two rounds committed "simultaneously" can
//! never both pass a stale balance check, and settlement is forced into
//! commit order to keep the balance history deterministic.

use crate::errors::{EngineError, EngineResult};
use crate::games::types::GameKind;
use crate::money::{Amount, BPS_SCALE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// A committed, not-yet-settled stake. Consumed exactly once by
/// [`SessionLedger::apply`] or [`SessionLedger::refund`]; dropping it
/// without settling leaks the stake until the dangling-round reaper runs.
#[derive(Debug)]
pub struct Reservation {
    pub round_id: String,
    pub game: GameKind,
    pub stake: Amount,
    pub commit_seq: u64,
}

/// History entry appended on every settle or forced abort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub commit_seq: u64,
    pub round_id: String,
    pub game: GameKind,
    pub won: bool,
    pub stake: Amount,
    pub multiplier_bps: u32,
    pub payout: Amount,
    pub net: i64,
    pub balance_after: Amount,
    /// True when the round was force-aborted and the stake refunded
    pub aborted: bool,
    pub settled_at: DateTime<Utc>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: Amount,
    pub history: Vec<SettlementRecord>,
}

/// Aggregate session statistics derived from history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds_settled: u64,
    pub rounds_aborted: u64,
    pub total_wagered: Amount,
    pub total_returned: Amount,
    pub net: i64,
    pub rounds_by_game: HashMap<GameKind, u64>,
    /// Wins over settled (non-aborted) rounds, 0.0 when none settled
    pub win_rate: f64,
}

struct LedgerInner {
    balance: Amount,
    next_commit_seq: u64,
    next_settle_seq: u64,
    /// Sequences refunded ahead of their turn; skipped once reached
    settled_ahead: BTreeSet<u64>,
    history: Vec<SettlementRecord>,
}

/// Balance and settlement history for one session
pub struct SessionLedger {
    inner: Mutex<LedgerInner>,
}

impl SessionLedger {
    pub fn new(starting_balance: Amount) -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                balance: starting_balance,
                next_commit_seq: 0,
                next_settle_seq: 0,
                settled_ahead: BTreeSet::new(),
                history: Vec::new(),
            }),
        }
    }

    /// Atomic check-and-debit of a stake.
    ///
    /// On success the stake is already removed from the balance and the
    /// returned reservation carries the round's commit sequence.
    pub fn reserve(
        &self,
        round_id: &str,
        game: GameKind,
        stake: Amount,
    ) -> EngineResult<Reservation> {
        let mut inner = self.inner.lock().unwrap();
        let remaining = match inner.balance.checked_sub(stake) {
            Some(remaining) => remaining,
            None => {
                return Err(EngineError::InsufficientFunds {
                    requested: stake,
                    available: inner.balance,
                })
            }
        };
        inner.balance = remaining;
        let commit_seq = inner.next_commit_seq;
        inner.next_commit_seq += 1;
        tracing::debug!(round_id, %stake, commit_seq, "stake reserved");
        Ok(Reservation {
            round_id: round_id.to_string(),
            game,
            stake,
            commit_seq,
        })
    }

    /// Credit a settled round's payout and append the history record.
    ///
    /// Rounds must settle in commit order; an out-of-order apply is retried
    /// once after yielding the lock, then surfaced as a conflict with the
    /// stake refunded so the balance invariant survives the failure.
    pub fn apply(
        &self,
        reservation: Reservation,
        won: bool,
        multiplier_bps: u32,
        payout: Amount,
    ) -> EngineResult<SettlementRecord> {
        for attempt in 0..2 {
            {
                let mut inner = self.inner.lock().unwrap();
                if inner.next_settle_seq == reservation.commit_seq {
                    return Ok(Self::settle_locked(
                        &mut inner,
                        reservation,
                        won,
                        multiplier_bps,
                        payout,
                        false,
                    ));
                }
            }
            if attempt == 0 {
                std::thread::yield_now();
            }
        }

        let mut inner = self.inner.lock().unwrap();
        let expected = inner.next_settle_seq;
        let actual = reservation.commit_seq;
        tracing::warn!(
            round_id = %reservation.round_id,
            expected,
            actual,
            "out-of-order settlement, refunding stake"
        );
        let stake = reservation.stake;
        Self::settle_locked(&mut inner, reservation, false, BPS_SCALE as u32, stake, true);
        Err(EngineError::ConcurrentMutationConflict { expected, actual })
    }

    /// Return a committed stake without a draw (dangling or torn-down round)
    pub fn refund(&self, reservation: Reservation) -> SettlementRecord {
        let mut inner = self.inner.lock().unwrap();
        let stake = reservation.stake;
        Self::settle_locked(&mut inner, reservation, false, BPS_SCALE as u32, stake, true)
    }

    fn settle_locked(
        inner: &mut LedgerInner,
        reservation: Reservation,
        won: bool,
        multiplier_bps: u32,
        payout: Amount,
        aborted: bool,
    ) -> SettlementRecord {
        inner.balance = inner.balance.saturating_add(payout);
        // refunds may settle out of order; their sequence is skipped later
        if inner.next_settle_seq == reservation.commit_seq {
            inner.next_settle_seq += 1;
            while inner.settled_ahead.remove(&inner.next_settle_seq) {
                inner.next_settle_seq += 1;
            }
        } else {
            inner.settled_ahead.insert(reservation.commit_seq);
        }
        let record = SettlementRecord {
            commit_seq: reservation.commit_seq,
            round_id: reservation.round_id,
            game: reservation.game,
            won,
            stake: reservation.stake,
            multiplier_bps,
            payout,
            net: Amount::signed_delta(payout, reservation.stake),
            balance_after: inner.balance,
            aborted,
            settled_at: Utc::now(),
        };
        inner.history.push(record.clone());
        record
    }

    pub fn balance(&self) -> Amount {
        self.inner.lock().unwrap().balance
    }

    /// Consistent copy of balance and full history
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.lock().unwrap();
        LedgerSnapshot {
            balance: inner.balance,
            history: inner.history.clone(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.lock().unwrap();
        let mut stats = SessionStats {
            rounds_settled: 0,
            rounds_aborted: 0,
            total_wagered: Amount::ZERO,
            total_returned: Amount::ZERO,
            net: 0,
            rounds_by_game: HashMap::new(),
            win_rate: 0.0,
        };
        let mut wins = 0u64;
        for record in &inner.history {
            *stats.rounds_by_game.entry(record.game).or_insert(0) += 1;
            if record.aborted {
                stats.rounds_aborted += 1;
                continue;
            }
            stats.rounds_settled += 1;
            stats.total_wagered = stats.total_wagered.saturating_add(record.stake);
            stats.total_returned = stats.total_returned.saturating_add(record.payout);
            stats.net += record.net;
            if record.won {
                wins += 1;
            }
        }
        if stats.rounds_settled > 0 {
            stats.win_rate = wins as f64 / stats.rounds_settled as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> SessionLedger {
        SessionLedger::new(Amount::from_units(100))
    }

    #[test]
    fn test_reserve_debits_immediately() {
        let ledger = ledger();
        let r = ledger
            .reserve("r-1", GameKind::Dice, Amount::from_units(30))
            .unwrap();
        assert_eq!(ledger.balance(), Amount::from_units(70));
        assert_eq!(r.commit_seq, 0);
    }

    #[test]
    fn test_reserve_rejects_overdraft() {
        let ledger = ledger();
        let err = ledger
            .reserve("r-1", GameKind::Dice, Amount::from_units(101))
            .unwrap_err();
        match err {
            EngineError::InsufficientFunds {
                requested,
                available,
            } => {
                assert_eq!(requested, Amount::from_units(101));
                assert_eq!(available, Amount::from_units(100));
            }
            other => panic!("unexpected error {other:?}"),
        }
        // failed reserve leaves the balance untouched
        assert_eq!(ledger.balance(), Amount::from_units(100));
    }

    #[test]
    fn test_balance_invariant_on_win_and_loss() {
        let ledger = ledger();
        let before = ledger.balance();

        let r = ledger
            .reserve("r-1", GameKind::Dice, Amount::from_units(10))
            .unwrap();
        let record = ledger
            .apply(r, true, 19_800, Amount::from_minor(1_980))
            .unwrap();
        assert_eq!(
            record.balance_after.minor(),
            before.minor() - 1_000 + 1_980
        );

        let r = ledger
            .reserve("r-2", GameKind::Dice, Amount::from_units(10))
            .unwrap();
        let record = ledger.apply(r, false, 0, Amount::ZERO).unwrap();
        assert_eq!(record.net, -1_000);
        assert_eq!(ledger.balance(), record.balance_after);
    }

    #[test]
    fn test_settlement_enforces_commit_order() {
        let ledger = ledger();
        let first = ledger
            .reserve("r-1", GameKind::Crash, Amount::from_units(10))
            .unwrap();
        let second = ledger
            .reserve("r-2", GameKind::Dice, Amount::from_units(10))
            .unwrap();

        // settling the later commit first is a conflict and refunds it
        let err = ledger.apply(second, false, 0, Amount::ZERO).unwrap_err();
        match err {
            EngineError::ConcurrentMutationConflict { expected, actual } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // refund restored the later stake; the earlier one is still out
        assert_eq!(ledger.balance(), Amount::from_units(90));

        ledger.apply(first, false, 0, Amount::ZERO).unwrap();
        assert_eq!(ledger.balance(), Amount::from_units(90));
    }

    #[test]
    fn test_refund_restores_stake_exactly() {
        let ledger = ledger();
        let r = ledger
            .reserve("r-1", GameKind::Mines, Amount::from_units(25))
            .unwrap();
        assert_eq!(ledger.balance(), Amount::from_units(75));
        let record = ledger.refund(r);
        assert!(record.aborted);
        assert_eq!(record.net, 0);
        assert_eq!(ledger.balance(), Amount::from_units(100));
    }

    #[test]
    fn test_snapshot_idempotent() {
        let ledger = ledger();
        let r = ledger
            .reserve("r-1", GameKind::Plinko, Amount::from_units(5))
            .unwrap();
        ledger.apply(r, true, 15_000, Amount::from_minor(750)).unwrap();

        let a = ledger.snapshot();
        let b = ledger.snapshot();
        assert_eq!(a.balance, b.balance);
        assert_eq!(a.history.len(), b.history.len());
        assert_eq!(a.history[0].round_id, b.history[0].round_id);
        assert_eq!(a.history[0].balance_after, b.history[0].balance_after);
    }

    #[test]
    fn test_stats_aggregation() {
        let ledger = ledger();
        let r = ledger
            .reserve("r-1", GameKind::Dice, Amount::from_units(10))
            .unwrap();
        ledger
            .apply(r, true, 19_800, Amount::from_minor(1_980))
            .unwrap();
        let r = ledger
            .reserve("r-2", GameKind::Dice, Amount::from_units(10))
            .unwrap();
        ledger.apply(r, false, 0, Amount::ZERO).unwrap();
        let r = ledger
            .reserve("r-3", GameKind::Mines, Amount::from_units(10))
            .unwrap();
        ledger.refund(r);

        let stats = ledger.stats();
        assert_eq!(stats.rounds_settled, 2);
        assert_eq!(stats.rounds_aborted, 1);
        assert_eq!(stats.total_wagered, Amount::from_units(20));
        assert_eq!(stats.total_returned, Amount::from_minor(1_980));
        assert_eq!(stats.net, 1_980 - 2_000);
        assert!((stats.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.rounds_by_game[&GameKind::Dice], 2);
    }

    #[test]
    fn test_concurrent_reserves_cannot_both_pass_stale_check() {
        use std::sync::Arc;
        let ledger = Arc::new(SessionLedger::new(Amount::from_units(10)));
        let mut handles = Vec::new();
        for i in 0..8 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                ledger
                    .reserve(&format!("r-{i}"), GameKind::Dice, Amount::from_units(10))
                    .is_ok()
            }));
        }
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1, "exactly one reserve may pass the check");
        assert_eq!(ledger.balance(), Amount::ZERO);
    }

    #[test]
    fn test_settle_sequence_recovers_after_out_of_order_refund() {
        let ledger = ledger();
        let first = ledger
            .reserve("r-1", GameKind::Crash, Amount::from_units(10))
            .unwrap();
        let second = ledger
            .reserve("r-2", GameKind::Dice, Amount::from_units(10))
            .unwrap();

        // refund the later round first, then settle the earlier one
        ledger.refund(second);
        ledger.apply(first, false, 0, Amount::ZERO).unwrap();

        // the sequence must have skipped the refunded slot
        let third = ledger
            .reserve("r-3", GameKind::Dice, Amount::from_units(10))
            .unwrap();
        assert_eq!(third.commit_seq, 2);
        ledger.apply(third, false, 0, Amount::ZERO).unwrap();
        assert_eq!(ledger.balance(), Amount::from_units(80));
    }
}
