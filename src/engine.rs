//! Game engine
//!
//! Command surface over the session: validates round configuration, commits
//! stakes through the ledger, drives each game's state machine to a
//! terminal phase, and fans the results out as events. Commands come in,
//! events go out; no caller ever touches session state directly.

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult, RoundStateError};
use crate::events::{
    BalanceChange, ChainEventKind, ChainRecorder, EngineEvent, EventBus, MockChainRecorder,
};
use crate::games::active_rounds::{ActiveEntry, ActiveRound, ActiveRoundsPool};
use crate::games::crash::{CrashRound, CrashTick};
use crate::games::dice::DiceRound;
use crate::games::mines::{MinesRound, RevealResult};
use crate::games::plinko::PlinkoRound;
use crate::games::roulette::RouletteRound;
use crate::games::types::{
    CrashConfig, DiceConfig, GameKind, MinesConfig, Outcome, PlinkoConfig, Resolution,
    RouletteConfig, RoundConfig,
};
use crate::ledger::{LedgerSnapshot, Reservation, SessionLedger, SessionStats, SettlementRecord};
use crate::money::Amount;
use crate::rng::DrawRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Progress of an interactive crash round
#[derive(Debug, Clone)]
pub enum CrashProgress {
    Running { current_bps: u32 },
    Settled { outcome: Outcome },
}

/// Progress of an interactive mines round
#[derive(Debug, Clone)]
pub enum MinesProgress {
    Safe {
        multiplier_bps: u32,
        safe_revealed: u8,
    },
    Settled {
        outcome: Outcome,
    },
}

/// One engine per session; all round lifecycles run through it
pub struct GameEngine {
    config: EngineConfig,
    ledger: Arc<SessionLedger>,
    rng: Arc<DrawRng>,
    events: EventBus,
    recorder: Arc<dyn ChainRecorder>,
    active: ActiveRoundsPool,
    shutting_down: AtomicBool,
}

impl GameEngine {
    /// Engine with OS-entropy draws and the mock chain recorder
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_parts(config, Arc::new(DrawRng::from_entropy()), Arc::new(MockChainRecorder))
    }

    /// Engine with substituted RNG and recorder (tests, simulations)
    pub fn with_parts(
        config: EngineConfig,
        rng: Arc<DrawRng>,
        recorder: Arc<dyn ChainRecorder>,
    ) -> EngineResult<Self> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfiguration(e.to_string()))?;
        let ledger = Arc::new(SessionLedger::new(config.session.starting_balance));
        Ok(Self {
            config,
            ledger,
            rng,
            events: EventBus::default(),
            recorder,
            active: ActiveRoundsPool::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn balance(&self) -> Amount {
        self.ledger.balance()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    pub fn stats(&self) -> SessionStats {
        self.ledger.stats()
    }

    pub fn active_rounds(&self) -> usize {
        self.active.active_count()
    }

    /// Run one unattended round of any game to settlement
    pub async fn play(&self, config: &RoundConfig) -> EngineResult<Outcome> {
        match config {
            RoundConfig::Dice(c) => self.play_dice(c.clone()).await,
            RoundConfig::Crash(c) => self.play_crash(c.clone()).await,
            RoundConfig::Plinko(c) => self.play_plinko(c.clone()).await,
            RoundConfig::Mines(c) => self.play_mines(c.clone()).await,
            RoundConfig::Roulette(c) => self.play_roulette(c.clone()).await,
        }
    }

    pub async fn play_dice(&self, config: DiceConfig) -> EngineResult<Outcome> {
        let round_config = RoundConfig::Dice(config.clone());
        self.validate_round(&round_config)?;

        let mut round = DiceRound::new(new_round_id(GameKind::Dice), config);
        let reservation = self
            .commit(round.id(), GameKind::Dice, round_config.stake())
            .await?;
        round.mark_committed()?;

        let resolution = round.resolve(self.rng.next_uniform())?;
        self.settle(reservation, resolution).await
    }

    pub async fn play_plinko(&self, config: PlinkoConfig) -> EngineResult<Outcome> {
        let round_config = RoundConfig::Plinko(config.clone());
        self.validate_round(&round_config)?;

        let mut round = PlinkoRound::new(new_round_id(GameKind::Plinko), config);
        let reservation = self
            .commit(round.id(), GameKind::Plinko, round_config.stake())
            .await?;
        round.mark_committed()?;

        let slot = self.rng.next_below(round.ladder_len());
        let resolution = round.resolve(slot)?;
        self.settle(reservation, resolution).await
    }

    pub async fn play_roulette(&self, config: RouletteConfig) -> EngineResult<Outcome> {
        let round_config = RoundConfig::Roulette(config.clone());
        self.validate_round(&round_config)?;

        let mut round = RouletteRound::new(new_round_id(GameKind::Roulette), config);
        let reservation = self
            .commit(round.id(), GameKind::Roulette, round_config.stake())
            .await?;
        round.mark_committed()?;

        let winning = self.rng.next_below(37) as u8;
        let resolution = round.resolve(winning)?;
        self.settle(reservation, resolution).await
    }

    /// Unattended crash round; requires a configured auto cash-out so the
    /// round is guaranteed to terminate without player input
    pub async fn play_crash(&self, config: CrashConfig) -> EngineResult<Outcome> {
        if config.auto_cash_out_bps.is_none() {
            return Err(EngineError::InvalidConfiguration(
                "unattended crash rounds need an auto cash-out".to_string(),
            ));
        }
        let round_config = RoundConfig::Crash(config.clone());
        self.validate_round(&round_config)?;

        let mut round = CrashRound::new(
            new_round_id(GameKind::Crash),
            config,
            self.config.crash.tick_step_bps,
        );
        let reservation = self
            .commit(round.id(), GameKind::Crash, round_config.stake())
            .await?;
        round.mark_committed()?;
        round.arm(self.rng.next_uniform())?;

        let tick_delay = Duration::from_millis(self.config.crash.tick_interval_ms);
        let resolution = loop {
            match round.tick()? {
                CrashTick::Running { .. } => {
                    // teardown skips remaining delays but still settles
                    // with the already-sampled crash point
                    if !tick_delay.is_zero() && !self.shutting_down.load(Ordering::SeqCst) {
                        tokio::time::sleep(tick_delay).await;
                    }
                }
                terminal => break round.settle(&terminal)?,
            }
        };
        self.settle(reservation, resolution).await
    }

    /// Unattended mines round: reveal `auto_reveal` cells, then cash out
    pub async fn play_mines(&self, config: MinesConfig) -> EngineResult<Outcome> {
        let reveals = config.auto_reveal.ok_or_else(|| {
            EngineError::InvalidConfiguration(
                "unattended mines rounds need an auto reveal count".to_string(),
            )
        })?;
        let round_config = RoundConfig::Mines(config.clone());
        self.validate_round(&round_config)?;

        let mut round = MinesRound::new(new_round_id(GameKind::Mines), config);
        let reservation = self
            .commit(round.id(), GameKind::Mines, round_config.stake())
            .await?;
        round.mark_committed()?;
        round.begin()?;

        for _ in 0..reveals {
            match round.reveal(self.rng.next_uniform())? {
                RevealResult::Safe { .. } => {}
                RevealResult::Mine => {
                    let resolution = round.loss();
                    return self.settle(reservation, resolution).await;
                }
            }
        }
        let resolution = round.cash_out()?;
        self.settle(reservation, resolution).await
    }

    // --- Interactive crash ----------------------------------------------

    /// Commit and arm a crash round driven by explicit ticks
    pub async fn begin_crash(&self, config: CrashConfig) -> EngineResult<String> {
        let round_config = RoundConfig::Crash(config.clone());
        self.validate_round(&round_config)?;
        self.ensure_no_active_round()?;

        let mut round = CrashRound::new(
            new_round_id(GameKind::Crash),
            config,
            self.config.crash.tick_step_bps,
        );
        let id = round.id().to_string();
        let reservation = self.commit(&id, GameKind::Crash, round_config.stake()).await?;
        round.mark_committed()?;
        round.arm(self.rng.next_uniform())?;
        self.active.insert(ActiveRound::Crash(round), reservation);
        Ok(id)
    }

    /// Advance an interactive crash round by one tick
    pub async fn crash_tick(&self, round_id: &str) -> EngineResult<CrashProgress> {
        let tick = self
            .active
            .with_mut(round_id, |round| match round {
                ActiveRound::Crash(r) => r.tick(),
                ActiveRound::Mines(_) => Err(unknown_round(round_id)),
            })
            .ok_or_else(|| unknown_round(round_id))??;

        match tick {
            CrashTick::Running { current_bps } => Ok(CrashProgress::Running { current_bps }),
            terminal => {
                let entry = self
                    .active
                    .take(round_id)
                    .ok_or_else(|| unknown_round(round_id))?;
                match entry.round {
                    ActiveRound::Crash(mut round) => {
                        let resolution = round.settle(&terminal)?;
                        let outcome = self.settle(entry.reservation, resolution).await?;
                        Ok(CrashProgress::Settled { outcome })
                    }
                    other => {
                        self.active.insert(other, entry.reservation);
                        Err(unknown_round(round_id))
                    }
                }
            }
        }
    }

    /// Cash out an interactive crash round at its current multiplier
    pub async fn crash_cash_out(&self, round_id: &str) -> EngineResult<Outcome> {
        let entry = self
            .active
            .take(round_id)
            .ok_or_else(|| unknown_round(round_id))?;
        match entry.round {
            ActiveRound::Crash(mut round) => {
                let resolution = round.cash_out()?;
                self.settle(entry.reservation, resolution).await
            }
            other => {
                self.active.insert(other, entry.reservation);
                Err(unknown_round(round_id))
            }
        }
    }

    // --- Interactive mines ----------------------------------------------

    /// Commit a mines round and open the board
    pub async fn begin_mines(&self, config: MinesConfig) -> EngineResult<String> {
        let round_config = RoundConfig::Mines(config.clone());
        self.validate_round(&round_config)?;
        self.ensure_no_active_round()?;

        let mut round = MinesRound::new(new_round_id(GameKind::Mines), config);
        let id = round.id().to_string();
        let reservation = self.commit(&id, GameKind::Mines, round_config.stake()).await?;
        round.mark_committed()?;
        round.begin()?;
        self.active.insert(ActiveRound::Mines(round), reservation);
        Ok(id)
    }

    /// Reveal one cell of an interactive mines round
    pub async fn mines_reveal(&self, round_id: &str) -> EngineResult<MinesProgress> {
        let draw = self.rng.next_uniform();
        let result = self
            .active
            .with_mut(round_id, |round| match round {
                ActiveRound::Mines(r) => {
                    let result = r.reveal(draw)?;
                    Ok((result, r.safe_revealed()))
                }
                ActiveRound::Crash(_) => Err(unknown_round(round_id)),
            })
            .ok_or_else(|| unknown_round(round_id))??;

        self.recorder
            .record(
                ChainEventKind::MoveRecorded,
                serde_json::json!({ "round_id": round_id, "move": "reveal" }),
            )
            .await;

        match result {
            (RevealResult::Safe { multiplier_bps }, safe_revealed) => Ok(MinesProgress::Safe {
                multiplier_bps,
                safe_revealed,
            }),
            (RevealResult::Mine, _) => {
                let entry = self
                    .active
                    .take(round_id)
                    .ok_or_else(|| unknown_round(round_id))?;
                match entry.round {
                    ActiveRound::Mines(round) => {
                        let outcome = self.settle(entry.reservation, round.loss()).await?;
                        Ok(MinesProgress::Settled { outcome })
                    }
                    other => {
                        self.active.insert(other, entry.reservation);
                        Err(unknown_round(round_id))
                    }
                }
            }
        }
    }

    /// Cash out an interactive mines round at its compounded multiplier
    pub async fn mines_cash_out(&self, round_id: &str) -> EngineResult<Outcome> {
        let entry = self
            .active
            .take(round_id)
            .ok_or_else(|| unknown_round(round_id))?;
        match entry.round {
            ActiveRound::Mines(mut round) => {
                let resolution = round.cash_out()?;
                self.settle(entry.reservation, resolution).await
            }
            other => {
                self.active.insert(other, entry.reservation);
                Err(unknown_round(round_id))
            }
        }
    }

    // --- Lifecycle enforcement ------------------------------------------

    /// Force-abort every round resolving past the configured deadline,
    /// refunding stakes. Returns one error per reaped round.
    pub fn abort_dangling(&self) -> Vec<EngineError> {
        let deadline = Duration::from_millis(self.config.session.round_deadline_ms);
        self.active
            .drain_expired(deadline)
            .into_iter()
            .map(|entry| self.refund_entry(entry))
            .collect()
    }

    /// Abort all in-flight rounds with refunds and stop accepting work
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        for entry in self.active.drain_all() {
            self.refund_entry(entry);
        }
        tracing::info!("engine shut down, ledger left at last settled state");
    }

    // --- Internals -------------------------------------------------------

    fn validate_round(&self, config: &RoundConfig) -> EngineResult<()> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(EngineError::InvalidConfiguration(
                "engine is shutting down".to_string(),
            ));
        }
        config.validate()?;
        let stake = config.stake();
        if stake < self.config.stakes.min_stake || stake > self.config.stakes.max_stake {
            return Err(EngineError::InvalidConfiguration(format!(
                "stake {stake} outside limits {}..={}",
                self.config.stakes.min_stake, self.config.stakes.max_stake
            )));
        }
        Ok(())
    }

    fn ensure_no_active_round(&self) -> EngineResult<()> {
        if !self.active.is_empty() {
            return Err(RoundStateError::AnotherRoundActive.into());
        }
        Ok(())
    }

    async fn commit(
        &self,
        round_id: &str,
        game: GameKind,
        stake: Amount,
    ) -> EngineResult<Reservation> {
        let reservation = self.ledger.reserve(round_id, game, stake)?;
        self.events.emit(EngineEvent::BalanceChanged {
            new_balance: self.ledger.balance(),
            change: BalanceChange::Reserved,
        });
        self.recorder
            .record(
                ChainEventKind::RoundCommitted,
                serde_json::json!({
                    "round_id": round_id,
                    "game": game,
                    "stake": stake,
                }),
            )
            .await;
        tracing::debug!(round_id, %game, %stake, "round committed");
        Ok(reservation)
    }

    async fn settle(
        &self,
        reservation: Reservation,
        resolution: Resolution,
    ) -> EngineResult<Outcome> {
        let record = self.ledger.apply(
            reservation,
            resolution.won,
            resolution.multiplier_bps,
            resolution.payout,
        )?;
        let outcome = outcome_from(&record);

        self.events.emit(EngineEvent::BalanceChanged {
            new_balance: record.balance_after,
            change: BalanceChange::Settled,
        });
        self.events.emit(EngineEvent::RoundSettled {
            outcome: outcome.clone(),
        });
        self.recorder
            .record(
                ChainEventKind::RoundSettled,
                serde_json::json!({
                    "round_id": outcome.round_id,
                    "game": outcome.game,
                    "won": outcome.won,
                    "payout": outcome.payout,
                }),
            )
            .await;
        if !outcome.payout.is_zero() {
            self.recorder
                .record(
                    ChainEventKind::RewardClaimed,
                    serde_json::json!({
                        "round_id": outcome.round_id,
                        "amount": outcome.payout,
                    }),
                )
                .await;
        }
        tracing::info!(
            round_id = %outcome.round_id,
            game = %outcome.game,
            won = outcome.won,
            payout = %outcome.payout,
            balance = %outcome.balance_after,
            "round settled"
        );
        Ok(outcome)
    }

    fn refund_entry(&self, entry: ActiveEntry) -> EngineError {
        let round_id = entry.round.id().to_string();
        let game = entry.reservation.game;
        let record = self.ledger.refund(entry.reservation);
        self.events.emit(EngineEvent::BalanceChanged {
            new_balance: record.balance_after,
            change: BalanceChange::Refunded,
        });
        self.events.emit(EngineEvent::RoundAborted {
            round_id: round_id.clone(),
            game,
            stake_refunded: record.stake,
        });
        tracing::warn!(%round_id, %game, stake = %record.stake, "round force-aborted");
        EngineError::DanglingRound { round_id }
    }

}

fn new_round_id(game: GameKind) -> String {
    format!("{game}-{}", Uuid::new_v4())
}

fn unknown_round(round_id: &str) -> EngineError {
    RoundStateError::UnknownRound {
        round_id: round_id.to_string(),
    }
    .into()
}

fn outcome_from(record: &SettlementRecord) -> Outcome {
    Outcome {
        round_id: record.round_id.clone(),
        game: record.game,
        won: record.won,
        stake: record.stake,
        multiplier_bps: record.multiplier_bps,
        payout: record.payout,
        net: record.net,
        balance_after: record.balance_after,
    }
}
