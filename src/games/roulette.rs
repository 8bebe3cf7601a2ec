//! Roulette round state machine
//!
//! One European single-zero spin settles every placed wager independently;
//! the round's payout is the sum over matching wagers and the reported
//! multiplier is derived from the combined stake.

use crate::errors::{EngineResult, RoundStateError};
use crate::games::payout;
use crate::games::types::{Resolution, RouletteConfig, RoundPhase};
use crate::money::{Amount, BPS_SCALE};

pub struct RouletteRound {
    id: String,
    config: RouletteConfig,
    phase: RoundPhase,
    winning: Option<u8>,
}

impl RouletteRound {
    pub fn new(id: String, config: RouletteConfig) -> Self {
        Self {
            id,
            config,
            phase: RoundPhase::Configuring,
            winning: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn total_stake(&self) -> Amount {
        self.config.total_stake()
    }

    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Configuring)?;
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Consume the wheel draw (0-36) and settle every wager
    pub fn resolve(&mut self, winning: u8) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Committed)?;
        self.phase = RoundPhase::Resolving;
        debug_assert!(winning <= 36);
        self.winning = Some(winning);

        let stake = self.config.total_stake();
        let total_payout = payout::roulette_payout(&self.config.wagers, winning);
        // combined multiplier across the whole wager set
        let multiplier_bps = if stake.is_zero() {
            0
        } else {
            ((total_payout.minor() as u128 * BPS_SCALE as u128) / stake.minor() as u128) as u32
        };

        self.phase = RoundPhase::Settled;
        Ok(Resolution {
            won: total_payout >= stake,
            multiplier_bps,
            payout: total_payout,
        })
    }

    /// Winning number, available once settled
    pub fn winning(&self) -> Option<u8> {
        self.winning
    }

    fn expect_phase(&self, expected: RoundPhase) -> Result<(), RoundStateError> {
        if self.phase != expected {
            return Err(RoundStateError::WrongPhase {
                round_id: self.id.clone(),
                expected: expected.name(),
                actual: self.phase.name(),
            });
        }
        Ok(())
    }
}
