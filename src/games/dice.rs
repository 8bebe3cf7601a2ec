//! Dice round state machine
//!
//! Single-draw round: a continuous roll in [0, 100) against a threshold,
//! paying (100 / win_chance) * 0.99.

use crate::errors::{EngineResult, RoundStateError};
use crate::games::payout;
use crate::games::types::{DiceConfig, Resolution, RoundPhase};

pub struct DiceRound {
    id: String,
    config: DiceConfig,
    phase: RoundPhase,
    roll: Option<f64>,
}

impl DiceRound {
    pub fn new(id: String, config: DiceConfig) -> Self {
        Self {
            id,
            config,
            phase: RoundPhase::Configuring,
            roll: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Stake has been reserved; the round may now draw
    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Configuring)?;
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Consume the round's single draw and settle.
    ///
    /// `draw` is uniform in [0, 1); the roll is scaled to [0, 100).
    pub fn resolve(&mut self, draw: f64) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Committed)?;
        self.phase = RoundPhase::Resolving;

        let roll = draw * 100.0;
        self.roll = Some(roll);

        let won = payout::dice_wins(roll, self.config.threshold, self.config.direction);
        let chance = payout::dice_win_chance(self.config.threshold, self.config.direction);
        let multiplier_bps = if won { payout::dice_multiplier_bps(chance) } else { 0 };
        let payout = self.config.stake.scale_bps(multiplier_bps);

        self.phase = RoundPhase::Settled;
        Ok(Resolution {
            won,
            multiplier_bps,
            payout,
        })
    }

    /// The roll shown to the player, available once settled
    pub fn roll(&self) -> Option<f64> {
        self.roll
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
