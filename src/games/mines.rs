//! Mines round state machine
//!
//! A committed round is a sequence of reveal choices on a 25-cell grid.
//! Each reveal draws against the live hazard (mines remaining over cells
//! remaining); a safe reveal compounds the multiplier, a mine zeroes the
//! round, and a voluntary cash-out locks in the compounded multiplier.
//!
//! Mine placement is decided per reveal from the hazard draw rather than
//! from a pre-assigned mine set; the hazard denominator shrinks with each
//! revealed cell while the mine count stays live until one is hit.

use crate::errors::{EngineResult, RoundStateError};
use crate::games::payout;
use crate::games::types::{MinesConfig, Resolution, RoundPhase};
use crate::money::{Amount, BPS_SCALE};

/// Result of revealing one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealResult {
    /// Safe cell; the compounded multiplier so far
    Safe { multiplier_bps: u32 },
    /// Mine hit; the round is lost
    Mine,
}

pub struct MinesRound {
    id: String,
    config: MinesConfig,
    phase: RoundPhase,
    safe_revealed: u8,
    multiplier_bps: u32,
}

impl MinesRound {
    pub fn new(id: String, config: MinesConfig) -> Self {
        Self {
            id,
            config,
            phase: RoundPhase::Configuring,
            safe_revealed: 0,
            multiplier_bps: BPS_SCALE as u32,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn stake(&self) -> Amount {
        self.config.stake
    }

    pub fn safe_revealed(&self) -> u8 {
        self.safe_revealed
    }

    pub fn multiplier_bps(&self) -> u32 {
        self.multiplier_bps
    }

    /// Safe cells left on the board
    pub fn safe_remaining(&self) -> u8 {
        payout::GRID_CELLS - self.config.mines - self.safe_revealed
    }

    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Configuring)?;
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Open the board; the round stays resolving until a mine or cash-out
    pub fn begin(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Committed)?;
        self.phase = RoundPhase::Resolving;
        Ok(())
    }

    /// Reveal one cell against a fresh uniform draw.
    ///
    /// Returns `Mine` and settles the round as a loss, or `Safe` with the
    /// compounded multiplier, leaving the round resolving.
    pub fn reveal(&mut self, draw: f64) -> EngineResult<RevealResult> {
        self.expect_phase(RoundPhase::Resolving)?;
        if self.safe_remaining() == 0 {
            return Err(RoundStateError::WrongPhase {
                round_id: self.id.clone(),
                expected: "cells left to reveal",
                actual: "board cleared",
            }
            .into());
        }

        // only safe cells are ever revealed; a mine ends the round instead
        let hazard = payout::mines_hazard(self.config.mines, self.safe_revealed);
        if draw < hazard {
            self.phase = RoundPhase::Settled;
            return Ok(RevealResult::Mine);
        }

        self.multiplier_bps = payout::mines_step_multiplier_bps(
            self.multiplier_bps,
            self.config.mines,
            self.safe_revealed,
        );
        self.safe_revealed += 1;
        Ok(RevealResult::Safe {
            multiplier_bps: self.multiplier_bps,
        })
    }

    /// Loss resolution after a mine hit
    pub fn loss(&self) -> Resolution {
        Resolution {
            won: false,
            multiplier_bps: 0,
            payout: Amount::ZERO,
        }
    }

    /// Voluntary cash-out at the current compounded multiplier
    pub fn cash_out(&mut self) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Resolving)?;
        self.phase = RoundPhase::Settled;
        Ok(Resolution {
            won: true,
            multiplier_bps: self.multiplier_bps,
            payout: self.config.stake.scale_bps(self.multiplier_bps),
        })
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
