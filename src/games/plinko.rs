//! Plinko round state machine
//!
//! One uniform slot draw against the tier's multiplier ladder. The uniform
//! draw is deliberate; the board is not modelled as a binomial walk.

use crate::errors::{EngineResult, RoundStateError};
use crate::games::payout;
use crate::games::types::{PlinkoConfig, Resolution, RoundPhase};
use crate::money::BPS_SCALE;

pub struct PlinkoRound {
    id: String,
    config: PlinkoConfig,
    phase: RoundPhase,
    slot: Option<u32>,
}

impl PlinkoRound {
    pub fn new(id: String, config: PlinkoConfig) -> Self {
        Self {
            id,
            config,
            phase: RoundPhase::Configuring,
            slot: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Ladder length for this round's tier; the engine draws below this
    pub fn ladder_len(&self) -> u32 {
        payout::plinko_ladder(self.config.tier).len() as u32
    }

    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Configuring)?;
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Consume the slot draw and settle
    pub fn resolve(&mut self, slot: u32) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Committed)?;
        self.phase = RoundPhase::Resolving;

        let ladder = payout::plinko_ladder(self.config.tier);
        debug_assert!((slot as usize) < ladder.len());
        let multiplier_bps = ladder[slot as usize];
        self.slot = Some(slot);

        self.phase = RoundPhase::Settled;
        Ok(Resolution {
            won: multiplier_bps as u64 >= BPS_SCALE,
            multiplier_bps,
            payout: self.config.stake.scale_bps(multiplier_bps),
        })
    }

    /// Landed slot index, available once settled
    pub fn slot(&self) -> Option<u32> {
        self.slot
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::PlinkoTier;
    use crate::money::Amount;

    fn round(tier: PlinkoTier) -> PlinkoRound {
        PlinkoRound::new(
            "plinko-1".to_string(),
            PlinkoConfig {
                stake: Amount::from_units(10),
                tier,
            },
        )
    }

    #[test]
    fn test_slot_maps_to_ladder() {
        let mut r = round(PlinkoTier::Easy);
        r.mark_committed().unwrap();
        let res = r.resolve(4).unwrap();
        // last easy slot pays 1.50x
        assert_eq!(res.multiplier_bps, 15_000);
        assert_eq!(res.payout, Amount::from_units(15));
        assert!(res.won);
        assert_eq!(r.slot(), Some(4));
    }

    #[test]
    fn test_sub_par_slot_is_a_loss() {
        let mut r = round(PlinkoTier::Hard);
        r.mark_committed().unwrap();
        let res = r.resolve(0).unwrap();
        assert_eq!(res.multiplier_bps, 0);
        assert_eq!(res.payout, Amount::ZERO);
        assert!(!res.won);
    }

    #[test]
    fn test_single_draw_lifecycle() {
        let mut r = round(PlinkoTier::Medium);
        assert!(r.resolve(0).is_err());
        r.mark_committed().unwrap();
        assert_eq!(r.ladder_len(), 6);
        r.resolve(5).unwrap();
        assert!(r.resolve(0).is_err());
        assert_eq!(r.phase(), RoundPhase::Settled);
    }
}
