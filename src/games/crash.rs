//! Crash round state machine
//!
//! The crash point is sampled once at arm time; the running multiplier then
//! climbs by a fixed step per tick until it reaches the crash point or the
//! player cashes out strictly before it. Tick ownership is scoped to the
//! engine, which guarantees a terminal state on settlement or shutdown.

use crate::errors::{EngineResult, RoundStateError};
use crate::games::payout;
use crate::games::types::{CrashConfig, Resolution, RoundPhase};
use crate::money::{Amount, BPS_SCALE};

/// Result of advancing the running multiplier by one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrashTick {
    /// Still climbing; current running multiplier
    Running { current_bps: u32 },
    /// Auto cash-out fired strictly before the crash point
    CashedOut { at_bps: u32 },
    /// Running multiplier reached the crash point
    Crashed { point_bps: u32 },
}

pub struct CrashRound {
    id: String,
    config: CrashConfig,
    phase: RoundPhase,
    tick_step_bps: u32,
    crash_point_bps: Option<u32>,
    current_bps: u32,
}

impl CrashRound {
    pub fn new(id: String, config: CrashConfig, tick_step_bps: u32) -> Self {
        Self {
            id,
            config,
            phase: RoundPhase::Configuring,
            tick_step_bps,
            crash_point_bps: None,
            current_bps: BPS_SCALE as u32,
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

    /// Crash point, available once armed
    pub fn crash_point_bps(&self) -> Option<u32> {
        self.crash_point_bps
    }

    pub fn current_bps(&self) -> u32 {
        self.current_bps
    }

    /// Stake has been reserved
    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Configuring)?;
        self.phase = RoundPhase::Committed;
        Ok(())
    }

    /// Consume the round's single draw: sample the crash point and start
    /// the running multiplier at 1.00x
    pub fn arm(&mut self, draw: f64) -> EngineResult<()> {
        self.expect_phase(RoundPhase::Committed)?;
        self.crash_point_bps = Some(payout::crash_point_bps(draw));
        self.current_bps = BPS_SCALE as u32;
        self.phase = RoundPhase::Resolving;
        Ok(())
    }

    /// Advance the running multiplier by one step.
    ///
    /// The auto cash-out window is checked before the crash comparison so a
    /// step can never jump over a target that precedes the crash point.
    pub fn tick(&mut self) -> EngineResult<CrashTick> {
        self.expect_phase(RoundPhase::Resolving)?;
        let point = self.crash_point_bps.expect("armed round has a crash point");

        let next = self.current_bps.saturating_add(self.tick_step_bps);

        if let Some(target) = self.config.auto_cash_out_bps {
            if target < point && next >= target {
                self.current_bps = target;
                return Ok(CrashTick::CashedOut { at_bps: target });
            }
        }

        if next >= point {
            self.current_bps = point;
            return Ok(CrashTick::Crashed { point_bps: point });
        }

        self.current_bps = next;
        Ok(CrashTick::Running { current_bps: next })
    }

    /// Manual cash-out at the current running multiplier.
    /// Valid only strictly before the crash point.
    pub fn cash_out(&mut self) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Resolving)?;
        let at_bps = self.current_bps;
        self.phase = RoundPhase::Settled;
        Ok(Resolution {
            won: true,
            multiplier_bps: at_bps,
            payout: self.config.stake.scale_bps(at_bps),
        })
    }

    /// Settle a terminal tick result
    pub fn settle(&mut self, tick: &CrashTick) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Resolving)?;
        let resolution = match tick {
            CrashTick::CashedOut { at_bps } => Resolution {
                won: true,
                multiplier_bps: *at_bps,
                payout: self.config.stake.scale_bps(*at_bps),
            },
            CrashTick::Crashed { .. } => Resolution {
                won: false,
                multiplier_bps: 0,
                payout: Amount::ZERO,
            },
            CrashTick::Running { .. } => {
                return Err(RoundStateError::WrongPhase {
                    round_id: self.id.clone(),
                    expected: "terminal tick",
                    actual: "running",
                }
                .into())
            }
        };
        self.phase = RoundPhase::Settled;
        Ok(resolution)
    }

    /// Run remaining ticks without delay until terminal, using the already
    /// sampled crash point. Used when a cancel or teardown arrives while
    /// the round is resolving: the round still reaches `Settled`.
    pub fn fast_forward(&mut self) -> EngineResult<Resolution> {
        self.expect_phase(RoundPhase::Resolving)?;
        loop {
            let tick = self.tick()?;
            if !matches!(tick, CrashTick::Running { .. }) {
                return self.settle(&tick);
            }
        }
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

    fn armed(auto: Option<u32>, draw: f64) -> CrashRound {
        let mut r = CrashRound::new(
            "crash-1".to_string(),
            CrashConfig {
                stake: Amount::from_units(10),
                auto_cash_out_bps: auto,
            },
            100,
        );
        r.mark_committed().unwrap();
        r.arm(draw).unwrap();
        r
    }

    #[test]
    fn test_draw_only_after_commit() {
        let mut r = CrashRound::new(
            "crash-0".to_string(),
            CrashConfig {
                stake: Amount::from_units(1),
                auto_cash_out_bps: None,
            },
            100,
        );
        assert!(r.arm(0.5).is_err());
        r.mark_committed().unwrap();
        r.arm(0.5).unwrap();
        assert_eq!(r.crash_point_bps(), Some(60_000));
        // the draw is consumed; arming twice is a phase violation
        assert!(r.arm(0.9).is_err());
    }

    #[test]
    fn test_climbs_then_crashes() {
        // draw 0.02 -> crash point 1.20x, 100 bps per tick
        let mut r = armed(None, 0.02);
        let mut running = 0;
        loop {
            match r.tick().unwrap() {
                CrashTick::Running { .. } => running += 1,
                CrashTick::Crashed { point_bps } => {
                    assert_eq!(point_bps, 12_000);
                    let res = r.settle(&CrashTick::Crashed { point_bps }).unwrap();
                    assert!(!res.won);
                    assert_eq!(res.payout, Amount::ZERO);
                    break;
                }
                CrashTick::CashedOut { .. } => panic!("no auto cash-out configured"),
            }
        }
        // 1.00 -> 1.19 in 19 running steps, the 20th reaches the point
        assert_eq!(running, 19);
        assert_eq!(r.phase(), RoundPhase::Settled);
    }

    #[test]
    fn test_auto_cash_out_before_point_wins() {
        // crash point 6.00x, target 1.50x
        let mut r = armed(Some(15_000), 0.5);
        let res = loop {
            match r.tick().unwrap() {
                CrashTick::Running { .. } => continue,
                terminal => break r.settle(&terminal).unwrap(),
            }
        };
        assert!(res.won);
        assert_eq!(res.multiplier_bps, 15_000);
        assert_eq!(res.payout, Amount::from_units(15));
    }

    #[test]
    fn test_auto_cash_out_at_point_loses() {
        // target equal to the crash point is not "strictly before"
        let mut r = armed(Some(12_000), 0.02);
        let res = r.fast_forward().unwrap();
        assert!(!res.won);
        assert_eq!(res.payout, Amount::ZERO);
    }

    #[test]
    fn test_manual_cash_out_locks_current_multiplier() {
        let mut r = armed(None, 0.5);
        for _ in 0..25 {
            r.tick().unwrap();
        }
        // 25 ticks of +0.01x from 1.00x
        assert_eq!(r.current_bps(), 12_500);
        let res = r.cash_out().unwrap();
        assert!(res.won);
        assert_eq!(res.payout, Amount::from_minor(1_250));
        assert!(r.tick().is_err(), "settled round must not tick");
    }

    #[test]
    fn test_fast_forward_settles_with_sampled_point() {
        let mut r = armed(Some(30_000), 0.5);
        let point = r.crash_point_bps().unwrap();
        let res = r.fast_forward().unwrap();
        assert_eq!(point, 60_000, "fast-forward must not resample");
        assert!(res.won);
        assert_eq!(res.multiplier_bps, 30_000);
        assert_eq!(r.phase(), RoundPhase::Settled);
    }
}
