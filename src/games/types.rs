use crate::errors::{EngineError, EngineResult};
use crate::money::{Amount, BPS_SCALE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Dice,
    Crash,
    Plinko,
    Mines,
    Roulette,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Dice => write!(f, "dice"),
            GameKind::Crash => write!(f, "crash"),
            GameKind::Plinko => write!(f, "plinko"),
            GameKind::Mines => write!(f, "mines"),
            GameKind::Roulette => write!(f, "roulette"),
        }
    }
}

/// Dice roll direction relative to the threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiceDirection {
    Over,
    Under,
}

/// Dice round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceConfig {
    pub stake: Amount,
    /// Roll target, strictly inside (0, 100)
    pub threshold: u8,
    pub direction: DiceDirection,
}

/// Crash round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashConfig {
    pub stake: Amount,
    /// Cash out automatically when the running multiplier reaches this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_cash_out_bps: Option<u32>,
}

/// Plinko difficulty tier selecting a multiplier ladder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlinkoTier {
    Easy,
    Medium,
    Hard,
}

/// Plinko round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlinkoConfig {
    pub stake: Amount,
    pub tier: PlinkoTier,
}

/// Mines round parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinesConfig {
    pub stake: Amount,
    /// Hidden mines on the 25-cell grid
    pub mines: u8,
    /// Unattended play: reveal this many cells, then cash out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_reveal: Option<u8>,
}

/// A single roulette wager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "bet", rename_all = "lowercase")]
pub enum RouletteBet {
    /// Single number 0-36, pays 36x gross
    Straight { number: u8 },
    /// Pays 2x gross
    Red,
    Black,
    Even,
    Odd,
    /// 1-18, pays 2x gross
    Low,
    /// 19-36, pays 2x gross
    High,
    /// Dozen 1-3 (1-12, 13-24, 25-36), pays 3x gross
    Dozen { index: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouletteWager {
    #[serde(flatten)]
    pub bet: RouletteBet,
    pub amount: Amount,
}

/// Roulette round parameters; total stake is the sum of wager amounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouletteConfig {
    pub wagers: Vec<RouletteWager>,
}

impl RouletteConfig {
    pub fn total_stake(&self) -> Amount {
        self.wagers
            .iter()
            .fold(Amount::ZERO, |acc, w| acc.saturating_add(w.amount))
    }
}

/// Game-specific round configuration (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum RoundConfig {
    Dice(DiceConfig),
    Crash(CrashConfig),
    Plinko(PlinkoConfig),
    Mines(MinesConfig),
    Roulette(RouletteConfig),
}

impl RoundConfig {
    pub fn kind(&self) -> GameKind {
        match self {
            RoundConfig::Dice(_) => GameKind::Dice,
            RoundConfig::Crash(_) => GameKind::Crash,
            RoundConfig::Plinko(_) => GameKind::Plinko,
            RoundConfig::Mines(_) => GameKind::Mines,
            RoundConfig::Roulette(_) => GameKind::Roulette,
        }
    }

    pub fn stake(&self) -> Amount {
        match self {
            RoundConfig::Dice(c) => c.stake,
            RoundConfig::Crash(c) => c.stake,
            RoundConfig::Plinko(c) => c.stake,
            RoundConfig::Mines(c) => c.stake,
            RoundConfig::Roulette(c) => c.total_stake(),
        }
    }

    /// Game-intrinsic validation, checked before any ledger interaction.
    /// Stake limits are enforced separately against the engine configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.stake().is_zero() {
            return Err(EngineError::InvalidConfiguration(
                "stake must be greater than zero".to_string(),
            ));
        }
        match self {
            RoundConfig::Dice(c) => {
                // threshold 0 or 100 would make the win chance 0% or 100%
                if c.threshold == 0 || c.threshold >= 100 {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "dice threshold {} outside (0, 100)",
                        c.threshold
                    )));
                }
            }
            RoundConfig::Crash(c) => {
                if let Some(target) = c.auto_cash_out_bps {
                    if target <= BPS_SCALE as u32 {
                        return Err(EngineError::InvalidConfiguration(
                            "auto cash-out must exceed 1.00x".to_string(),
                        ));
                    }
                }
            }
            RoundConfig::Plinko(_) => {}
            RoundConfig::Mines(c) => {
                if !crate::games::payout::ALLOWED_MINE_COUNTS.contains(&c.mines) {
                    return Err(EngineError::InvalidConfiguration(format!(
                        "mine count {} not in {:?}",
                        c.mines,
                        crate::games::payout::ALLOWED_MINE_COUNTS
                    )));
                }
                if let Some(reveals) = c.auto_reveal {
                    let safe = crate::games::payout::GRID_CELLS - c.mines;
                    if reveals == 0 || reveals > safe {
                        return Err(EngineError::InvalidConfiguration(format!(
                            "auto reveal count {reveals} outside 1..={safe}"
                        )));
                    }
                }
            }
            RoundConfig::Roulette(c) => {
                if c.wagers.is_empty() {
                    return Err(EngineError::InvalidConfiguration(
                        "roulette round needs at least one wager".to_string(),
                    ));
                }
                for wager in &c.wagers {
                    if wager.amount.is_zero() {
                        return Err(EngineError::InvalidConfiguration(
                            "zero-amount wager".to_string(),
                        ));
                    }
                    match wager.bet {
                        RouletteBet::Straight { number } if number > 36 => {
                            return Err(EngineError::InvalidConfiguration(format!(
                                "straight-up number {number} outside 0..=36"
                            )));
                        }
                        RouletteBet::Dozen { index } if !(1..=3).contains(&index) => {
                            return Err(EngineError::InvalidConfiguration(format!(
                                "dozen index {index} outside 1..=3"
                            )));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

/// Round lifecycle phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    Configuring,
    Committed,
    Resolving,
    Settled,
    Aborted,
}

impl RoundPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundPhase::Settled | RoundPhase::Aborted)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoundPhase::Configuring => "configuring",
            RoundPhase::Committed => "committed",
            RoundPhase::Resolving => "resolving",
            RoundPhase::Settled => "settled",
            RoundPhase::Aborted => "aborted",
        }
    }
}

/// Settlement inputs produced by a resolved round state machine,
/// before the ledger applies them
#[derive(Debug, Clone)]
pub struct Resolution {
    pub won: bool,
    pub multiplier_bps: u32,
    pub payout: Amount,
}

/// Terminal result of a round, produced exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub round_id: String,
    pub game: GameKind,
    pub won: bool,
    pub stake: Amount,
    pub multiplier_bps: u32,
    pub payout: Amount,
    /// payout - stake, in signed minor units
    pub net: i64,
    pub balance_after: Amount,
}
