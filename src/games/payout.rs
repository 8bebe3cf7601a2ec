//! Pure payout model
//!
//! Stateless functions mapping a game's configuration plus uniform draws to
//! win/loss outcomes and basis-point multipliers. House edge lives entirely
//! in the constants and formulas here; no ledger or RNG state is touched.

use crate::games::types::{DiceDirection, PlinkoTier, RouletteBet, RouletteWager};
use crate::money::{Amount, BPS_SCALE};

// --- Dice ---------------------------------------------------------------

/// House keeps 1% of the fair dice multiplier
pub const DICE_EDGE_NUMERATOR: u64 = 99;

/// Win chance in whole percent for a threshold/direction pair
pub fn dice_win_chance(threshold: u8, direction: DiceDirection) -> u8 {
    debug_assert!(threshold > 0 && threshold < 100);
    match direction {
        DiceDirection::Over => 100 - threshold,
        DiceDirection::Under => threshold,
    }
}

/// Dice multiplier: (100 / win_chance) * 0.99, floored to basis points
pub fn dice_multiplier_bps(win_chance: u8) -> u32 {
    (DICE_EDGE_NUMERATOR * BPS_SCALE / win_chance as u64) as u32
}

/// Whether a continuous roll in [0, 100) beats the threshold
pub fn dice_wins(roll: f64, threshold: u8, direction: DiceDirection) -> bool {
    match direction {
        DiceDirection::Over => roll > threshold as f64,
        DiceDirection::Under => roll < threshold as f64,
    }
}

// --- Crash --------------------------------------------------------------

/// Crash point spread: 1.00x + draw * 10.00x
pub const CRASH_RANGE_BPS: u64 = 100_000;

/// Sample the crash point for a round from one uniform draw
pub fn crash_point_bps(draw: f64) -> u32 {
    (BPS_SCALE + (draw * CRASH_RANGE_BPS as f64) as u64) as u32
}

// --- Plinko -------------------------------------------------------------

/// Slot multiplier ladders per tier, in basis points.
/// Slots are drawn uniformly; each ladder's mean sits just under 1.00x.
pub const PLINKO_EASY: [u32; 5] = [5_000, 8_000, 10_000, 11_000, 15_000];
pub const PLINKO_MEDIUM: [u32; 6] = [1_000, 3_000, 8_000, 12_000, 16_000, 19_000];
pub const PLINKO_HARD: [u32; 5] = [0, 2_000, 4_000, 10_000, 33_000];

pub fn plinko_ladder(tier: PlinkoTier) -> &'static [u32] {
    match tier {
        PlinkoTier::Easy => &PLINKO_EASY,
        PlinkoTier::Medium => &PLINKO_MEDIUM,
        PlinkoTier::Hard => &PLINKO_HARD,
    }
}

// --- Mines --------------------------------------------------------------

/// Fixed 5x5 grid
pub const GRID_CELLS: u8 = 25;

/// Mine counts offered by the game
pub const ALLOWED_MINE_COUNTS: [u8; 5] = [1, 3, 5, 7, 10];

/// Probability that the next reveal hits a mine, given the live board
pub fn mines_hazard(mines: u8, cells_revealed: u8) -> f64 {
    let cells_remaining = GRID_CELLS - cells_revealed;
    debug_assert!(cells_remaining > 0);
    mines as f64 / cells_remaining as f64
}

/// Compound the running multiplier after one safe reveal.
///
/// The factor for the k-th safe reveal (zero-based) is
/// total_safe / (total_safe - k); flooring happens per step.
pub fn mines_step_multiplier_bps(current_bps: u32, mines: u8, safe_revealed_before: u8) -> u32 {
    let total_safe = (GRID_CELLS - mines) as u128;
    let remaining = total_safe - safe_revealed_before as u128;
    let next = current_bps as u128 * total_safe / remaining;
    u32::try_from(next).unwrap_or(u32::MAX)
}

/// Multiplier locked in after `reveals` consecutive safe reveals,
/// recomputed from 1.00x with per-step flooring
pub fn mines_multiplier_after(mines: u8, reveals: u8) -> u32 {
    let mut bps = BPS_SCALE as u32;
    for k in 0..reveals {
        bps = mines_step_multiplier_bps(bps, mines, k);
    }
    bps
}

// --- Roulette -----------------------------------------------------------

/// Red numbers on a European single-zero wheel
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

pub fn roulette_is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

/// Gross payout multiplier for a winning wager (stake included)
pub fn roulette_multiplier_bps(bet: &RouletteBet) -> u32 {
    match bet {
        RouletteBet::Straight { .. } => 36 * BPS_SCALE as u32,
        RouletteBet::Dozen { .. } => 3 * BPS_SCALE as u32,
        RouletteBet::Red
        | RouletteBet::Black
        | RouletteBet::Even
        | RouletteBet::Odd
        | RouletteBet::Low
        | RouletteBet::High => 2 * BPS_SCALE as u32,
    }
}

/// Whether a wager covers the winning number
pub fn roulette_hits(bet: &RouletteBet, winning: u8) -> bool {
    match bet {
        RouletteBet::Straight { number } => *number == winning,
        RouletteBet::Red => roulette_is_red(winning),
        RouletteBet::Black => winning != 0 && !roulette_is_red(winning),
        RouletteBet::Even => winning != 0 && winning % 2 == 0,
        RouletteBet::Odd => winning % 2 == 1,
        RouletteBet::Low => (1..=18).contains(&winning),
        RouletteBet::High => (19..=36).contains(&winning),
        RouletteBet::Dozen { index } => {
            winning != 0 && (winning - 1) / 12 + 1 == *index
        }
    }
}

/// Total gross payout across all wagers for a winning number
pub fn roulette_payout(wagers: &[RouletteWager], winning: u8) -> Amount {
    wagers
        .iter()
        .filter(|w| roulette_hits(&w.bet, winning))
        .fold(Amount::ZERO, |acc, w| {
            acc.saturating_add(w.amount.scale_bps(roulette_multiplier_bps(&w.bet)))
        })
}
