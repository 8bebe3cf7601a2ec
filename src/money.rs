//! Fixed-point money and multiplier arithmetic
//!
//! Balances, stakes and payouts are integer minor units; multipliers are
//! integer basis points. All settlement math is exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Minor units per whole credit (two decimal places)
pub const MINOR_PER_UNIT: u64 = 100;

/// Basis points per 1.00x multiplier
pub const BPS_SCALE: u64 = 10_000;

/// A non-negative monetary quantity in integer minor units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Construct from raw minor units
    pub const fn from_minor(minor: u64) -> Self {
        Amount(minor)
    }

    /// Construct from whole credits
    pub const fn from_units(units: u64) -> Self {
        Amount(units * MINOR_PER_UNIT)
    }

    /// Raw minor units
    pub const fn minor(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Scale by a basis-point multiplier, flooring toward zero.
    ///
    /// The floor keeps the remainder with the house; intermediate math is
    /// u128 so large stakes cannot overflow mid-computation.
    pub fn scale_bps(self, multiplier_bps: u32) -> Amount {
        let gross = (self.0 as u128) * (multiplier_bps as u128) / (BPS_SCALE as u128);
        Amount(u64::try_from(gross).unwrap_or(u64::MAX))
    }

    /// Signed difference in minor units (payout - stake style deltas)
    pub fn signed_delta(payout: Amount, stake: Amount) -> i64 {
        payout.0 as i64 - stake.0 as i64
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / MINOR_PER_UNIT,
            self.0 % MINOR_PER_UNIT
        )
    }
}

/// Format a basis-point multiplier as e.g. "1.98x"
pub fn format_bps(multiplier_bps: u32) -> String {
    format!(
        "{}.{:02}x",
        multiplier_bps as u64 / BPS_SCALE,
        (multiplier_bps as u64 % BPS_SCALE) / 100
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_bps_exact() {
        let stake = Amount::from_units(10);
        // 1.98x on 10.00 -> 19.80
        assert_eq!(stake.scale_bps(19_800), Amount::from_minor(1_980));
    }

    #[test]
    fn test_scale_bps_floors_remainder() {
        let stake = Amount::from_minor(1);
        // 1 minor unit * 1.98x = 1.98 -> floors to 1
        assert_eq!(stake.scale_bps(19_800), Amount::from_minor(1));
        // losses always floor to zero
        assert_eq!(stake.scale_bps(0), Amount::ZERO);
    }

    #[test]
    fn test_scale_bps_no_overflow() {
        let stake = Amount::from_minor(u64::MAX);
        let scaled = stake.scale_bps(3_000_000_000);
        assert_eq!(scaled, Amount::from_minor(u64::MAX));
    }

    #[test]
    fn test_signed_delta() {
        let stake = Amount::from_units(10);
        let win = Amount::from_units(20);
        assert_eq!(Amount::signed_delta(win, stake), 1_000);
        assert_eq!(Amount::signed_delta(Amount::ZERO, stake), -1_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_minor(1_980).to_string(), "19.80");
        assert_eq!(Amount::from_minor(5).to_string(), "0.05");
        assert_eq!(format_bps(19_800), "1.98x");
        assert_eq!(format_bps(10_000), "1.00x");
    }
}
