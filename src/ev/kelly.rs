//! Kelly Criterion Bet Sizing
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = profit per unit stake (decimal odds - 1)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Expected profit per unit stake: `p*b - (1 - p)`.
pub fn expected_value(probability: f64, payout: f64) -> f64 {
    probability * payout - (1.0 - probability)
}

/// Calculate the raw Kelly fraction for a single bet
///
/// # Arguments
/// * `probability` - Estimated probability of winning (0-1)
/// * `payout` - Profit per unit stake (e.g. 1.2 for +120)
///
/// # Returns
/// Kelly fraction (negative when EV < 0, zero when payout <= 0)
///
/// # Examples
/// ```
/// use odds_ev::ev::kelly::calculate_kelly_fraction;
/// let kelly = calculate_kelly_fraction(0.48, 1.2);
/// assert!((kelly - 0.0466667).abs() < 0.0001);
/// ```
pub fn calculate_kelly_fraction(probability: f64, payout: f64) -> f64 {
    if payout <= 0.0 {
        return 0.0;
    }

    (payout * probability - (1.0 - probability)) / payout
}

/// Kelly fraction clamped to `[0, 1]`.
pub fn clamped_kelly_fraction(probability: f64, payout: f64) -> f64 {
    let kelly = calculate_kelly_fraction(probability, payout);
    if kelly.is_nan() {
        return 0.0;
    }
    kelly.clamp(0.0, 1.0)
}

/// Recommended stake for a clamped Kelly fraction
///
/// The raw fraction is clamped to `[0, 1]` before the Kelly multiplier is
/// applied, so the stake never exceeds `bankroll * kelly_multiplier`.
///
/// # Arguments
/// * `bankroll` - Current bankroll amount
/// * `kelly_multiplier` - Fraction of Kelly to use (0.5 = half Kelly)
/// * `kelly` - Kelly fraction for the bet
pub fn calculate_optimal_stake(bankroll: Decimal, kelly_multiplier: f64, kelly: f64) -> Decimal {
    let kelly = if kelly.is_nan() { 0.0 } else { kelly.clamp(0.0, 1.0) };
    if kelly == 0.0 || bankroll <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let fraction = Decimal::from_f64(kelly * kelly_multiplier).unwrap_or(Decimal::ZERO);
    bankroll * fraction
}
