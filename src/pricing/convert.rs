//! Conversions between American odds, decimal odds and probabilities.
//!
//! For American odds `o`:
//!
//! ```text
//! o > 0:  p = 100 / (o + 100)      b = o / 100
//! o < 0:  p = -o / (-o + 100)      b = 100 / -o
//! ```
//!
//! where `p` is the implied probability and `b` the profit per unit stake.
//! The inverse maps `p >= 0.5` to negative (favourite) prices.

use crate::error::PricingError;

/// Convert American odds to implied probability.
///
/// # Examples
/// ```
/// use odds_ev::pricing::american_to_implied_probability;
/// let p = american_to_implied_probability(-110);
/// assert!((p - 0.5238).abs() < 0.0001);
/// ```
pub fn american_to_implied_probability(odds: i32) -> f64 {
    let odds = odds as f64;
    if odds > 0.0 {
        100.0 / (odds + 100.0)
    } else {
        -odds / (-odds + 100.0)
    }
}

/// Profit per unit stake if a bet at these odds wins.
pub fn american_to_payout(odds: i32) -> f64 {
    let odds = odds as f64;
    if odds > 0.0 {
        odds / 100.0
    } else {
        100.0 / -odds
    }
}

/// Convert American odds to decimal odds (stake included).
pub fn american_to_decimal(odds: i32) -> f64 {
    1.0 + american_to_payout(odds)
}

/// Convert a probability to unrounded fair American odds.
pub fn probability_to_american_exact(probability: f64) -> Result<f64, PricingError> {
    check_probability(probability)?;

    if probability >= 0.5 {
        Ok(-100.0 * probability / (1.0 - probability))
    } else {
        Ok(100.0 * (1.0 - probability) / probability)
    }
}

/// Convert a probability to fair American odds, rounded to the nearest integer.
///
/// # Examples
/// ```
/// use odds_ev::pricing::probability_to_american;
/// assert_eq!(probability_to_american(0.6).unwrap(), -150);
/// assert_eq!(probability_to_american(0.4).unwrap(), 150);
/// ```
pub fn probability_to_american(probability: f64) -> Result<i32, PricingError> {
    let exact = probability_to_american_exact(probability)?;
    let rounded = exact.round();

    if !rounded.is_finite() || rounded.abs() > i32::MAX as f64 {
        return Err(PricingError::ProbabilityOutOfRange { probability });
    }

    Ok(rounded as i32)
}

/// Convert a probability to fair decimal odds.
pub fn probability_to_decimal(probability: f64) -> Result<f64, PricingError> {
    check_probability(probability)?;
    Ok(1.0 / probability)
}

/// Reject probabilities outside the open interval (0, 1).
pub(crate) fn check_probability(probability: f64) -> Result<(), PricingError> {
    if probability.is_finite() && probability > 0.0 && probability < 1.0 {
        Ok(())
    } else {
        Err(PricingError::ProbabilityOutOfRange { probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_probability_positive_and_negative() {
        assert!((american_to_implied_probability(150) - 0.4).abs() < 1e-12);
        assert!((american_to_implied_probability(-150) - 0.6).abs() < 1e-12);
        assert!((american_to_implied_probability(100) - 0.5).abs() < 1e-12);
        assert!((american_to_implied_probability(-100) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn payout_multiplier() {
        assert!((american_to_payout(120) - 1.2).abs() < 1e-12);
        assert!((american_to_payout(-200) - 0.5).abs() < 1e-12);
        assert!((american_to_decimal(-200) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn probability_to_american_rejects_bounds() {
        assert!(probability_to_american(0.0).is_err());
        assert!(probability_to_american(1.0).is_err());
        assert!(probability_to_american(f64::NAN).is_err());
        assert!(probability_to_decimal(-0.1).is_err());
    }

    #[test]
    fn even_money_maps_to_minus_100() {
        assert_eq!(probability_to_american(0.5).unwrap(), -100);
    }

    #[test]
    fn probability_round_trip() {
        let mut p = 0.001;
        while p < 1.0 {
            let odds = probability_to_american_exact(p).unwrap();
            let back = if odds > 0.0 {
                100.0 / (odds + 100.0)
            } else {
                -odds / (-odds + 100.0)
            };
            assert!((back - p).abs() < 1e-9, "p={p} back={back}");
            p += 0.001;
        }
    }

    #[test]
    fn odds_round_trip() {
        // +100 and -100 are the same price; p = 0.5 reports it as -100.
        for odds in (-2000..=-100).chain(101..=2000) {
            let p = american_to_implied_probability(odds);
            assert_eq!(probability_to_american(p).unwrap(), odds, "odds={odds}");
        }
    }
}
