//! # Game Mathematics
//!
//! Rounding helpers shared by generation, weapon rolls and the proximity
//! report.

use rand::Rng;

/// Rounds `value` to `decimals` places.
///
/// # Examples
///
/// ```
/// use cavecrawl::utils::round_to;
///
/// assert_eq!(round_to(1.23456, 2), 1.23);
/// assert_eq!(round_to(2.5, 0), 3.0);
/// ```
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds a non-negative fractional count to an integer, rounding up with
/// probability equal to the fractional part. A uniform draw is consumed
/// even for whole numbers.
pub fn stochastic_round<R: Rng + ?Sized>(value: f64, rng: &mut R) -> usize {
    let whole = value.floor();
    let fraction = value - whole;
    let roll: f64 = rng.gen();
    whole as usize + usize::from(roll < fraction)
}

/// Buckets a distance into whole steps of `step` for the proximity report:
/// `[1, 6)` reads as 5, `[6, 11)` as 10 and so on. Anything closer than one
/// cell reads as 0.
///
/// # Examples
///
/// ```
/// use cavecrawl::utils::distance_bucket;
///
/// assert_eq!(distance_bucket(7.2, 5), 10);
/// assert_eq!(distance_bucket(6.0, 5), 10);
/// assert_eq!(distance_bucket(5.9, 5), 5);
/// assert_eq!(distance_bucket(11.0, 5), 15);
/// ```
pub fn distance_bucket(distance: f64, step: u32) -> u32 {
    if step == 0 {
        return distance.ceil().max(0.0) as u32;
    }
    let step = f64::from(step);
    ((((distance - 1.0) / step).floor() + 1.0) * step).max(0.0) as u32
}
