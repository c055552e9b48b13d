// Tunable coefficients and the forgetting-curve model built on them.
// Formula indices follow the published FSRS weight layout: w[0..4] initial
// stability per rating, w[4..6] initial difficulty, w[6..8] difficulty step
// and mean reversion, w[8..11] recall stability, w[11..15] post-lapse
// stability, w[15..17] hard penalty / easy bonus, w[17..19] short-term step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::Rating;
use crate::fuzz;

/// Coefficients in the current weight vector.
pub const WEIGHT_COUNT: usize = 19;

/// Retention the stability unit is defined against: stability is the number
/// of days for recall probability to fall to this value.
const RETENTION_BASE: f64 = 0.9;

/// Floor applied everywhere stability is produced, keeping the forgetting
/// curve's division well-defined even under adversarial weight vectors.
const MIN_STABILITY: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("weight vector has {0} coefficients, expected 17 or 19")]
    WeightCount(usize),
    #[error("requested retention {0} must lie in (0, 1)")]
    Retention(f64),
    #[error("maximum interval {0} must be positive")]
    MaximumInterval(f64),
}

/// Ordered model coefficients. The two trailing short-term coefficients were
/// added in a later model revision; 17-length vectors from before that
/// revision are accepted and zero-fill them, which leaves the short-term
/// step a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(pub [f64; WEIGHT_COUNT]);

impl Weights {
    pub fn from_slice(w: &[f64]) -> Result<Weights, ParameterError> {
        let mut full = [0.0; WEIGHT_COUNT];
        match w.len() {
            WEIGHT_COUNT => full.copy_from_slice(w),
            17 => full[..17].copy_from_slice(w),
            n => return Err(ParameterError::WeightCount(n)),
        }
        Ok(Weights(full))
    }
}

impl Default for Weights {
    fn default() -> Weights {
        Weights([
            0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192,
            1.01925, 1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
        ])
    }
}

impl std::ops::Index<usize> for Weights {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Immutable configuration for a scheduling session.
///
/// `decay` and `factor` satisfy `factor = 0.9^(1/decay) - 1`, so that a card
/// reviewed exactly at its stability has retrievability 0.9 and
/// `request_retention` alone tunes how far out intervals land.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Target recall probability at the scheduled due date, in (0, 1).
    pub request_retention: f64,
    /// Hard cap on any scheduled interval, in days.
    pub maximum_interval: f64,
    pub weights: Weights,
    pub decay: f64,
    pub factor: f64,
    /// Model sub-day learning steps; when false, every rating schedules at
    /// day granularity.
    pub enable_short_term: bool,
    pub enable_fuzz: bool,
}

impl Default for Parameters {
    fn default() -> Parameters {
        let decay = -0.5;
        Parameters {
            request_retention: 0.9,
            maximum_interval: 36500.0,
            weights: Weights::default(),
            decay,
            factor: RETENTION_BASE.powf(1.0 / decay) - 1.0,
            enable_short_term: true,
            enable_fuzz: false,
        }
    }
}

impl Parameters {
    /// Checks the configuration invariants. Weight-vector length is enforced
    /// by construction in [`Weights::from_slice`].
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.request_retention > 0.0 && self.request_retention < 1.0) {
            return Err(ParameterError::Retention(self.request_retention));
        }
        if self.maximum_interval <= 0.0 {
            return Err(ParameterError::MaximumInterval(self.maximum_interval));
        }
        Ok(())
    }

    /// Probability of recall after `elapsed_days` at the given stability.
    /// 1.0 at zero elapsed time; defined for stability > 0.
    pub fn forgetting_curve(&self, elapsed_days: f64, stability: f64) -> f64 {
        (1.0 + self.factor * elapsed_days / stability).powf(self.decay)
    }

    /// Stability after the first-ever rating, straight from the weight
    /// table, floored at 0.1.
    pub fn init_stability(&self, rating: Rating) -> f64 {
        self.weights[rating.index()].max(MIN_STABILITY)
    }

    pub fn init_difficulty(&self, rating: Rating) -> f64 {
        let r = f64::from(rating);
        constrain_difficulty(self.weights[4] - f64::exp(self.weights[5] * (r - 1.0)) + 1.0)
    }

    /// Linear difficulty step, mean-reverted toward the Easy-rating initial
    /// difficulty, clamped to [1, 10].
    pub fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let r = f64::from(rating);
        let next = difficulty - self.weights[6] * (r - 3.0);
        constrain_difficulty(self.mean_reversion(self.init_difficulty(Rating::Easy), next))
    }

    fn mean_reversion(&self, init: f64, current: f64) -> f64 {
        self.weights[7] * init + (1.0 - self.weights[7]) * current
    }

    /// Stability after a successful recall. Growth is largest when the card
    /// was nearly forgotten, attenuated for Hard, boosted for Easy.
    pub fn next_recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        let hard_penalty = if rating == Rating::Hard {
            self.weights[15]
        } else {
            1.0
        };
        let easy_bonus = if rating == Rating::Easy {
            self.weights[16]
        } else {
            1.0
        };
        let next = stability
            * (1.0
                + f64::exp(self.weights[8])
                    * (11.0 - difficulty)
                    * stability.powf(-self.weights[9])
                    * (f64::exp((1.0 - retrievability) * self.weights[10]) - 1.0)
                    * hard_penalty
                    * easy_bonus);
        next.max(MIN_STABILITY)
    }

    /// Stability after a lapse. Always lands below the pre-lapse stability
    /// for sane weight vectors.
    pub fn next_forget_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
    ) -> f64 {
        let next = self.weights[11]
            * difficulty.powf(-self.weights[12])
            * ((stability + 1.0).powf(self.weights[13]) - 1.0)
            * f64::exp((1.0 - retrievability) * self.weights[14]);
        next.max(MIN_STABILITY)
    }

    /// Stability step for sub-day learning transitions, where the full
    /// recall/forget model does not apply.
    pub fn short_term_stability(&self, stability: f64, rating: Rating) -> f64 {
        let r = f64::from(rating);
        (stability * f64::exp(self.weights[17] * ((r - 3.0) + self.weights[18])))
            .max(MIN_STABILITY)
    }

    /// Maps stability to a scheduled interval in whole days, clamped to
    /// [1, maximum_interval] and jittered when fuzz is enabled. The single
    /// point where `request_retention` shapes the schedule.
    pub fn next_interval(&self, stability: f64, elapsed_days: f64, seed: &str) -> f64 {
        let interval =
            stability / self.factor * (self.request_retention.powf(1.0 / self.decay) - 1.0);
        self.apply_fuzz(
            interval.round().min(self.maximum_interval).max(1.0),
            elapsed_days,
            seed,
        )
    }

    /// Perturbs an interval within the band computed by
    /// [`fuzz::fuzz_range`]. Identity when fuzz is off or the interval is
    /// too short to spread.
    pub fn apply_fuzz(&self, interval: f64, elapsed_days: f64, seed: &str) -> f64 {
        if !self.enable_fuzz || interval < 2.5 {
            return interval;
        }
        let mut generator = fuzz::Alea::new(seed);
        let fuzz_factor = generator.double();
        let (min_ivl, max_ivl) = fuzz::fuzz_range(interval, elapsed_days, self.maximum_interval);
        tracing::trace!(interval, min_ivl, max_ivl, "fuzzing interval");
        (fuzz_factor * (max_ivl - min_ivl + 1.0)).floor() + min_ivl
    }
}

fn constrain_difficulty(d: f64) -> f64 {
    d.clamp(1.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factor_matches_decay() {
        let p = Parameters::default();
        assert!((p.factor - (0.9f64.powf(1.0 / p.decay) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn retrievability_at_zero() {
        let p = Parameters::default();
        assert!((p.forgetting_curve(0.0, 1.0) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn retrievability_at_stability_is_retention_base() {
        let p = Parameters::default();
        assert!((p.forgetting_curve(5.0, 5.0) - 0.9).abs() < 1e-10);
    }

    #[test]
    fn interval_equals_stability_at_default_retention() {
        // With request_retention equal to the retention base, the scheduled
        // interval is the stability itself.
        let p = Parameters::default();
        let ivl = p.next_interval(5.0, 0.0, "");
        assert!((ivl - 5.0).abs() < 1e-10);
    }

    #[test]
    fn interval_clamped_to_bounds() {
        let p = Parameters {
            maximum_interval: 100.0,
            ..Parameters::default()
        };
        assert_eq!(p.next_interval(0.01, 0.0, ""), 1.0);
        assert_eq!(p.next_interval(1e6, 0.0, ""), 100.0);
    }

    #[test]
    fn init_stability_floored() {
        let mut w = Weights::default();
        w.0[0] = -3.0;
        let p = Parameters {
            weights: w,
            ..Parameters::default()
        };
        assert_eq!(p.init_stability(Rating::Again), 0.1);
    }

    #[test]
    fn init_stability_increases_with_rating() {
        let p = Parameters::default();
        assert!(p.init_stability(Rating::Again) < p.init_stability(Rating::Hard));
        assert!(p.init_stability(Rating::Hard) < p.init_stability(Rating::Good));
        assert!(p.init_stability(Rating::Good) < p.init_stability(Rating::Easy));
    }

    #[test]
    fn init_difficulty_decreases_with_rating() {
        let p = Parameters::default();
        assert!(p.init_difficulty(Rating::Again) > p.init_difficulty(Rating::Hard));
        assert!(p.init_difficulty(Rating::Hard) > p.init_difficulty(Rating::Good));
        assert!(p.init_difficulty(Rating::Good) > p.init_difficulty(Rating::Easy));
    }

    #[test]
    fn difficulty_clamped_under_repeated_ratings() {
        let p = Parameters::default();

        let mut d = p.init_difficulty(Rating::Again);
        for _ in 0..100 {
            d = p.next_difficulty(d, Rating::Again);
        }
        assert!((1.0..=10.0).contains(&d));

        let mut d = p.init_difficulty(Rating::Easy);
        for _ in 0..100 {
            d = p.next_difficulty(d, Rating::Easy);
        }
        assert!((1.0..=10.0).contains(&d));
    }

    #[test]
    fn recall_stability_grows() {
        let p = Parameters::default();
        let s = 3.0;
        let r = p.forgetting_curve(3.0, s);
        assert!(p.next_recall_stability(5.0, s, r, Rating::Good) > s);
    }

    #[test]
    fn forget_stability_shrinks() {
        let p = Parameters::default();
        let s = 3.0;
        let r = p.forgetting_curve(3.0, s);
        assert!(p.next_forget_stability(5.0, s, r) < s);
    }

    #[test]
    fn hard_penalty_and_easy_bonus() {
        let p = Parameters::default();
        let s = 10.0;
        let r = p.forgetting_curve(10.0, s);
        let hard = p.next_recall_stability(5.0, s, r, Rating::Hard);
        let good = p.next_recall_stability(5.0, s, r, Rating::Good);
        let easy = p.next_recall_stability(5.0, s, r, Rating::Easy);
        assert!(hard < good);
        assert!(good < easy);
    }

    #[test]
    fn short_term_stability_direction() {
        let p = Parameters::default();
        assert!(p.short_term_stability(2.0, Rating::Again) < 2.0);
        assert!(p.short_term_stability(2.0, Rating::Easy) > 2.0);
    }

    #[test]
    fn weights_from_slice_lengths() {
        assert!(Weights::from_slice(&[0.5; 19]).is_ok());

        let padded = Weights::from_slice(&[0.5; 17]).unwrap();
        assert_eq!(padded[16], 0.5);
        assert_eq!(padded[17], 0.0);
        assert_eq!(padded[18], 0.0);

        assert_eq!(
            Weights::from_slice(&[0.5; 18]),
            Err(ParameterError::WeightCount(18))
        );
    }

    #[test]
    fn short_term_step_is_noop_for_padded_weights() {
        let p = Parameters {
            weights: Weights::from_slice(&[0.5; 17]).unwrap(),
            ..Parameters::default()
        };
        assert_eq!(p.short_term_stability(4.4145, Rating::Good), 4.4145);
    }

    #[test]
    fn stability_floored_under_degenerate_weights() {
        let p = Parameters {
            weights: Weights::from_slice(&[0.0; 19]).unwrap(),
            ..Parameters::default()
        };
        assert_eq!(p.init_stability(Rating::Again), 0.1);
        assert_eq!(p.next_forget_stability(5.0, 3.0, 0.9), 0.1);
        assert_eq!(p.short_term_stability(0.0, Rating::Good), 0.1);
    }

    #[test]
    fn validate_rejects_bad_retention() {
        for retention in [0.0, 1.0, -0.5, 1.5] {
            let p = Parameters {
                request_retention: retention,
                ..Parameters::default()
            };
            assert_eq!(p.validate(), Err(ParameterError::Retention(retention)));
        }
    }

    #[test]
    fn validate_rejects_bad_maximum_interval() {
        let p = Parameters {
            maximum_interval: 0.0,
            ..Parameters::default()
        };
        assert_eq!(p.validate(), Err(ParameterError::MaximumInterval(0.0)));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert_eq!(Parameters::default().validate(), Ok(()));
    }
}
