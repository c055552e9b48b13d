// One scheduling session per review event: derive the working copy of the
// card, then lazily compute the candidate outcome for each rating. The four
// branches are memoized because "preview all four, then commit one" is the
// dominant calling pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::card::{Card, Rating, ReviewLog, SchedulingInfo, State};
use crate::params::{ParameterError, Parameters};
use crate::{longterm, shortterm};

/// Candidate outcomes for all four ratings of one scheduling event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub again: SchedulingInfo,
    pub hard: SchedulingInfo,
    pub good: SchedulingInfo,
    pub easy: SchedulingInfo,
}

impl Preview {
    pub fn get(&self, rating: Rating) -> &SchedulingInfo {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

/// The scheduler: validated parameters plus the entry points for one review
/// event. Stateless between calls; safe to share across cards.
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Result<Scheduler, ParameterError> {
        params.validate()?;
        Ok(Scheduler { params })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Computes the candidate next card and log entry for every rating,
    /// without committing to any of them.
    pub fn preview(&self, card: &Card, now: DateTime<Utc>) -> Preview {
        let mut session = Session::new(&self.params, card, now);
        Preview {
            again: session.schedule(Rating::Again),
            hard: session.schedule(Rating::Hard),
            good: session.schedule(Rating::Good),
            easy: session.schedule(Rating::Easy),
        }
    }

    /// Computes the outcome for the rating the learner chose. The returned
    /// card is what the caller persists; the input card is untouched.
    pub fn review(&self, card: &Card, now: DateTime<Utc>, rating: Rating) -> SchedulingInfo {
        Session::new(&self.params, card, now).schedule(rating)
    }

    /// Estimated probability of recall at `now`. Zero for a card that has
    /// never been reviewed.
    pub fn retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
        if card.state == State::New {
            return 0.0;
        }
        let Some(last_review) = card.last_review else {
            return 0.0;
        };
        let elapsed = ((now - last_review).num_seconds() as f64 / 86_400.0).max(0.0);
        self.params.forgetting_curve(elapsed, card.stability)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Strategy {
    ShortTerm,
    LongTerm,
}

/// Mutable state for a single scheduling event.
pub(crate) struct Session<'a> {
    pub(crate) params: &'a Parameters,
    /// The card as persisted before this review.
    pub(crate) last: Card,
    /// Working copy: elapsed days and rep count already advanced to `now`.
    pub(crate) current: Card,
    pub(crate) now: DateTime<Utc>,
    seed: String,
    strategy: Strategy,
    next: [Option<SchedulingInfo>; 4],
}

impl<'a> Session<'a> {
    fn new(params: &'a Parameters, card: &Card, now: DateTime<Utc>) -> Session<'a> {
        let elapsed_days = match (card.state, card.last_review) {
            (State::New, _) | (_, None) => 0,
            (_, Some(last_review)) => {
                ((now - last_review).num_seconds() as f64 / 86_400.0).floor().max(0.0) as u64
            }
        };

        let mut current = card.clone();
        current.last_review = Some(now);
        current.elapsed_days = elapsed_days;
        current.reps += 1;

        // Seed ties the fuzz stream to this exact event: same card, instant
        // and history always jitter the same way.
        let seed = format!(
            "{}_{}_{:.6}",
            now.timestamp(),
            current.reps,
            current.difficulty * current.stability
        );

        let strategy = if params.enable_short_term {
            Strategy::ShortTerm
        } else {
            Strategy::LongTerm
        };

        debug!(state = ?card.state, elapsed_days, seed = %seed, "scheduling event");

        Session {
            params,
            last: card.clone(),
            current,
            now,
            seed,
            strategy,
            next: [None, None, None, None],
        }
    }

    pub(crate) fn schedule(&mut self, rating: Rating) -> SchedulingInfo {
        if let Some(info) = &self.next[rating.index()] {
            return info.clone();
        }
        match (self.strategy, self.last.state) {
            (Strategy::ShortTerm, State::New) => shortterm::on_new(self, rating),
            (Strategy::ShortTerm, State::Learning | State::Relearning) => {
                shortterm::on_learning(self, rating)
            }
            (Strategy::ShortTerm, State::Review) => shortterm::on_review(self, rating),
            (Strategy::LongTerm, State::New) => longterm::on_new(self, rating),
            (Strategy::LongTerm, State::Learning | State::Relearning | State::Review) => {
                longterm::on_review(self, rating)
            }
        }
    }

    /// Interval for the given stability, fuzzed under this session's seed.
    pub(crate) fn next_interval(&self, stability: f64, elapsed_days: f64) -> f64 {
        self.params.next_interval(stability, elapsed_days, &self.seed)
    }

    /// Log entry for this event; day counts describe the card going in.
    pub(crate) fn build_log(&self, rating: Rating) -> ReviewLog {
        ReviewLog {
            rating,
            state: self.current.state,
            elapsed_days: self.current.elapsed_days,
            scheduled_days: self.current.scheduled_days,
            reviewed_at: self.now,
        }
    }

    pub(crate) fn remember(&mut self, rating: Rating, info: SchedulingInfo) -> SchedulingInfo {
        self.next[rating.index()] = Some(info.clone());
        info
    }
}
