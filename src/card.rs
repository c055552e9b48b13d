use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a card.
///
/// `Learning` is only reachable from `New`, `Relearning` only from `Review`
/// via an Again rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    New,
    Learning,
    Review,
    Relearning,
}

/// Learner's self-graded recall outcome, ordinal 1-4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Parses a raw rating ordinal. Anything outside 1-4 is a caller bug
    /// and is rejected here, before any scheduling state is derived.
    pub fn from_u8(n: u8) -> Option<Rating> {
        match n {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

impl From<Rating> for f64 {
    fn from(r: Rating) -> f64 {
        r as u8 as f64
    }
}

/// Memory state of a single card. Mutated by copy at each scheduling step;
/// the scheduler never writes through to the caller's card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// When the card is next due for review.
    pub due: DateTime<Utc>,
    /// Estimated days for recall probability to decay to ~90%.
    pub stability: f64,
    /// Per-card scalar in [1,10]; higher is harder to remember.
    pub difficulty: f64,
    /// Whole days since the previous review, fixed at session start.
    pub elapsed_days: u64,
    /// The interval chosen for the current due date.
    pub scheduled_days: u64,
    pub reps: u64,
    pub lapses: u64,
    pub state: State,
    /// `None` until the card has been reviewed once.
    pub last_review: Option<DateTime<Utc>>,
}

impl Card {
    /// A fresh card: never reviewed, due immediately.
    pub fn new(now: DateTime<Utc>) -> Card {
        Card {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            state: State::New,
            last_review: None,
        }
    }
}

/// Immutable record of one committed review. Append-only from the caller's
/// point of view; `state` and the day counts describe the card as it was
/// going into the review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub rating: Rating,
    pub state: State,
    pub elapsed_days: u64,
    pub scheduled_days: u64,
    pub reviewed_at: DateTime<Utc>,
}

/// One candidate outcome of a scheduling event: the card as it would be
/// after the rating, plus the matching log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingInfo {
    pub card: Card,
    pub review_log: ReviewLog,
}
