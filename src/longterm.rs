// Day-granularity strategy for once-daily review cadences: no learning
// steps, every rating schedules a whole-day interval and lands in Review.

use chrono::Duration;

use crate::card::{Card, Rating, SchedulingInfo, State};
use crate::scheduler::Session;

pub(crate) fn on_new(s: &mut Session, rating: Rating) -> SchedulingInfo {
    s.current.scheduled_days = 0;
    s.current.elapsed_days = 0;

    let mut again = s.current.clone();
    let mut hard = s.current.clone();
    let mut good = s.current.clone();
    let mut easy = s.current.clone();

    again.difficulty = s.params.init_difficulty(Rating::Again);
    again.stability = s.params.init_stability(Rating::Again);
    hard.difficulty = s.params.init_difficulty(Rating::Hard);
    hard.stability = s.params.init_stability(Rating::Hard);
    good.difficulty = s.params.init_difficulty(Rating::Good);
    good.stability = s.params.init_stability(Rating::Good);
    easy.difficulty = s.params.init_difficulty(Rating::Easy);
    easy.stability = s.params.init_stability(Rating::Easy);

    apply_intervals(s, &mut again, &mut hard, &mut good, &mut easy, 0.0);

    finish(s, rating, again, hard, good, easy)
}

pub(crate) fn on_review(s: &mut Session, rating: Rating) -> SchedulingInfo {
    let interval = s.current.elapsed_days as f64;
    let difficulty = s.last.difficulty;
    let stability = s.last.stability;
    let retrievability = s.params.forgetting_curve(interval, stability);

    let mut again = s.current.clone();
    let mut hard = s.current.clone();
    let mut good = s.current.clone();
    let mut easy = s.current.clone();

    again.difficulty = s.params.next_difficulty(difficulty, Rating::Again);
    // A lapse can only shrink stability at day granularity.
    again.stability = stability.min(s.params.next_forget_stability(
        difficulty,
        stability,
        retrievability,
    ));
    hard.difficulty = s.params.next_difficulty(difficulty, Rating::Hard);
    hard.stability = s
        .params
        .next_recall_stability(difficulty, stability, retrievability, Rating::Hard);
    good.difficulty = s.params.next_difficulty(difficulty, Rating::Good);
    good.stability = s
        .params
        .next_recall_stability(difficulty, stability, retrievability, Rating::Good);
    easy.difficulty = s.params.next_difficulty(difficulty, Rating::Easy);
    easy.stability = s
        .params
        .next_recall_stability(difficulty, stability, retrievability, Rating::Easy);

    apply_intervals(s, &mut again, &mut hard, &mut good, &mut easy, interval);
    again.lapses += 1;

    finish(s, rating, again, hard, good, easy)
}

/// Computes all four intervals, forces the strict ordering
/// again <= hard < good < easy, and schedules each branch into Review.
fn apply_intervals(
    s: &Session,
    again: &mut Card,
    hard: &mut Card,
    good: &mut Card,
    easy: &mut Card,
    elapsed_days: f64,
) {
    let again_interval = s.next_interval(again.stability, elapsed_days);
    let hard_interval = s.next_interval(hard.stability, elapsed_days);
    let good_interval = s.next_interval(good.stability, elapsed_days);
    let easy_interval = s.next_interval(easy.stability, elapsed_days);

    let again_interval = again_interval.min(hard_interval);
    let hard_interval = hard_interval.max(again_interval + 1.0);
    let good_interval = good_interval.max(hard_interval + 1.0);
    let easy_interval = easy_interval.max(good_interval + 1.0);

    for (card, interval) in [
        (again, again_interval),
        (hard, hard_interval),
        (good, good_interval),
        (easy, easy_interval),
    ] {
        card.scheduled_days = interval as u64;
        card.due = s.now + Duration::days(interval as i64);
        card.state = State::Review;
    }
}

fn finish(
    s: &mut Session,
    rating: Rating,
    again: Card,
    hard: Card,
    good: Card,
    easy: Card,
) -> SchedulingInfo {
    let again = SchedulingInfo {
        card: again,
        review_log: s.build_log(Rating::Again),
    };
    let hard = SchedulingInfo {
        card: hard,
        review_log: s.build_log(Rating::Hard),
    };
    let good = SchedulingInfo {
        card: good,
        review_log: s.build_log(Rating::Good),
    };
    let easy = SchedulingInfo {
        card: easy,
        review_log: s.build_log(Rating::Easy),
    };

    let chosen = match rating {
        Rating::Again => again.clone(),
        Rating::Hard => hard.clone(),
        Rating::Good => good.clone(),
        Rating::Easy => easy.clone(),
    };
    s.remember(Rating::Again, again);
    s.remember(Rating::Hard, hard);
    s.remember(Rating::Good, good);
    s.remember(Rating::Easy, easy);

    chosen
}
