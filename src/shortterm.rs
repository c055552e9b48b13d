// Strategy with sub-day learning steps: fresh and lapsed material cycles
// through fixed minute offsets before graduating to day-granularity review.

use chrono::Duration;

use crate::card::{Rating, SchedulingInfo, State};
use crate::scheduler::Session;

pub(crate) fn on_new(s: &mut Session, rating: Rating) -> SchedulingInfo {
    let mut next = s.current.clone();
    next.difficulty = s.params.init_difficulty(rating);
    next.stability = s.params.init_stability(rating);

    match rating {
        Rating::Again => {
            next.scheduled_days = 0;
            next.due = s.now + Duration::minutes(1);
            next.state = State::Learning;
        }
        Rating::Hard => {
            next.scheduled_days = 0;
            next.due = s.now + Duration::minutes(5);
            next.state = State::Learning;
        }
        Rating::Good => {
            next.scheduled_days = 0;
            next.due = s.now + Duration::minutes(10);
            next.state = State::Learning;
        }
        Rating::Easy => {
            let easy_interval = s.next_interval(next.stability, next.elapsed_days as f64);
            next.scheduled_days = easy_interval as u64;
            next.due = s.now + Duration::days(easy_interval as i64);
            next.state = State::Review;
        }
    }

    let info = SchedulingInfo {
        card: next,
        review_log: s.build_log(rating),
    };
    s.remember(rating, info)
}

pub(crate) fn on_learning(s: &mut Session, rating: Rating) -> SchedulingInfo {
    let interval = s.current.elapsed_days as f64;
    let mut next = s.current.clone();
    next.difficulty = s.params.next_difficulty(s.last.difficulty, rating);
    next.stability = s.params.short_term_stability(s.last.stability, rating);

    match rating {
        Rating::Again => {
            next.scheduled_days = 0;
            next.due = s.now + Duration::minutes(5);
            next.state = s.last.state;
        }
        Rating::Hard => {
            next.scheduled_days = 0;
            next.due = s.now + Duration::minutes(10);
            next.state = s.last.state;
        }
        Rating::Good => {
            let good_interval = s.next_interval(next.stability, interval);
            next.scheduled_days = good_interval as u64;
            next.due = s.now + Duration::days(good_interval as i64);
            next.state = State::Review;
        }
        Rating::Easy => {
            // Easy must never come due before Good would have.
            let good_stability = s.params.short_term_stability(s.last.stability, Rating::Good);
            let good_interval = s.next_interval(good_stability, interval);
            let easy_interval = s
                .next_interval(next.stability, interval)
                .max(good_interval + 1.0);
            next.scheduled_days = easy_interval as u64;
            next.due = s.now + Duration::days(easy_interval as i64);
            next.state = State::Review;
        }
    }

    let info = SchedulingInfo {
        card: next,
        review_log: s.build_log(rating),
    };
    s.remember(rating, info)
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
    again.stability = s
        .params
        .next_forget_stability(difficulty, stability, retrievability);
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

    let hard_interval = s.next_interval(hard.stability, interval);
    let good_interval = s.next_interval(good.stability, interval);
    let hard_interval = hard_interval.min(good_interval);
    let good_interval = good_interval.max(hard_interval + 1.0);
    let easy_interval = s
        .next_interval(easy.stability, interval)
        .max(good_interval + 1.0);

    again.scheduled_days = 0;
    again.due = s.now + Duration::minutes(5);
    again.state = State::Relearning;
    again.lapses += 1;

    hard.scheduled_days = hard_interval as u64;
    hard.due = s.now + Duration::days(hard_interval as i64);
    hard.state = State::Review;

    good.scheduled_days = good_interval as u64;
    good.due = s.now + Duration::days(good_interval as i64);
    good.state = State::Review;

    easy.scheduled_days = easy_interval as u64;
    easy.due = s.now + Duration::days(easy_interval as i64);
    easy.state = State::Review;

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
