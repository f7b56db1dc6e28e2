use chrono::{DateTime, Utc};

use crate::adaptive::config::MasteryModelConfig;
use crate::constants::MILLIS_PER_DAY;

/// Fractional days between two instants; negative when `now` precedes `since`.
pub fn days_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Forgetting curve: `score * (1 - rate)^min(days, cap)` once the grace
/// period has passed. Scores with no prior attempt are returned unchanged.
pub fn apply_forgetting(
    score: f64,
    last_attempt_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &MasteryModelConfig,
) -> f64 {
    let Some(last) = last_attempt_at else {
        return score;
    };
    let days = days_between(last, now);
    if days <= config.decay_grace_days {
        return score;
    }
    let effective_days = days.min(config.max_decay_days);
    score * (1.0 - config.daily_decay_rate).powf(effective_days)
}
