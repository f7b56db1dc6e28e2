use crate::adaptive::config::MasteryModelConfig;
use crate::adaptive::types::*;
use crate::constants::SCORE_DECIMALS;

use super::decay::apply_forgetting;

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Rounds to the stored precision so repeated replays stay bit-stable.
pub fn round_score(score: f64) -> f64 {
    let scale = 10_f64.powi(SCORE_DECIMALS);
    (score * scale).round() / scale
}

/// New mastery score after one attempt.
///
/// `consecutive_failures` is the failure streak on this topic including the
/// current attempt. Inputs are sanitized rather than rejected, so the result
/// is always in `[0, 1]`.
pub fn update_mastery(
    current: &MasteryRecord,
    outcome: &AttemptOutcome,
    consecutive_failures: u32,
    config: &MasteryModelConfig,
) -> f64 {
    let difficulty = finite_or(outcome.difficulty_score, 0.0).clamp(0.0, 1.0);
    let time_spent = finite_or(outcome.time_spent_secs, 0.0).max(0.0);
    let estimated = finite_or(outcome.estimated_time_secs, 0.0).max(0.0);

    let mut score = finite_or(current.score, 0.0).clamp(0.0, 1.0);
    score = apply_forgetting(score, current.last_attempt_at, outcome.answered_at, config);

    if outcome.is_correct {
        let time_ratio = (estimated / time_spent.max(config.min_time_spent_secs))
            .clamp(config.time_ratio_min, config.time_ratio_max);
        let performance = (difficulty * time_ratio).min(1.0);
        if performance > score {
            score += (performance - score) * config.learning_rate;
        } else {
            score += config.consolidation_increment;
        }
    } else if difficulty > score {
        score -= config.expected_failure_penalty;
    } else {
        // 低于自身水平的题目失败：差距越大惩罚越重
        let gap = score - difficulty;
        score -= config.gap_failure_base_penalty + gap * config.gap_failure_scale;
    }

    if !outcome.is_correct && consecutive_failures >= config.crisis_failure_streak {
        score *= config.crisis_slash_factor;
    }

    round_score(score.clamp(0.0, 1.0))
}

/// Consecutive most-recent failures on `topic` within the first `window`
/// attempts. Attempts on other topics are skipped; a success ends the run.
pub fn failure_streak(history: &RecentAttempts, topic: Topic, window: usize) -> u32 {
    history
        .window(window)
        .iter()
        .filter(|a| a.topic == topic)
        .take_while(|a| !a.is_correct)
        .count() as u32
}

/// Applies one attempt to the stored record, creating it on first contact.
pub fn apply_attempt(
    current: Option<&MasteryRecord>,
    outcome: &AttemptOutcome,
    consecutive_failures: u32,
    config: &MasteryModelConfig,
) -> MasteryRecord {
    let base = current.cloned().unwrap_or_default();
    let score = update_mastery(&base, outcome, consecutive_failures, config);
    let total_solved = if outcome.is_correct {
        base.total_solved.saturating_add(1)
    } else {
        base.total_solved
    };

    MasteryRecord {
        score,
        last_attempt_at: Some(outcome.answered_at),
        total_solved,
    }
}
