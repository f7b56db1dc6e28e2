use chrono::{DateTime, Duration, TimeZone, Utc};

use adaptive_practice::adaptive::taxonomy::Taxonomy;
use adaptive_practice::adaptive::types::{
    AttemptRecord, AttemptTiming, CandidateProblem, MasteryRecord, RecentAttempts, StudentState,
    Topic,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 6, 18, 30, 0).unwrap()
}

pub fn attempt(id: &str, topic: Topic, ok: bool, difficulty: f64, minute: i64) -> AttemptRecord {
    AttemptRecord {
        question_id: id.to_string(),
        topic,
        is_correct: ok,
        difficulty_score: difficulty,
        timestamp: t0() + Duration::minutes(minute),
    }
}

pub fn on_time() -> AttemptTiming {
    AttemptTiming {
        time_spent_secs: 90.0,
        estimated_time_secs: 90.0,
    }
}

pub fn record(score: f64) -> MasteryRecord {
    MasteryRecord {
        score,
        last_attempt_at: Some(t0()),
        total_solved: 0,
    }
}

/// State with the given mastery scores and a most-recent-first history.
pub fn seed_state(scores: &[(Topic, f64)], history: Vec<AttemptRecord>) -> StudentState {
    let mut state = StudentState::new("learner-1");
    for &(topic, score) in scores {
        state.topic_mastery.insert(topic, record(score));
    }
    state.recent_attempts = RecentAttempts::most_recent_first(history);
    state
}

/// Every taxonomy topic at the same score.
pub fn uniform_scores(score: f64) -> Vec<(Topic, f64)> {
    Taxonomy::default()
        .topics()
        .iter()
        .map(|&topic| (topic, score))
        .collect()
}

/// `per_topic` problems per taxonomy topic, difficulties cycling 0.05..=1.0.
pub fn seed_pool(per_topic: usize) -> Vec<CandidateProblem> {
    let mut pool = Vec::new();
    for &topic in Taxonomy::default().topics() {
        for idx in 0..per_topic {
            pool.push(CandidateProblem {
                id: format!("{}-{idx}", topic.as_str().to_ascii_lowercase()),
                topic,
                difficulty_score: ((idx % 20) + 1) as f64 * 0.05,
            });
        }
    }
    pool
}
