use serde::{Deserialize, Serialize};

use crate::adaptive::config::{CalibratorConfig, CrisisConfig, EngineConfig};
use crate::adaptive::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryTier {
    Struggling,
    Consolidating,
    Advancing,
}

impl MasteryTier {
    pub fn from_score(score: f64, config: &CalibratorConfig) -> Self {
        if score < config.struggling_threshold {
            Self::Struggling
        } else if score < config.advancing_threshold {
            Self::Consolidating
        } else {
            Self::Advancing
        }
    }
}

fn sanitize_difficulty(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Asymmetric band around `target`, biased toward slightly harder items.
fn window_around(target: f64, config: &CalibratorConfig) -> DifficultyWindow {
    let min = (target - config.window_below).max(config.min_difficulty);
    let max = (target + config.window_above).min(config.max_difficulty).max(min);
    DifficultyWindow { min, max }
}

/// Target difficulty window for `topic` from its mastery tier and the last
/// attempt on it.
pub fn calibrate(state: &StudentState, topic: Topic, config: &EngineConfig) -> DifficultyWindow {
    let k = &config.calibrator;
    let mastery = state.mastery_score(topic);
    let last = state
        .recent_attempts
        .latest_on(topic, config.history_window);
    let last_diff = last
        .map(|a| sanitize_difficulty(a.difficulty_score))
        .unwrap_or(k.default_difficulty);

    let target = match MasteryTier::from_score(mastery, k) {
        MasteryTier::Struggling => (last_diff - k.struggling_step_down).max(k.min_difficulty),
        MasteryTier::Consolidating => {
            if last.is_some_and(|a| a.is_correct) {
                (last_diff + k.consolidating_step_up).min(k.max_difficulty)
            } else {
                last_diff
            }
        }
        MasteryTier::Advancing => (last_diff + k.advancing_step_up).min(k.max_difficulty),
    };

    let window = window_around(target, k);
    tracing::debug!(
        topic = %topic,
        mastery,
        last_diff,
        target,
        min = window.min,
        max = window.max,
        "Calibrated difficulty window"
    );
    window
}

/// Steep, unconditional drop used while the learner is in crisis.
pub fn crisis_window(last_fail_difficulty: f64, config: &CrisisConfig) -> DifficultyWindow {
    let d = sanitize_difficulty(last_fail_difficulty);
    DifficultyWindow {
        min: (d - config.min_drop).max(config.min_floor),
        max: (d - config.max_drop).max(config.max_floor),
    }
}

pub fn new_student_window(config: &CalibratorConfig) -> DifficultyWindow {
    DifficultyWindow {
        min: config.new_student_min,
        max: config.new_student_max,
    }
}
