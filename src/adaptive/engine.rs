use std::collections::HashSet;

use crate::adaptive::analytics::{self, LearnerSummary};
use crate::adaptive::calibrator::{calibrate, crisis_window, new_student_window};
use crate::adaptive::config::EngineConfig;
use crate::adaptive::matcher::match_candidate;
use crate::adaptive::memory::mastery::{apply_attempt, failure_streak};
use crate::adaptive::monitoring;
use crate::adaptive::taxonomy::Taxonomy;
use crate::adaptive::topic_selector::select_topic_with_reason;
use crate::adaptive::types::*;
use crate::error::EngineError;

/// Stateless facade over the recommendation pipeline.
///
/// Holds only the tuning profile and taxonomy; every call reads a caller
/// supplied [`StudentState`] snapshot and returns values for the caller to
/// persist. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct AdaptiveEngine {
    config: EngineConfig,
    taxonomy: Taxonomy,
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            taxonomy: Taxonomy::default(),
        }
    }
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig, taxonomy: Taxonomy) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self { config, taxonomy })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn reload_config(&mut self, new_config: EngineConfig) -> Result<(), String> {
        new_config.validate()?;
        self.config = new_config;
        tracing::info!("Engine config reloaded");
        Ok(())
    }

    /// Next topic and difficulty band for the student.
    pub fn recommend(&self, state: &StudentState) -> QuestionRecommendation {
        let start = std::time::Instant::now();

        let selection = select_topic_with_reason(state, &self.taxonomy, &self.config);
        let window = match &selection.reason {
            SelectionReason::NewStudent => new_student_window(&self.config.calibrator),
            SelectionReason::Crisis { difficulty, .. } => {
                crisis_window(*difficulty, &self.config.crisis)
            }
            _ => calibrate(state, selection.topic, &self.config),
        };

        let recommendation = QuestionRecommendation {
            target_topic: selection.topic,
            min_difficulty: window.min,
            max_difficulty: window.max,
            reason: selection.reason.describe(),
        };

        let violations = monitoring::check_recommendation(&recommendation, &self.taxonomy);
        if !violations.is_empty() {
            tracing::warn!(
                student_id = %state.student_id,
                count = violations.len(),
                ?violations,
                "Recommendation invariant violations"
            );
        }

        tracing::debug!(
            student_id = %state.student_id,
            topic = %recommendation.target_topic,
            min = recommendation.min_difficulty,
            max = recommendation.max_difficulty,
            reason = ?selection.reason,
            latency_us = start.elapsed().as_micros() as u64,
            "Recommendation computed"
        );
        recommendation
    }

    /// Best unseen candidate for a recommendation, if any.
    pub fn pick_question<'a>(
        &self,
        candidates: &'a [CandidateProblem],
        recommendation: &QuestionRecommendation,
        exclude_ids: &HashSet<String>,
    ) -> Option<&'a CandidateProblem> {
        match_candidate(candidates, recommendation, exclude_ids)
    }

    /// Recommends and matches in one step, excluding problems already in the
    /// student's recent history.
    pub fn next_question<'a>(
        &self,
        state: &StudentState,
        candidates: &'a [CandidateProblem],
    ) -> (QuestionRecommendation, Option<&'a CandidateProblem>) {
        let recommendation = self.recommend(state);
        let seen = state.recent_attempts.question_ids();
        let picked = self.pick_question(candidates, &recommendation, &seen);
        (recommendation, picked)
    }

    /// Mastery delta for an answered attempt.
    ///
    /// `state` is the snapshot from before the attempt; the attempt itself
    /// is not expected in `state.recent_attempts`.
    pub fn record_attempt(
        &self,
        state: &StudentState,
        attempt: &AttemptRecord,
        timing: AttemptTiming,
    ) -> Result<MasteryUpdate, EngineError> {
        if !self.taxonomy.contains(attempt.topic) {
            return Err(EngineError::NotRecommendable(attempt.topic));
        }

        let consecutive_failures = if attempt.is_correct {
            0
        } else {
            failure_streak(
                &state.recent_attempts,
                attempt.topic,
                self.config.history_window,
            ) + 1
        };

        let outcome = AttemptOutcome {
            difficulty_score: attempt.difficulty_score,
            is_correct: attempt.is_correct,
            time_spent_secs: timing.time_spent_secs,
            estimated_time_secs: timing.estimated_time_secs,
            answered_at: attempt.timestamp,
        };
        let previous = state.mastery(attempt.topic);
        let previous_score = previous.map(|r| r.score).unwrap_or(0.0);
        let record = apply_attempt(
            previous,
            &outcome,
            consecutive_failures,
            &self.config.mastery,
        );

        let violations = monitoring::check_mastery_record(&record);
        if !violations.is_empty() {
            tracing::warn!(
                student_id = %state.student_id,
                topic = %attempt.topic,
                ?violations,
                "Mastery invariant violations"
            );
        }

        tracing::debug!(
            student_id = %state.student_id,
            topic = %attempt.topic,
            correct = attempt.is_correct,
            previous_score,
            new_score = record.score,
            consecutive_failures,
            "Mastery updated"
        );

        Ok(MasteryUpdate {
            topic: attempt.topic,
            previous_score,
            record,
            consecutive_failures,
        })
    }

    /// Applies an attempt to an owned state: updates the mastery record and
    /// prepends the attempt to the capped history.
    pub fn apply_to_state(
        &self,
        state: &mut StudentState,
        attempt: AttemptRecord,
        timing: AttemptTiming,
    ) -> Result<MasteryUpdate, EngineError> {
        let update = self.record_attempt(state, &attempt, timing)?;
        state.topic_mastery.insert(update.topic, update.record.clone());
        state
            .recent_attempts
            .record(attempt, self.config.history_window);
        Ok(update)
    }

    pub fn summarize(&self, state: &StudentState) -> LearnerSummary {
        analytics::summarize(state, &self.taxonomy, self.config.history_window)
    }
}
