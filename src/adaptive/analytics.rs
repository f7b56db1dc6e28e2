//! Learner-level summaries over the recent attempt window.

use serde::{Deserialize, Serialize};

use crate::adaptive::taxonomy::Taxonomy;
use crate::adaptive::types::*;
use crate::constants::STRUGGLING_ACCURACY_PERCENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl DifficultyLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            Self::Easy
        } else if score < 0.7 {
            Self::Medium
        } else if score < 0.9 {
            Self::Hard
        } else {
            Self::Expert
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPerformance {
    pub topic: Topic,
    pub attempt_count: u32,
    /// Percentage of correct answers; `None` before the first attempt.
    pub accuracy: Option<f64>,
    pub avg_difficulty: Option<f64>,
    pub mastery: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyBreakdown {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub expert: u32,
}

impl DifficultyBreakdown {
    fn add(&mut self, level: DifficultyLevel) {
        match level {
            DifficultyLevel::Easy => self.easy += 1,
            DifficultyLevel::Medium => self.medium += 1,
            DifficultyLevel::Hard => self.hard += 1,
            DifficultyLevel::Expert => self.expert += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSummary {
    pub student_id: String,
    pub total_attempts: u32,
    pub accuracy: Option<f64>,
    pub topic_performance: Vec<TopicPerformance>,
    pub difficulty_breakdown: DifficultyBreakdown,
    pub strongest_topic: Option<Topic>,
    pub weakest_topic: Option<Topic>,
    /// Attempted topics below the accuracy bar, weakest first.
    pub struggling_topics: Vec<Topic>,
}

fn percent(correct: u32, total: u32) -> Option<f64> {
    (total > 0).then(|| correct as f64 * 100.0 / total as f64)
}

pub fn summarize(state: &StudentState, taxonomy: &Taxonomy, window: usize) -> LearnerSummary {
    let attempts = state.recent_attempts.window(window);

    let mut breakdown = DifficultyBreakdown::default();
    for a in attempts {
        breakdown.add(DifficultyLevel::from_score(a.difficulty_score));
    }

    let topic_performance: Vec<TopicPerformance> = taxonomy
        .topics()
        .iter()
        .map(|&topic| {
            let on_topic: Vec<&AttemptRecord> =
                attempts.iter().filter(|a| a.topic == topic).collect();
            let count = on_topic.len() as u32;
            let correct = on_topic.iter().filter(|a| a.is_correct).count() as u32;
            let avg_difficulty = (count > 0).then(|| {
                on_topic.iter().map(|a| a.difficulty_score).sum::<f64>() / count as f64
            });
            TopicPerformance {
                topic,
                attempt_count: count,
                accuracy: percent(correct, count),
                avg_difficulty,
                mastery: state.mastery_score(topic),
            }
        })
        .collect();

    let mut struggling: Vec<&TopicPerformance> = topic_performance
        .iter()
        .filter(|p| p.accuracy.is_some_and(|acc| acc < STRUGGLING_ACCURACY_PERCENT))
        .collect();
    // accuracy 为 None 的主题已被过滤
    struggling.sort_by(|a, b| {
        let (x, y) = (a.accuracy.unwrap_or(0.0), b.accuracy.unwrap_or(0.0));
        x.total_cmp(&y)
    });

    let recorded: Vec<(Topic, f64)> = taxonomy
        .topics()
        .iter()
        .filter_map(|&t| state.mastery(t).map(|r| (t, r.score)))
        .collect();
    // 同分时取分类顺序靠前的主题
    let strongest_topic = recorded
        .iter()
        .fold(None::<(Topic, f64)>, |best, &(t, s)| match best {
            Some((_, bs)) if bs >= s => best,
            _ => Some((t, s)),
        })
        .map(|(t, _)| t);
    let weakest_topic = recorded
        .iter()
        .fold(None::<(Topic, f64)>, |worst, &(t, s)| match worst {
            Some((_, ws)) if ws <= s => worst,
            _ => Some((t, s)),
        })
        .map(|(t, _)| t);

    let total = attempts.len() as u32;
    let correct = attempts.iter().filter(|a| a.is_correct).count() as u32;

    LearnerSummary {
        student_id: state.student_id.clone(),
        total_attempts: total,
        accuracy: percent(correct, total),
        struggling_topics: struggling.iter().map(|p| p.topic).collect(),
        topic_performance,
        difficulty_breakdown: breakdown,
        strongest_topic,
        weakest_topic,
    }
}
