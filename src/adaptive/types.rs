use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sub-topic of the quadratic-roots (Vieta) practice domain.
///
/// `Other` and `Invalid` are classifier outcomes for problems that do not
/// belong to the taxonomy; they are never recommendation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    BasicSumProduct,
    FindMCondition,
    SymmetricExpression,
    AsymmetricExpression,
    IntegerSolution,
    RelationIndependentM,
    Other,
    Invalid,
}

impl Topic {
    pub const ALL: [Topic; 8] = [
        Topic::BasicSumProduct,
        Topic::FindMCondition,
        Topic::SymmetricExpression,
        Topic::AsymmetricExpression,
        Topic::IntegerSolution,
        Topic::RelationIndependentM,
        Topic::Other,
        Topic::Invalid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicSumProduct => "BASIC_SUM_PRODUCT",
            Self::FindMCondition => "FIND_M_CONDITION",
            Self::SymmetricExpression => "SYMMETRIC_EXPRESSION",
            Self::AsymmetricExpression => "ASYMMETRIC_EXPRESSION",
            Self::IntegerSolution => "INTEGER_SOLUTION",
            Self::RelationIndependentM => "RELATION_INDEPENDENT_M",
            Self::Other => "OTHER",
            Self::Invalid => "INVALID",
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Other | Self::Invalid)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown topic '{0}'")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

/// Per (student, topic) proficiency estimate. Created at score 0 on the
/// first attempt; only the mastery model produces new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub score: f64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub total_solved: u32,
}

impl Default for MasteryRecord {
    fn default() -> Self {
        Self {
            score: 0.0,
            last_attempt_at: None,
            total_solved: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub question_id: String,
    pub topic: Topic,
    pub is_correct: bool,
    pub difficulty_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Attempt history ordered most recent first.
///
/// Index 0 is always the latest attempt. Use [`RecentAttempts::from_chronological`]
/// when the source yields oldest-first records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentAttempts(Vec<AttemptRecord>);

impl RecentAttempts {
    pub fn most_recent_first(attempts: Vec<AttemptRecord>) -> Self {
        Self(attempts)
    }

    pub fn from_chronological(mut attempts: Vec<AttemptRecord>) -> Self {
        attempts.reverse();
        Self(attempts)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn latest(&self) -> Option<&AttemptRecord> {
        self.0.first()
    }

    /// The `n` most recent attempts (fewer if the history is shorter).
    pub fn window(&self, n: usize) -> &[AttemptRecord] {
        &self.0[..n.min(self.0.len())]
    }

    /// Latest attempt on `topic` among the `n` most recent.
    pub fn latest_on(&self, topic: Topic, n: usize) -> Option<&AttemptRecord> {
        self.window(n).iter().find(|a| a.topic == topic)
    }

    pub fn question_ids(&self) -> HashSet<String> {
        self.0.iter().map(|a| a.question_id.clone()).collect()
    }

    /// Prepends a new attempt, keeping at most `cap` entries.
    pub fn record(&mut self, attempt: AttemptRecord, cap: usize) {
        self.0.insert(0, attempt);
        self.0.truncate(cap.max(1));
    }
}

/// Read-only snapshot handed to the engine per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentState {
    pub student_id: String,
    #[serde(default)]
    pub topic_mastery: BTreeMap<Topic, MasteryRecord>,
    #[serde(default)]
    pub recent_attempts: RecentAttempts,
}

impl StudentState {
    pub fn new(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            ..Self::default()
        }
    }

    pub fn mastery(&self, topic: Topic) -> Option<&MasteryRecord> {
        self.topic_mastery.get(&topic)
    }

    /// Missing records read as score 0.
    pub fn mastery_score(&self, topic: Topic) -> f64 {
        self.mastery(topic).map(|r| r.score).unwrap_or(0.0)
    }
}

/// Outcome of one answered problem, as fed to the mastery model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub difficulty_score: f64,
    pub is_correct: bool,
    pub time_spent_secs: f64,
    pub estimated_time_secs: f64,
    pub answered_at: DateTime<Utc>,
}

/// Timing reported alongside an answered attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptTiming {
    pub time_spent_secs: f64,
    pub estimated_time_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProblem {
    pub id: String,
    pub topic: Topic,
    pub difficulty_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyWindow {
    pub min: f64,
    pub max: f64,
}

impl DifficultyWindow {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, difficulty: f64) -> bool {
        (self.min..=self.max).contains(&difficulty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecommendation {
    pub target_topic: Topic,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub reason: String,
}

impl QuestionRecommendation {
    pub fn window(&self) -> DifficultyWindow {
        DifficultyWindow {
            min: self.min_difficulty,
            max: self.max_difficulty,
        }
    }
}

/// Why the topic selector settled on a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionReason {
    NewStudent,
    Crisis { failing_topic: Topic, difficulty: f64 },
    PrerequisiteGate { blocked_topic: Topic, mastery: f64 },
    Weakest { mastery: f64 },
    AntiFatigue { avoided_topic: Topic, mastery: f64 },
}

impl SelectionReason {
    pub fn describe(&self) -> String {
        match self {
            Self::NewStudent => "New student: starting with fundamentals.".to_string(),
            Self::Crisis { .. } => {
                "Crisis mode: 3 consecutive failures. Reducing difficulty significantly."
                    .to_string()
            }
            Self::PrerequisiteGate {
                blocked_topic,
                mastery,
            } => format!(
                "Prerequisite gate: reinforcing before {blocked_topic}. Mastery: {mastery:.2}"
            ),
            Self::Weakest { mastery } => format!("Standard adaptive path. Mastery: {mastery:.2}"),
            Self::AntiFatigue {
                avoided_topic,
                mastery,
            } => format!("Rotating away from {avoided_topic} to avoid fatigue. Mastery: {mastery:.2}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSelection {
    pub topic: Topic,
    pub reason: SelectionReason,
}

/// Delta returned after an attempt; the caller persists `record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryUpdate {
    pub topic: Topic,
    pub previous_score: f64,
    pub record: MasteryRecord,
    pub consecutive_failures: u32,
}
