use serde::{Deserialize, Serialize};

use crate::adaptive::memory::mastery::round_score;
use crate::adaptive::taxonomy::Taxonomy;
use crate::adaptive::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantViolation {
    pub field: String,
    pub value: f64,
    pub expected_range: String,
}

pub fn check_recommendation(
    rec: &QuestionRecommendation,
    taxonomy: &Taxonomy,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    check_range(&mut violations, "min_difficulty", rec.min_difficulty, 0.0, 1.0);
    check_range(&mut violations, "max_difficulty", rec.max_difficulty, 0.0, 1.0);

    if rec.min_difficulty > rec.max_difficulty {
        violations.push(InvariantViolation {
            field: "window".to_string(),
            value: rec.min_difficulty - rec.max_difficulty,
            expected_range: "min <= max".to_string(),
        });
    }

    if !taxonomy.contains(rec.target_topic) {
        violations.push(InvariantViolation {
            field: format!("target_topic:{}", rec.target_topic),
            value: f64::NAN,
            expected_range: "recommendable taxonomy topic".to_string(),
        });
    }

    violations
}

pub fn check_mastery_record(record: &MasteryRecord) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    check_range(&mut violations, "score", record.score, 0.0, 1.0);
    if record.score.is_finite() && round_score(record.score) != record.score {
        violations.push(InvariantViolation {
            field: "score_precision".to_string(),
            value: record.score,
            expected_range: "3 decimal places".to_string(),
        });
    }
    violations
}

fn check_range(
    violations: &mut Vec<InvariantViolation>,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if value.is_nan() || value < min || value > max {
        violations.push(InvariantViolation {
            field: field.to_string(),
            value,
            expected_range: format!("[{min}, {max}]"),
        });
    }
}
