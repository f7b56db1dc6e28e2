use adaptive_practice::adaptive::config::EngineConfig;
use adaptive_practice::adaptive::taxonomy::{Taxonomy, TaxonomyConfig};
use adaptive_practice::adaptive::types::{SelectionReason, StudentState, Topic};
use adaptive_practice::AdaptiveEngine;

#[test]
fn student_state_reads_camel_case_json() {
    let raw = r#"{
        "studentId": "s-42",
        "topicMastery": {
            "BASIC_SUM_PRODUCT": { "score": 0.62, "lastAttemptAt": "2026-02-01T10:00:00Z", "totalSolved": 7 },
            "FIND_M_CONDITION": { "score": 0.3, "lastAttemptAt": null, "totalSolved": 0 }
        },
        "recentAttempts": [
            { "questionId": "q9", "topic": "FIND_M_CONDITION", "isCorrect": false, "difficultyScore": 0.4, "timestamp": "2026-02-01T10:05:00Z" },
            { "questionId": "q8", "topic": "BASIC_SUM_PRODUCT", "isCorrect": true, "difficultyScore": 0.5, "timestamp": "2026-02-01T10:00:00Z" }
        ]
    }"#;
    let state: StudentState = serde_json::from_str(raw).expect("deserialize state");
    assert_eq!(state.student_id, "s-42");
    assert_eq!(state.mastery_score(Topic::BasicSumProduct), 0.62);
    assert_eq!(state.recent_attempts.latest().unwrap().question_id, "q9");

    let encoded = serde_json::to_string(&state).expect("serialize state");
    let decoded: StudentState = serde_json::from_str(&encoded).expect("deserialize state");
    assert_eq!(decoded, state);
}

#[test]
fn minimal_state_defaults_history_and_mastery() {
    let state: StudentState = serde_json::from_str(r#"{ "studentId": "fresh" }"#).unwrap();
    assert!(state.recent_attempts.is_empty());
    assert!(state.topic_mastery.is_empty());
}

#[test]
fn recommendation_serializes_for_callers() {
    let engine = AdaptiveEngine::default();
    let rec = engine.recommend(&StudentState::new("s1"));
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["targetTopic"], "BASIC_SUM_PRODUCT");
    assert_eq!(json["minDifficulty"], 0.1);
    assert_eq!(json["maxDifficulty"], 0.3);
    assert_eq!(json["reason"], "New student: starting with fundamentals.");
}

#[test]
fn selection_reason_is_tagged() {
    let reason = SelectionReason::PrerequisiteGate {
        blocked_topic: Topic::SymmetricExpression,
        mastery: 0.25,
    };
    let json = serde_json::to_value(&reason).unwrap();
    assert_eq!(json["kind"], "prerequisiteGate");
    assert_eq!(json["blockedTopic"], "SYMMETRIC_EXPRESSION");
    let back: SelectionReason = serde_json::from_value(json).unwrap();
    assert_eq!(back, reason);
}

#[test]
fn partial_tuning_profile_keeps_defaults() {
    let cfg: EngineConfig =
        serde_json::from_str(r#"{ "crisis": { "consecutiveFailures": 4 }, "historyWindow": 30 }"#)
            .unwrap();
    assert_eq!(cfg.crisis.consecutive_failures, 4);
    assert_eq!(cfg.crisis.min_floor, 0.1);
    assert_eq!(cfg.history_window, 30);
    assert_eq!(cfg.selector.prerequisite_threshold, 0.5);
    assert!(cfg.validate().is_ok());
}

#[test]
fn taxonomy_deserializes_through_validation() {
    let config = Taxonomy::default().to_config();
    let json = serde_json::to_string(&config).unwrap();
    let taxonomy: Taxonomy = serde_json::from_str(&json).unwrap();
    assert_eq!(taxonomy, Taxonomy::default());

    let cyclic = r#"{
        "order": ["BASIC_SUM_PRODUCT", "FIND_M_CONDITION"],
        "prerequisites": {
            "BASIC_SUM_PRODUCT": ["FIND_M_CONDITION"],
            "FIND_M_CONDITION": ["BASIC_SUM_PRODUCT"]
        }
    }"#;
    let err = serde_json::from_str::<Taxonomy>(cyclic).unwrap_err();
    assert!(err.to_string().contains("cycle"), "{err}");

    let parsed: TaxonomyConfig = serde_json::from_str(cyclic).unwrap();
    assert_eq!(parsed.order.len(), 2);
}
