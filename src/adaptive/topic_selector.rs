//! 主题选择：前置门控 -> 薄弱优先 -> 防疲劳轮换

use crate::adaptive::config::EngineConfig;
use crate::adaptive::crisis::crisis_anchor;
use crate::adaptive::taxonomy::Taxonomy;
use crate::adaptive::types::*;

/// Ascending by mastery, ties by taxonomy order (the input order).
fn rank_by_weakness(state: &StudentState, topics: &[Topic]) -> Vec<(Topic, f64)> {
    let mut ranked: Vec<(Topic, f64)> = topics
        .iter()
        .map(|&t| (t, state.mastery_score(t)))
        .collect();
    // sort_by is stable, so equal scores keep taxonomy order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

/// First unmet prerequisite in taxonomy order, paired with the topic it blocks.
fn first_unmet_prerequisite(
    state: &StudentState,
    taxonomy: &Taxonomy,
    threshold: f64,
) -> Option<(Topic, Topic, f64)> {
    taxonomy.topics().iter().find_map(|&topic| {
        taxonomy.prerequisites(topic).iter().find_map(|&req| {
            let mastery = state.mastery_score(req);
            (mastery < threshold).then_some((req, topic, mastery))
        })
    })
}

fn is_stuck_on(history: &RecentAttempts, topic: Topic, window: usize) -> bool {
    let recent = history.window(window);
    recent.len() == window && recent.iter().all(|a| a.topic == topic)
}

/// Chooses the next topic and records why.
pub fn select_topic_with_reason(
    state: &StudentState,
    taxonomy: &Taxonomy,
    config: &EngineConfig,
) -> TopicSelection {
    let history = &state.recent_attempts;

    if history.is_empty() {
        return TopicSelection {
            topic: taxonomy.foundational(),
            reason: SelectionReason::NewStudent,
        };
    }

    if let Some(anchor) = crisis_anchor(history, &config.crisis) {
        // 失败主题不在分类体系内时退回基础主题
        let topic = if taxonomy.contains(anchor.topic) {
            anchor.topic
        } else {
            taxonomy.foundational()
        };
        return TopicSelection {
            topic,
            reason: SelectionReason::Crisis {
                failing_topic: anchor.topic,
                difficulty: anchor.difficulty_score,
            },
        };
    }

    if let Some((req, blocked, mastery)) =
        first_unmet_prerequisite(state, taxonomy, config.selector.prerequisite_threshold)
    {
        return TopicSelection {
            topic: req,
            reason: SelectionReason::PrerequisiteGate {
                blocked_topic: blocked,
                mastery,
            },
        };
    }

    let ranked = rank_by_weakness(state, taxonomy.topics());
    let Some(&(weakest, weakest_mastery)) = ranked.first() else {
        return TopicSelection {
            topic: taxonomy.foundational(),
            reason: SelectionReason::NewStudent,
        };
    };

    if is_stuck_on(history, weakest, config.selector.fatigue_window) {
        if let Some(&(second, second_mastery)) = ranked.get(1) {
            return TopicSelection {
                topic: second,
                reason: SelectionReason::AntiFatigue {
                    avoided_topic: weakest,
                    mastery: second_mastery,
                },
            };
        }
    }

    TopicSelection {
        topic: weakest,
        reason: SelectionReason::Weakest {
            mastery: weakest_mastery,
        },
    }
}

pub fn select_topic(state: &StudentState, taxonomy: &Taxonomy, config: &EngineConfig) -> Topic {
    select_topic_with_reason(state, taxonomy, config).topic
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use Topic::*;

    fn attempt(topic: Topic, ok: bool) -> AttemptRecord {
        AttemptRecord {
            question_id: format!("{topic}-q"),
            topic,
            is_correct: ok,
            difficulty_score: 0.5,
            timestamp: Utc::now(),
        }
    }

    fn state_with(scores: &[(Topic, f64)], attempts: Vec<AttemptRecord>) -> StudentState {
        let mut state = StudentState::new("s1");
        for &(topic, score) in scores {
            state.topic_mastery.insert(
                topic,
                MasteryRecord {
                    score,
                    ..MasteryRecord::default()
                },
            );
        }
        state.recent_attempts = RecentAttempts::most_recent_first(attempts);
        state
    }

    fn all_unlocked(score: f64) -> Vec<(Topic, f64)> {
        Taxonomy::default().topics().iter().map(|&t| (t, score)).collect()
    }

    #[test]
    fn new_student_gets_foundational_topic() {
        let sel = select_topic_with_reason(
            &StudentState::new("s1"),
            &Taxonomy::default(),
            &EngineConfig::default(),
        );
        assert_eq!(sel.topic, BasicSumProduct);
        assert_eq!(sel.reason, SelectionReason::NewStudent);
    }

    #[test]
    fn crisis_stays_on_failing_topic() {
        let state = state_with(
            &all_unlocked(0.9),
            vec![
                attempt(IntegerSolution, false),
                attempt(FindMCondition, false),
                attempt(BasicSumProduct, false),
            ],
        );
        let sel = select_topic_with_reason(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(sel.topic, IntegerSolution);
        assert!(matches!(sel.reason, SelectionReason::Crisis { .. }));
    }

    #[test]
    fn crisis_on_reserved_topic_falls_back_to_foundation() {
        let state = state_with(
            &all_unlocked(0.9),
            vec![
                attempt(Other, false),
                attempt(FindMCondition, false),
                attempt(BasicSumProduct, false),
            ],
        );
        let topic = select_topic(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(topic, BasicSumProduct);
    }

    #[test]
    fn gating_returns_first_unmet_prerequisite_in_order() {
        // Symmetric (index 2) is blocked by Basic before Asymmetric looks at FindM.
        let state = state_with(
            &[(BasicSumProduct, 0.45), (FindMCondition, 0.1)],
            vec![attempt(BasicSumProduct, true)],
        );
        let sel = select_topic_with_reason(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(sel.topic, BasicSumProduct);
        assert!(matches!(
            sel.reason,
            SelectionReason::PrerequisiteGate {
                blocked_topic: SymmetricExpression,
                ..
            }
        ));
    }

    #[test]
    fn weakest_topic_wins_with_taxonomy_tie_break() {
        let mut scores = all_unlocked(0.8);
        scores.retain(|(t, _)| *t != IntegerSolution && *t != RelationIndependentM);
        scores.push((IntegerSolution, 0.55));
        scores.push((RelationIndependentM, 0.55));
        let state = state_with(&scores, vec![attempt(BasicSumProduct, true)]);
        let topic = select_topic(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(topic, IntegerSolution);
    }

    #[test]
    fn anti_fatigue_rotates_to_second_weakest() {
        let mut scores = all_unlocked(0.8);
        scores.retain(|(t, _)| *t != FindMCondition);
        scores.push((FindMCondition, 0.55));
        let drilled: Vec<_> = (0..5).map(|_| attempt(FindMCondition, true)).collect();
        let state = state_with(&scores, drilled);
        let sel = select_topic_with_reason(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(sel.topic, BasicSumProduct);
        assert!(matches!(
            sel.reason,
            SelectionReason::AntiFatigue {
                avoided_topic: FindMCondition,
                ..
            }
        ));
    }

    #[test]
    fn four_in_a_row_is_not_fatigue() {
        let mut scores = all_unlocked(0.8);
        scores.retain(|(t, _)| *t != FindMCondition);
        scores.push((FindMCondition, 0.55));
        let drilled: Vec<_> = (0..4).map(|_| attempt(FindMCondition, true)).collect();
        let state = state_with(&scores, drilled);
        assert_eq!(
            select_topic(&state, &Taxonomy::default(), &EngineConfig::default()),
            FindMCondition
        );
    }

    #[test]
    fn nan_mastery_does_not_break_ranking() {
        let mut scores = all_unlocked(0.8);
        scores.retain(|(t, _)| *t != IntegerSolution);
        scores.push((IntegerSolution, f64::NAN));
        let state = state_with(&scores, vec![attempt(BasicSumProduct, true)]);
        let topic = select_topic(&state, &Taxonomy::default(), &EngineConfig::default());
        assert_eq!(topic, BasicSumProduct);
    }

    #[test]
    fn single_topic_taxonomy_keeps_drilling() {
        let taxonomy = Taxonomy::new(crate::adaptive::taxonomy::TaxonomyConfig {
            order: vec![BasicSumProduct],
            prerequisites: Default::default(),
        })
        .unwrap();
        let drilled: Vec<_> = (0..5).map(|_| attempt(BasicSumProduct, true)).collect();
        let state = state_with(&[(BasicSumProduct, 0.6)], drilled);
        assert_eq!(
            select_topic(&state, &taxonomy, &EngineConfig::default()),
            BasicSumProduct
        );
    }
}
