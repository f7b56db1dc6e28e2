//! 候选题匹配：按主题与历史过滤后，选出难度最接近目标区间中点的题目

use std::collections::HashSet;

use crate::adaptive::types::{CandidateProblem, QuestionRecommendation};

/// Picks the candidate closest to the middle of the recommended window.
///
/// Returns `None` when no unseen candidate in the target topic remains; the
/// caller is expected to widen its pool or relax the topic constraint.
/// Ties keep the first candidate in input order.
pub fn match_candidate<'a>(
    candidates: &'a [CandidateProblem],
    recommendation: &QuestionRecommendation,
    exclude_ids: &HashSet<String>,
) -> Option<&'a CandidateProblem> {
    let target_mid = recommendation.window().midpoint();

    let best = candidates
        .iter()
        .filter(|c| c.topic == recommendation.target_topic && !exclude_ids.contains(&c.id))
        .map(|c| ((c.difficulty_score - target_mid).abs(), c))
        // min_by keeps the first of equal elements
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c);

    match best {
        Some(c) => tracing::debug!(
            candidate_id = %c.id,
            difficulty = c.difficulty_score,
            target_mid,
            "Matched candidate problem"
        ),
        None => tracing::debug!(
            topic = %recommendation.target_topic,
            pool = candidates.len(),
            excluded = exclude_ids.len(),
            "No candidate left for recommendation"
        ),
    }
    best
}
