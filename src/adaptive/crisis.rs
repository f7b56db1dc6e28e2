use crate::adaptive::config::CrisisConfig;
use crate::adaptive::types::{AttemptRecord, RecentAttempts};

/// True iff the configured number of most recent attempts all exist and all failed,
/// regardless of topic.
pub fn is_crisis(history: &RecentAttempts, config: &CrisisConfig) -> bool {
    let n = config.consecutive_failures;
    let recent = history.window(n);
    recent.len() == n && recent.iter().all(|a| !a.is_correct)
}

/// The failing attempt crisis routing anchors on, when in crisis.
pub fn crisis_anchor<'a>(
    history: &'a RecentAttempts,
    config: &CrisisConfig,
) -> Option<&'a AttemptRecord> {
    if is_crisis(history, config) {
        history.latest()
    } else {
        None
    }
}
