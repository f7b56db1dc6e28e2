use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::MIN_HISTORY_WINDOW;
use crate::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryModelConfig {
    /// 每日遗忘衰减率
    pub daily_decay_rate: f64,
    /// 超过该天数未练习才开始衰减
    pub decay_grace_days: f64,
    /// 衰减天数上限，防止长期不练习导致掌握度清零
    pub max_decay_days: f64,
    pub learning_rate: f64,
    pub time_ratio_min: f64,
    pub time_ratio_max: f64,
    /// 作答时长下限（秒），低于此值视为猜测，不再放大时间奖励
    pub min_time_spent_secs: f64,
    pub consolidation_increment: f64,
    pub expected_failure_penalty: f64,
    pub gap_failure_base_penalty: f64,
    pub gap_failure_scale: f64,
    pub crisis_failure_streak: u32,
    pub crisis_slash_factor: f64,
}

impl Default for MasteryModelConfig {
    fn default() -> Self {
        Self {
            daily_decay_rate: 0.05,
            decay_grace_days: 1.0,
            max_decay_days: 4.0,
            learning_rate: 0.2,
            time_ratio_min: 0.8,
            time_ratio_max: 1.2,
            min_time_spent_secs: 10.0,
            consolidation_increment: 0.01,
            expected_failure_penalty: 0.02,
            gap_failure_base_penalty: 0.05,
            gap_failure_scale: 0.15,
            crisis_failure_streak: 3,
            crisis_slash_factor: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrisisConfig {
    pub consecutive_failures: usize,
    pub min_drop: f64,
    pub max_drop: f64,
    pub min_floor: f64,
    pub max_floor: f64,
}

impl Default for CrisisConfig {
    fn default() -> Self {
        Self {
            consecutive_failures: 3,
            min_drop: 0.2,
            max_drop: 0.05,
            min_floor: 0.1,
            max_floor: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicSelectorConfig {
    pub prerequisite_threshold: f64,
    pub fatigue_window: usize,
}

impl Default for TopicSelectorConfig {
    fn default() -> Self {
        Self {
            prerequisite_threshold: 0.5,
            fatigue_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibratorConfig {
    pub struggling_threshold: f64,
    pub advancing_threshold: f64,
    /// 该主题无历史作答时的基准难度
    pub default_difficulty: f64,
    pub struggling_step_down: f64,
    pub consolidating_step_up: f64,
    pub advancing_step_up: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub window_below: f64,
    pub window_above: f64,
    pub new_student_min: f64,
    pub new_student_max: f64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            struggling_threshold: 0.4,
            advancing_threshold: 0.7,
            default_difficulty: 0.2,
            struggling_step_down: 0.1,
            consolidating_step_up: 0.05,
            advancing_step_up: 0.1,
            min_difficulty: 0.1,
            max_difficulty: 1.0,
            window_below: 0.05,
            window_above: 0.1,
            new_student_min: 0.1,
            new_student_max: 0.3,
        }
    }
}

fn default_history_window() -> usize {
    20
}

/// Immutable tuning profile passed into every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub mastery: MasteryModelConfig,
    #[serde(default)]
    pub crisis: CrisisConfig,
    #[serde(default)]
    pub selector: TopicSelectorConfig,
    #[serde(default)]
    pub calibrator: CalibratorConfig,
    /// Number of most-recent attempts the engine reads.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mastery: MasteryModelConfig::default(),
            crisis: CrisisConfig::default(),
            selector: TopicSelectorConfig::default(),
            calibrator: CalibratorConfig::default(),
            history_window: default_history_window(),
        }
    }
}

fn unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl EngineConfig {
    /// Reads a JSON tuning profile when a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let parsed: Self = serde_json::from_str(&raw)?;
                tracing::info!(path = %path.display(), "Loaded engine tuning profile");
                parsed
            }
            None => Self::default(),
        };
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        // MasteryModelConfig
        let m = &self.mastery;
        if !unit(m.daily_decay_rate) {
            return Err("mastery.daily_decay_rate must be in [0,1]".to_string());
        }
        if m.decay_grace_days < 0.0 {
            return Err("mastery.decay_grace_days must be >= 0".to_string());
        }
        if m.max_decay_days < 0.0 {
            return Err("mastery.max_decay_days must be >= 0".to_string());
        }
        if !unit(m.learning_rate) {
            return Err("mastery.learning_rate must be in [0,1]".to_string());
        }
        if m.time_ratio_min <= 0.0 || m.time_ratio_min > m.time_ratio_max {
            return Err("mastery.time_ratio_min must be in (0, time_ratio_max]".to_string());
        }
        if m.min_time_spent_secs <= 0.0 {
            return Err("mastery.min_time_spent_secs must be > 0".to_string());
        }
        for (name, value) in [
            ("consolidation_increment", m.consolidation_increment),
            ("expected_failure_penalty", m.expected_failure_penalty),
            ("gap_failure_base_penalty", m.gap_failure_base_penalty),
            ("gap_failure_scale", m.gap_failure_scale),
            ("crisis_slash_factor", m.crisis_slash_factor),
        ] {
            if !unit(value) {
                return Err(format!("mastery.{name} must be in [0,1]"));
            }
        }
        if m.crisis_failure_streak == 0 {
            return Err("mastery.crisis_failure_streak must be > 0".to_string());
        }

        // CrisisConfig
        let c = &self.crisis;
        if c.consecutive_failures == 0 {
            return Err("crisis.consecutive_failures must be > 0".to_string());
        }
        if !unit(c.min_drop) || !unit(c.max_drop) || c.max_drop > c.min_drop {
            return Err("crisis drops must be in [0,1] with max_drop <= min_drop".to_string());
        }
        if !unit(c.min_floor) || !unit(c.max_floor) || c.min_floor > c.max_floor {
            return Err("crisis floors must be in [0,1] with min_floor <= max_floor".to_string());
        }

        // TopicSelectorConfig
        if !unit(self.selector.prerequisite_threshold) {
            return Err("selector.prerequisite_threshold must be in [0,1]".to_string());
        }
        if self.selector.fatigue_window == 0 {
            return Err("selector.fatigue_window must be > 0".to_string());
        }

        // CalibratorConfig
        let k = &self.calibrator;
        if !unit(k.struggling_threshold)
            || !unit(k.advancing_threshold)
            || k.struggling_threshold > k.advancing_threshold
        {
            return Err(
                "calibrator thresholds must be in [0,1] with struggling <= advancing".to_string(),
            );
        }
        if !unit(k.min_difficulty) || !unit(k.max_difficulty) || k.min_difficulty > k.max_difficulty
        {
            return Err(
                "calibrator.min_difficulty must be <= max_difficulty, both in [0,1]".to_string(),
            );
        }
        if !unit(k.default_difficulty) {
            return Err("calibrator.default_difficulty must be in [0,1]".to_string());
        }
        for (name, value) in [
            ("struggling_step_down", k.struggling_step_down),
            ("consolidating_step_up", k.consolidating_step_up),
            ("advancing_step_up", k.advancing_step_up),
            ("window_below", k.window_below),
            ("window_above", k.window_above),
        ] {
            if !unit(value) {
                return Err(format!("calibrator.{name} must be in [0,1]"));
            }
        }
        if !unit(k.new_student_min) || !unit(k.new_student_max) || k.new_student_min > k.new_student_max
        {
            return Err(
                "calibrator new-student window must be ordered and within [0,1]".to_string(),
            );
        }

        if self.history_window < MIN_HISTORY_WINDOW {
            return Err(format!("history_window must be >= {MIN_HISTORY_WINDOW}"));
        }
        if self.history_window < self.crisis.consecutive_failures
            || self.history_window < self.selector.fatigue_window
        {
            return Err(
                "history_window must cover crisis.consecutive_failures and selector.fatigue_window"
                    .to_string(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.mastery.learning_rate = 2.0;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.calibrator.struggling_threshold = 0.8;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.history_window = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_profile_fills_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"mastery":{"learningRate":0.3}}"#).unwrap();
        assert_eq!(cfg.mastery.learning_rate, 0.3);
        assert_eq!(cfg.selector.fatigue_window, 5);
        assert_eq!(cfg.history_window, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_reads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"historyWindow": 2}}"#).unwrap();
        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));

        assert!(EngineConfig::load(None).is_ok());
    }
}
