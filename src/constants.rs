/// 每天毫秒数
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 掌握度存储精度（小数位数）
pub const SCORE_DECIMALS: i32 = 3;

/// 历史窗口下限：引擎至少读取最近 5 条作答
pub const MIN_HISTORY_WINDOW: usize = 5;

/// 薄弱主题判定的正确率阈值（百分比）
pub const STRUGGLING_ACCURACY_PERCENT: f64 = 55.0;
