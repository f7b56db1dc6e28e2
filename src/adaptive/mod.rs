pub mod analytics;
pub mod calibrator;
pub mod config;
pub mod crisis;
pub mod engine;
pub mod matcher;
pub mod memory;
pub mod monitoring;
pub mod taxonomy;
pub mod topic_selector;
pub mod types;
