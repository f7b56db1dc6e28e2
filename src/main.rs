use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adaptive_practice::adaptive::analytics::LearnerSummary;
use adaptive_practice::adaptive::config::EngineConfig;
use adaptive_practice::adaptive::taxonomy::Taxonomy;
use adaptive_practice::adaptive::types::{CandidateProblem, QuestionRecommendation, StudentState};
use adaptive_practice::config::{log_config_from_env, Config};
use adaptive_practice::logging::init_tracing;
use adaptive_practice::{AdaptiveEngine, EngineError};
use serde::de::DeserializeOwned;
use serde::Serialize;

const USAGE: &str = "usage: adaptive-practice <state.json> [candidates.json]";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    recommendation: QuestionRecommendation,
    matched: Option<&'a CandidateProblem>,
    summary: LearnerSummary,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let raw = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn build_engine(config: &Config) -> Result<AdaptiveEngine, EngineError> {
    let mut tuning = EngineConfig::load(config.engine.tuning_path.as_deref())?;
    if let Some(window) = config.engine.history_window {
        tuning.history_window = window;
    }
    let taxonomy = Taxonomy::load(config.engine.taxonomy_path.as_deref())?;
    AdaptiveEngine::new(tuning, taxonomy)
}

fn run(state_path: PathBuf, candidates_path: Option<PathBuf>) -> Result<(), EngineError> {
    init_tracing(&log_config_from_env());
    let config = Config::from_env();
    tracing::debug!(?config, "Process config loaded");

    let engine = build_engine(&config)?;
    let state: StudentState = read_json(&state_path)?;
    let candidates: Vec<CandidateProblem> = match candidates_path {
        Some(path) => read_json(&path)?,
        None => Vec::new(),
    };

    let (recommendation, matched) = engine.next_question(&state, &candidates);
    tracing::info!(
        student_id = %state.student_id,
        topic = %recommendation.target_topic,
        matched = matched.map(|c| c.id.as_str()),
        "Recommendation ready"
    );

    let report = Report {
        recommendation,
        matched,
        summary: engine.summarize(&state),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(state_path) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let candidates_path = args.next();

    match run(state_path, candidates_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "adaptive-practice failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
