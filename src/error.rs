use thiserror::Error;

use crate::adaptive::taxonomy::TaxonomyError;
use crate::adaptive::types::Topic;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("topic {0} is not a recommendable taxonomy topic")]
    NotRecommendable(Topic),
}
