//! Topic taxonomy: ordered topic list plus the prerequisite graph.
//!
//! Loaded once at startup and immutable afterwards. Every structural fault
//! is reported here so recommendation time never sees a malformed graph.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adaptive::types::Topic;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("taxonomy order is empty")]
    Empty,
    #[error("reserved topic {0} cannot be part of the taxonomy")]
    ReservedTopic(Topic),
    #[error("topic {0} listed more than once")]
    DuplicateTopic(Topic),
    #[error("unknown topic {topic} referenced by {referenced_by}")]
    UnknownTopic { topic: Topic, referenced_by: String },
    #[error("prerequisite cycle: {}", format_path(.0))]
    CycleDetected(Vec<Topic>),
    #[error("prerequisite {prerequisite} must precede {topic} in the taxonomy order")]
    PrerequisiteOutOfOrder { topic: Topic, prerequisite: Topic },
    #[error("no topic without prerequisites")]
    NoFoundationalTopic,
}

fn format_path(path: &[Topic]) -> String {
    path.iter()
        .map(Topic::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Serde form of the taxonomy as supplied by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyConfig {
    pub order: Vec<Topic>,
    #[serde(default)]
    pub prerequisites: BTreeMap<Topic, Vec<Topic>>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        use Topic::*;
        Self {
            order: vec![
                BasicSumProduct,
                FindMCondition,
                SymmetricExpression,
                AsymmetricExpression,
                IntegerSolution,
                RelationIndependentM,
            ],
            prerequisites: BTreeMap::from([
                (SymmetricExpression, vec![BasicSumProduct]),
                (AsymmetricExpression, vec![SymmetricExpression, FindMCondition]),
                (RelationIndependentM, vec![FindMCondition]),
                (IntegerSolution, vec![BasicSumProduct, FindMCondition]),
            ]),
        }
    }
}

/// Topic -> ordered prerequisites. Acyclic by construction.
#[derive(Debug, Clone, PartialEq, Default)]
struct PrerequisiteGraph {
    edges: BTreeMap<Topic, Vec<Topic>>,
}

impl PrerequisiteGraph {
    fn prerequisites(&self, topic: Topic) -> &[Topic] {
        self.edges.get(&topic).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find_cycle(&self, order: &[Topic]) -> Option<Vec<Topic>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        order
            .iter()
            .find_map(|&topic| self.find_cycle_dfs(topic, &mut visited, &mut stack))
    }

    fn find_cycle_dfs(
        &self,
        topic: Topic,
        visited: &mut HashSet<Topic>,
        stack: &mut Vec<Topic>,
    ) -> Option<Vec<Topic>> {
        if let Some(pos) = stack.iter().position(|&t| t == topic) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(topic);
            return Some(cycle);
        }
        if !visited.insert(topic) {
            return None;
        }

        stack.push(topic);
        for &req in self.prerequisites(topic) {
            if let Some(cycle) = self.find_cycle_dfs(req, visited, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        None
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TaxonomyConfig")]
pub struct Taxonomy {
    order: Vec<Topic>,
    graph: PrerequisiteGraph,
    foundational: Topic,
}

impl Taxonomy {
    pub fn new(config: TaxonomyConfig) -> Result<Self, TaxonomyError> {
        let TaxonomyConfig {
            order,
            prerequisites,
        } = config;

        if order.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut seen = HashSet::new();
        for &topic in &order {
            if topic.is_reserved() {
                return Err(TaxonomyError::ReservedTopic(topic));
            }
            if !seen.insert(topic) {
                return Err(TaxonomyError::DuplicateTopic(topic));
            }
        }

        for (&topic, reqs) in &prerequisites {
            if topic.is_reserved() {
                return Err(TaxonomyError::ReservedTopic(topic));
            }
            if !seen.contains(&topic) {
                return Err(TaxonomyError::UnknownTopic {
                    topic,
                    referenced_by: "prerequisite graph".to_string(),
                });
            }
            for &req in reqs {
                if req.is_reserved() {
                    return Err(TaxonomyError::ReservedTopic(req));
                }
                if !seen.contains(&req) {
                    return Err(TaxonomyError::UnknownTopic {
                        topic: req,
                        referenced_by: topic.to_string(),
                    });
                }
            }
        }

        let graph = PrerequisiteGraph {
            edges: prerequisites,
        };
        if let Some(cycle) = graph.find_cycle(&order) {
            return Err(TaxonomyError::CycleDetected(cycle));
        }

        // 前置主题必须排在其依赖主题之前，首个未达标前置的门控才不会指向另一个被门控的主题
        for (idx, &topic) in order.iter().enumerate() {
            for &req in graph.prerequisites(topic) {
                let req_idx = order.iter().position(|&t| t == req).unwrap_or(usize::MAX);
                if req_idx > idx {
                    return Err(TaxonomyError::PrerequisiteOutOfOrder {
                        topic,
                        prerequisite: req,
                    });
                }
            }
        }

        let foundational = order
            .iter()
            .copied()
            .find(|&t| graph.prerequisites(t).is_empty())
            .ok_or(TaxonomyError::NoFoundationalTopic)?;

        Ok(Self {
            order,
            graph,
            foundational,
        })
    }

    /// Loads a JSON taxonomy, or the reference graph when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: TaxonomyConfig = serde_json::from_str(&raw)?;
        let taxonomy = Self::new(config)?;
        tracing::info!(
            path = %path.display(),
            topics = taxonomy.order.len(),
            foundational = %taxonomy.foundational,
            "Loaded topic taxonomy"
        );
        Ok(taxonomy)
    }

    /// Topics in taxonomy order.
    pub fn topics(&self) -> &[Topic] {
        &self.order
    }

    pub fn prerequisites(&self, topic: Topic) -> &[Topic] {
        self.graph.prerequisites(topic)
    }

    pub fn foundational(&self) -> Topic {
        self.foundational
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.order.contains(&topic)
    }

    /// Every topic that transitively requires `topic`.
    pub fn dependents_closure(&self, topic: Topic) -> BTreeSet<Topic> {
        let mut found = BTreeSet::new();
        let mut frontier = vec![topic];
        while let Some(current) = frontier.pop() {
            for &candidate in &self.order {
                if self.prerequisites(candidate).contains(&current) && found.insert(candidate) {
                    frontier.push(candidate);
                }
            }
        }
        found
    }

    pub fn to_config(&self) -> TaxonomyConfig {
        TaxonomyConfig {
            order: self.order.clone(),
            prerequisites: self.graph.edges.clone(),
        }
    }
}

impl TryFrom<TaxonomyConfig> for Taxonomy {
    type Error = TaxonomyError;

    fn try_from(config: TaxonomyConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        match Self::new(TaxonomyConfig::default()) {
            Ok(taxonomy) => taxonomy,
            Err(e) => unreachable!("reference taxonomy is valid: {e}"),
        }
    }
}
