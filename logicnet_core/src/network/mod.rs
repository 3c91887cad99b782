//! Module providing the logic network: its edges, the identity cache used to name its
//! nodes, and the builder generating it from a pathway.

pub mod builder;
pub mod identity;

use std::fmt::{Display, Formatter};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Whether an edge activates or inhibits its target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosNeg {
    Pos,
    Neg,
}

/// Whether the producers of an entity are all required, or each sufficient
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndOr {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Input,
    Output,
    Catalyst,
    Regulator,
}

impl Display for PosNeg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PosNeg::Pos => write!(f, "pos"),
            PosNeg::Neg => write!(f, "neg"),
        }
    }
}

impl Display for AndOr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AndOr::And => write!(f, "and"),
            AndOr::Or => write!(f, "or"),
        }
    }
}

impl Display for EdgeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Input => write!(f, "input"),
            EdgeType::Output => write!(f, "output"),
            EdgeType::Catalyst => write!(f, "catalyst"),
            EdgeType::Regulator => write!(f, "regulator"),
        }
    }
}

/// Directed edge of the logic network, between two entity identifiers
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub pos_neg: PosNeg,
    /// Only set on transformation edges
    pub and_or: Option<AndOr>,
    pub edge_type: EdgeType,
}

impl Edge {
    /// Whether the edge turns an input entity into an output entity (as opposed to
    /// regulating a reaction)
    pub fn is_transformation(&self) -> bool {
        matches!(self.edge_type, EdgeType::Input | EdgeType::Output)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// Flat directed network of entity transformations and regulations
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicNetwork {
    edges: Vec<Edge>,
}

impl LogicNetwork {
    pub fn new() -> Self {
        LogicNetwork { edges: Vec::new() }
    }

    pub(crate) fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Edges in emission order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn transformation_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_transformation())
    }

    /// Catalyst and regulator edges
    pub fn regulatory_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| !e.is_transformation())
    }

    /// Every edge whose target is `node_id`
    pub fn edges_into<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target_id == node_id)
    }

    // region Node Classification
    /// Nodes which are consumed by some transformation but never produced by one
    pub fn root_inputs(&self) -> IndexSet<&str> {
        let targets = self.transformation_targets();
        self.transformation_sources()
            .into_iter()
            .filter(|id| !targets.contains(id))
            .collect()
    }

    /// Nodes which are produced by some transformation but never consumed by one
    pub fn terminal_outputs(&self) -> IndexSet<&str> {
        let sources = self.transformation_sources();
        self.transformation_targets()
            .into_iter()
            .filter(|id| !sources.contains(id))
            .collect()
    }

    /// Nodes which are both produced and consumed
    pub fn intermediates(&self) -> IndexSet<&str> {
        let targets = self.transformation_targets();
        self.transformation_sources()
            .into_iter()
            .filter(|id| targets.contains(id))
            .collect()
    }

    /// Transformation edges from a node to itself
    pub fn self_loops(&self) -> impl Iterator<Item = &Edge> {
        self.transformation_edges().filter(|e| e.is_self_loop())
    }

    fn transformation_sources(&self) -> IndexSet<&str> {
        self.transformation_edges()
            .map(|e| e.source_id.as_str())
            .collect()
    }

    fn transformation_targets(&self) -> IndexSet<&str> {
        self.transformation_edges()
            .map(|e| e.target_id.as_str())
            .collect()
    }
    // endregion Node Classification
}

impl FromIterator<Edge> for LogicNetwork {
    fn from_iter<T: IntoIterator<Item = Edge>>(iter: T) -> Self {
        LogicNetwork {
            edges: iter.into_iter().collect(),
        }
    }
}
