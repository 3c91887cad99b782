//! This module provides the LogicNetworkBuilder, which turns a pathway into a logic network
//!
//! Generation runs in two stages. The preparation stage decomposes both sides of every
//! reaction, and pairs the resulting combinations into virtual reactions. It touches no
//! shared state, so with the `parallel` feature it runs on the rayon thread pool. The
//! emission stage then walks the prepared reactions in order, allocates node identifiers,
//! and emits the edges.
use std::fmt::{Display, Formatter};

use cancel_this::{is_cancelled, Cancelled};
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::configuration::{default_combination_warning_threshold, default_coverage_policy};
use crate::decompose::{CombinationSet, DecompositionError, Decomposer};
use crate::io::cache::MatchCache;
use crate::io::TableError;
use crate::network::identity::IdentityCache;
use crate::network::{AndOr, Edge, EdgeType, LogicNetwork, PosNeg};
use crate::optimize::matcher::{CombinationMatcher, CoveragePolicy, MatchError};
use crate::pathway::combination::Combination;
use crate::pathway::model::Pathway;
use crate::pathway::reaction::{Role, VirtualReaction};

// region Configuration
/// Settings of a generation run
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    /// How reactions with unequal numbers of input and output combinations are paired
    #[builder(default = "default_coverage_policy()")]
    pub coverage_policy: CoveragePolicy,
    /// Number of combinations above which a decomposition is logged as large
    #[builder(default = "default_combination_warning_threshold()")]
    pub combination_warning_threshold: usize,
    /// Entities standing for a single representative entity, instead of being expanded
    /// into their members
    #[builder(default = "IndexMap::new()")]
    pub canonical_entities: IndexMap<String, String>,
    /// Namespace of the run's identifiers, random if not set
    #[builder(default = "None")]
    pub namespace: Option<Uuid>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            coverage_policy: default_coverage_policy(),
            combination_warning_threshold: default_combination_warning_threshold(),
            canonical_entities: IndexMap::new(),
            namespace: None,
        }
    }
}
// endregion Configuration

// region Errors
/// Reasons for skipping a single reaction
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReactionError {
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),
    #[error("Reaction has no {side} combinations")]
    EmptyCombinationSet { side: Role },
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("Reaction {0} is connected, but never defined")]
    UnknownReaction(String),
}

/// Errors which abort a whole generation run
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Entity nesting contains a cycle: {}", .0.join(" -> "))]
    CyclicEntityRef(Vec<String>),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Generation was cancelled: {0}")]
    Cancelled(Cancelled),
}

impl From<Cancelled> for NetworkError {
    fn from(value: Cancelled) -> Self {
        NetworkError::Cancelled(value)
    }
}
// endregion Errors

// region Report
/// Processing state of a reaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReactionState {
    Unprocessed,
    Decomposed,
    Matched,
    EdgesEmitted,
    /// The reaction contributes nothing to the network
    Skipped(ReactionError),
}

impl ReactionState {
    /// Move on to the next processing step
    ///
    /// Emitted and skipped reactions are final.
    pub fn advance(self) -> Self {
        match self {
            ReactionState::Unprocessed => ReactionState::Decomposed,
            ReactionState::Decomposed => ReactionState::Matched,
            ReactionState::Matched => ReactionState::EdgesEmitted,
            done => done,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ReactionState::Skipped(_))
    }
}

impl Display for ReactionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactionState::Unprocessed => write!(f, "unprocessed"),
            ReactionState::Decomposed => write!(f, "decomposed"),
            ReactionState::Matched => write!(f, "matched"),
            ReactionState::EdgesEmitted => write!(f, "edges emitted"),
            ReactionState::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// Run level metadata about a generation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationReport {
    /// Final state of every reaction, in processing order
    pub states: IndexMap<String, ReactionState>,
    /// Reactions no other reaction of the pathway feeds
    pub reactions_without_preceding: Vec<String>,
    pub catalyst_edges: usize,
    pub positive_regulator_edges: usize,
    pub negative_regulator_edges: usize,
    /// Transformation edges from an entity to itself
    pub self_loop_edges: usize,
}

impl GenerationReport {
    /// Skipped reactions, with the reason each was skipped
    pub fn skipped(&self) -> impl Iterator<Item = (&str, &ReactionError)> {
        self.states.iter().filter_map(|(id, state)| match state {
            ReactionState::Skipped(reason) => Some((id.as_str(), reason)),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    pub fn emitted_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == ReactionState::EdgesEmitted)
            .count()
    }
}
// endregion Report

/// Everything produced by one generation run
#[derive(Clone, Debug)]
pub struct GenerationResult {
    pub network: LogicNetwork,
    /// Matched (input, output) combination pairs, in emission order
    pub virtual_reactions: Vec<VirtualReaction>,
    pub report: GenerationReport,
    /// Node identifiers allocated during the run
    pub identities: IdentityCache,
}

/// Outcome of the preparation stage for one reaction
#[derive(Clone, Debug, PartialEq)]
struct PreparedReaction {
    reaction_id: String,
    state: ReactionState,
    pairs: Vec<(Combination, Combination)>,
    /// Elementary entities of each regulatory participant, in record order
    regulators: Vec<(Role, IndexSet<String>)>,
}

/// Generates logic networks from pathways
#[derive(Clone, Debug, Default)]
pub struct LogicNetworkBuilder {
    config: GeneratorConfig,
    match_cache: Option<MatchCache>,
}

impl LogicNetworkBuilder {
    pub fn new(config: GeneratorConfig) -> Self {
        LogicNetworkBuilder {
            config,
            match_cache: None,
        }
    }

    /// Reuse pairings from an earlier run instead of matching the reactions the cache covers
    ///
    /// Cached pairs that do not fit a reaction's combinations are ignored for that reaction.
    pub fn with_match_cache(mut self, cache: MatchCache) -> Self {
        self.match_cache = Some(cache);
        self
    }

    /// Like [`LogicNetworkBuilder::with_match_cache`], reading the cache from JSON rows
    ///
    /// A cache that can not be read, or that lacks required columns, is ignored and every
    /// reaction is recomputed.
    pub fn with_match_cache_json(mut self, json: &str) -> Self {
        match MatchCache::from_json_str(json) {
            Ok(cache) => self.match_cache = Some(cache),
            Err(err) => {
                warn!("Ignoring match cache, recomputing all reactions: {}", err);
                self.match_cache = None;
            }
        }
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn match_cache(&self) -> Option<&MatchCache> {
        self.match_cache.as_ref()
    }

    /// Generate the logic network of a pathway
    ///
    /// # Parameters
    /// - `pathway`: The pathway; its reactions are those mentioned by its connections
    ///
    /// # Returns
    /// - `Ok`: the network, its virtual reactions, and a report listing every skipped reaction
    /// - `Err`: the entity nesting is cyclic, or the run was cancelled
    ///
    /// # Examples
    /// ```rust
    /// use logicnet_core::network::builder::LogicNetworkBuilder;
    /// use logicnet_core::pathway::entity::PhysicalEntity;
    /// use logicnet_core::pathway::model::Pathway;
    /// use logicnet_core::pathway::reaction::{Reaction, Role};
    /// let mut pathway = Pathway::new_empty();
    /// for id in ["A", "B"] {
    ///     pathway.add_entity(PhysicalEntity::simple(id));
    /// }
    /// let mut reaction = Reaction::new("R1");
    /// reaction.add_participant(Role::Input, "A");
    /// reaction.add_participant(Role::Output, "B");
    /// pathway.add_reaction(reaction);
    /// pathway.add_connection("R1", None);
    /// let result = LogicNetworkBuilder::default().generate(&pathway).unwrap();
    /// assert_eq!(result.network.len(), 1);
    /// ```
    pub fn generate(&self, pathway: &Pathway) -> Result<GenerationResult, NetworkError> {
        if let Some(cycle) = pathway.catalog.find_cycle() {
            return Err(NetworkError::CyclicEntityRef(cycle));
        }
        let universe: Vec<&str> = pathway.reaction_universe().into_iter().collect();
        info!(
            "Generating logic network for {} reactions over {} entities",
            universe.len(),
            pathway.catalog.len()
        );

        is_cancelled!()?;
        let prepared = self.prepare_all(pathway, &universe)?;
        is_cancelled!()?;
        self.emit(pathway, prepared)
    }

    /// Allocate identifiers and emit the edges of prepared reactions, in order
    fn emit(
        &self,
        pathway: &Pathway,
        prepared: Vec<PreparedReaction>,
    ) -> Result<GenerationResult, NetworkError> {
        let namespace = self.config.namespace.unwrap_or_else(Uuid::new_v4);
        let mut identities = IdentityCache::with_namespace(namespace);
        let virtual_namespace = Uuid::new_v5(&namespace, b"virtual-reaction");
        let logic = transformation_logic(pathway, &prepared);

        let mut network = LogicNetwork::new();
        let mut virtual_reactions = Vec::new();
        let mut report = GenerationReport {
            reactions_without_preceding: pathway
                .reactions_without_preceding()
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..GenerationReport::default()
        };

        for reaction in prepared {
            is_cancelled!()?;
            let PreparedReaction {
                reaction_id,
                state,
                pairs,
                regulators,
            } = reaction;
            if state.is_skipped() {
                report.states.insert(reaction_id, state);
                continue;
            }

            let mut reaction_outputs: IndexSet<&str> = IndexSet::new();
            let edges_before = network.len();
            for (index, (input, output)) in pairs.iter().enumerate() {
                for target in output.iter() {
                    reaction_outputs.insert(target);
                }
                for source in input.iter() {
                    for target in output.iter() {
                        // Every produced entity has an entry
                        let (and_or, edge_type) = logic
                            .get(target)
                            .copied()
                            .unwrap_or((AndOr::And, EdgeType::Input));
                        if source == target {
                            report.self_loop_edges += 1;
                        }
                        network.push(Edge {
                            source_id: identities.id_for(source).to_string(),
                            target_id: identities.id_for(target).to_string(),
                            pos_neg: PosNeg::Pos,
                            and_or: Some(and_or),
                            edge_type,
                        });
                    }
                }
                let virtual_id = Uuid::new_v5(
                    &virtual_namespace,
                    format!("{}#{}", reaction_id, index).as_bytes(),
                );
                virtual_reactions.push(VirtualReaction::new(
                    virtual_id.to_string(),
                    &reaction_id,
                    input.clone(),
                    output.clone(),
                ));
            }

            for (role, sources) in &regulators {
                let (pos_neg, edge_type) = match role {
                    Role::Catalyst => (PosNeg::Pos, EdgeType::Catalyst),
                    Role::NegativeRegulator => (PosNeg::Neg, EdgeType::Regulator),
                    _ => (PosNeg::Pos, EdgeType::Regulator),
                };
                for source in sources {
                    for target in &reaction_outputs {
                        network.push(Edge {
                            source_id: identities.id_for(source).to_string(),
                            target_id: identities.id_for(target).to_string(),
                            pos_neg,
                            and_or: None,
                            edge_type,
                        });
                        match role {
                            Role::Catalyst => report.catalyst_edges += 1,
                            Role::NegativeRegulator => report.negative_regulator_edges += 1,
                            _ => report.positive_regulator_edges += 1,
                        }
                    }
                }
            }

            debug!(
                "Reaction {}: {} virtual reactions, {} edges",
                reaction_id,
                pairs.len(),
                network.len() - edges_before
            );
            report.states.insert(reaction_id, state.advance());
        }

        info!(
            "Generated {} edges from {} reactions, skipped {}",
            network.len(),
            report.emitted_count(),
            report.skipped_count()
        );
        Ok(GenerationResult {
            network,
            virtual_reactions,
            report,
            identities,
        })
    }

    /// Read a pathway from its JSON tables, and generate its logic network
    ///
    /// See [`Pathway::from_json_tables`] for the tables. Table errors abort before any
    /// reaction is processed.
    pub fn generate_from_json(
        &self,
        connections: &str,
        participants: &str,
        memberships: &str,
        references: Option<&str>,
    ) -> Result<GenerationResult, NetworkError> {
        let pathway = Pathway::from_json_tables(connections, participants, memberships, references)?;
        self.generate(&pathway)
    }

    cfg_if::cfg_if! {
        if #[cfg(feature = "parallel")] {
            /// Prepare every reaction on the rayon thread pool, one decomposer per worker
            ///
            /// Results are collected in universe order.
            fn prepare_all(
                &self,
                pathway: &Pathway,
                universe: &[&str],
            ) -> Result<Vec<PreparedReaction>, NetworkError> {
                use rayon::prelude::*;

                let matcher = self.matcher(pathway);
                universe
                    .par_iter()
                    .map_init(
                        || self.decomposer(pathway),
                        |decomposer, reaction_id| -> Result<PreparedReaction, NetworkError> {
                            is_cancelled!()?;
                            Ok(self.prepare(pathway, reaction_id, decomposer, &matcher))
                        },
                    )
                    .collect()
            }
        } else {
            fn prepare_all(
                &self,
                pathway: &Pathway,
                universe: &[&str],
            ) -> Result<Vec<PreparedReaction>, NetworkError> {
                self.prepare_in_order(pathway, universe)
            }
        }
    }

    /// Prepare every reaction in order, sharing one decomposer
    #[cfg_attr(all(feature = "parallel", not(test)), allow(dead_code))]
    fn prepare_in_order(
        &self,
        pathway: &Pathway,
        universe: &[&str],
    ) -> Result<Vec<PreparedReaction>, NetworkError> {
        let matcher = self.matcher(pathway);
        let mut decomposer = self.decomposer(pathway);
        let mut prepared = Vec::with_capacity(universe.len());
        for reaction_id in universe {
            is_cancelled!()?;
            prepared.push(self.prepare(pathway, reaction_id, &mut decomposer, &matcher));
        }
        Ok(prepared)
    }

    fn decomposer<'p>(&'p self, pathway: &'p Pathway) -> Decomposer<'p> {
        Decomposer::new(
            &pathway.catalog,
            &self.config.canonical_entities,
            self.config.combination_warning_threshold,
        )
    }

    fn matcher<'p>(&self, pathway: &'p Pathway) -> CombinationMatcher<'p> {
        CombinationMatcher::with_catalog(&pathway.catalog, self.config.coverage_policy)
    }

    /// Decompose and match a single reaction, recording why it was skipped on failure
    fn prepare(
        &self,
        pathway: &Pathway,
        reaction_id: &str,
        decomposer: &mut Decomposer,
        matcher: &CombinationMatcher,
    ) -> PreparedReaction {
        let mut prepared = PreparedReaction {
            reaction_id: reaction_id.to_string(),
            state: ReactionState::Unprocessed,
            pairs: Vec::new(),
            regulators: Vec::new(),
        };
        if let Err(err) = self.try_prepare(pathway, &mut prepared, decomposer, matcher) {
            warn!("Skipping reaction {}: {}", reaction_id, err);
            prepared.state = ReactionState::Skipped(err);
        }
        prepared
    }

    fn try_prepare(
        &self,
        pathway: &Pathway,
        prepared: &mut PreparedReaction,
        decomposer: &mut Decomposer,
        matcher: &CombinationMatcher,
    ) -> Result<(), ReactionError> {
        let reaction_id = prepared.reaction_id.as_str();
        let reaction = pathway
            .reactions
            .get(reaction_id)
            .ok_or_else(|| ReactionError::UnknownReaction(reaction_id.to_string()))?;

        let inputs = decomposer.decompose_side(&reaction.inputs)?;
        if inputs.is_empty() {
            return Err(ReactionError::EmptyCombinationSet { side: Role::Input });
        }
        let outputs = decomposer.decompose_side(&reaction.outputs)?;
        if outputs.is_empty() {
            return Err(ReactionError::EmptyCombinationSet { side: Role::Output });
        }
        prepared.state = ReactionState::Decomposed;

        prepared.pairs = match self.cached_pairs(reaction_id, &inputs, &outputs) {
            Some(pairs) => pairs,
            None => matcher.pair(&inputs, &outputs)?,
        };
        prepared.state = ReactionState::Matched;

        for (role, entity_id) in reaction.regulators() {
            let entities = decomposer.elementary_entities(entity_id)?;
            prepared.regulators.push((role, entities));
        }
        Ok(())
    }

    /// Cached pairs of a reaction, if the cache holds pairs for it that are consistent with
    /// the reaction's decomposition
    ///
    /// Cached pairs are only trusted when every cached combination is one of the
    /// reaction's own (non-empty) combinations, otherwise the reaction is matched again.
    fn cached_pairs(
        &self,
        reaction_id: &str,
        inputs: &CombinationSet,
        outputs: &CombinationSet,
    ) -> Option<Vec<(Combination, Combination)>> {
        let pairs = self.match_cache.as_ref()?.pairs_for(reaction_id)?;
        let consistent = !pairs.is_empty()
            && pairs.iter().all(|(input, output)| {
                !input.is_empty()
                    && !output.is_empty()
                    && inputs.contains(input)
                    && outputs.contains(output)
            });
        if !consistent {
            warn!(
                "Cached pairs of reaction {} do not match its combinations, matching it again",
                reaction_id
            );
            return None;
        }
        debug!("Reusing {} cached pairs for reaction {}", pairs.len(), reaction_id);
        Some(pairs.to_vec())
    }
}

/// AND/OR logic of the transformation edges into every produced entity
///
/// An entity consumed within the pathway counts its producers that directly precede one of
/// its consumers; an entity no reaction consumes counts all of its producers. More than one
/// producer makes the entity an OR, otherwise it is an AND.
fn transformation_logic(
    pathway: &Pathway,
    prepared: &[PreparedReaction],
) -> IndexMap<String, (AndOr, EdgeType)> {
    let mut producers: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    let mut consumers: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    let mut preceding: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for reaction in prepared.iter().filter(|r| !r.state.is_skipped()) {
        let reaction_id = reaction.reaction_id.as_str();
        preceding.insert(reaction_id, pathway.preceding_reactions(reaction_id));
        for (input, output) in &reaction.pairs {
            for entity in input.iter() {
                consumers.entry(entity).or_default().insert(reaction_id);
            }
            for entity in output.iter() {
                producers.entry(entity).or_default().insert(reaction_id);
            }
        }
    }

    producers
        .iter()
        .map(|(entity, producing)| {
            let count = match consumers.get(entity) {
                Some(consuming) => {
                    let feeding: IndexSet<&str> = consuming
                        .iter()
                        .filter_map(|consumer| preceding.get(consumer))
                        .flatten()
                        .copied()
                        .collect();
                    producing.iter().filter(|p| feeding.contains(*p)).count()
                }
                None => producing.len(),
            };
            let logic = if count > 1 {
                (AndOr::Or, EdgeType::Output)
            } else {
                (AndOr::And, EdgeType::Input)
            };
            (entity.to_string(), logic)
        })
        .collect()
}
