//! This module provides the Pathway struct for representing everything the network builder
//! needs to know about one pathway
use indexmap::{IndexMap, IndexSet};

use crate::pathway::entity::{EntityCatalog, PhysicalEntity};
use crate::pathway::reaction::{Reaction, ReactionConnection};

/// Represents a pathway: its entity definitions, its reactions, and how the reactions connect
#[derive(Clone, Debug, Default)]
pub struct Pathway {
    /// Definitions of every entity referenced by the reactions
    pub catalog: EntityCatalog,
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
    /// Reaction adjacency, in source order
    pub connections: Vec<ReactionConnection>,
}

impl Pathway {
    pub fn new_empty() -> Self {
        Pathway {
            catalog: EntityCatalog::new(),
            reactions: IndexMap::new(),
            connections: Vec::new(),
        }
    }

    /// Add a reaction to the pathway
    ///
    /// # Examples
    /// ```rust
    /// use logicnet_core::pathway::model::Pathway;
    /// use logicnet_core::pathway::reaction::{Reaction, Role};
    /// let mut pathway = Pathway::new_empty();
    /// let mut reaction = Reaction::new("R1");
    /// reaction.add_participant(Role::Input, "A");
    /// reaction.add_participant(Role::Output, "B");
    /// pathway.add_reaction(reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add an entity definition to the pathway
    pub fn add_entity(&mut self, entity: PhysicalEntity) {
        self.catalog.add_entity(entity);
    }

    /// Record that `preceding` feeds `following`
    pub fn add_connection(&mut self, preceding: &str, following: Option<&str>) {
        self.connections
            .push(ReactionConnection::new(preceding, following));
    }

    /// Ids of every reaction mentioned by the connections, in order of first appearance
    ///
    /// # Note:
    /// Rows are read in order, the preceding id before the following id.
    pub fn reaction_universe(&self) -> IndexSet<&str> {
        let mut universe = IndexSet::new();
        for connection in &self.connections {
            universe.insert(connection.preceding_reaction_id.as_str());
            if let Some(following) = &connection.following_reaction_id {
                universe.insert(following.as_str());
            }
        }
        universe
    }

    /// Ids of the reactions directly feeding `reaction_id`
    pub fn preceding_reactions(&self, reaction_id: &str) -> IndexSet<&str> {
        self.connections
            .iter()
            .filter(|c| c.following_reaction_id.as_deref() == Some(reaction_id))
            .map(|c| c.preceding_reaction_id.as_str())
            .collect()
    }

    /// Reactions of the pathway which no other reaction feeds
    pub fn reactions_without_preceding(&self) -> Vec<&str> {
        let followers: IndexSet<&str> = self
            .connections
            .iter()
            .filter_map(|c| c.following_reaction_id.as_deref())
            .collect();
        self.reaction_universe()
            .into_iter()
            .filter(|id| !followers.contains(id))
            .collect()
    }
}
