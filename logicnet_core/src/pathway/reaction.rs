//! This module provides structs for representing reactions, their matched virtual reactions,
//! and the connections between reactions
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::pathway::combination::Combination;

/// Role a physical entity plays in a reaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Consumed by the reaction
    Input,
    /// Produced by the reaction
    Output,
    /// Catalyses the reaction
    Catalyst,
    /// Up-regulates the reaction
    PositiveRegulator,
    /// Down-regulates the reaction
    NegativeRegulator,
}

impl Role {
    /// Whether the role modulates the reaction rather than taking part in the transformation
    pub fn is_regulatory(&self) -> bool {
        !matches!(self, Role::Input | Role::Output)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Input => write!(f, "input"),
            Role::Output => write!(f, "output"),
            Role::Catalyst => write!(f, "catalyst"),
            Role::PositiveRegulator => write!(f, "positive_regulator"),
            Role::NegativeRegulator => write!(f, "negative_regulator"),
        }
    }
}

/// Represents a reaction of the pathway
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct Reaction {
    /// Stable source id of the reaction
    pub id: String,
    /// Ids of the input entities, in source order
    #[builder(default = "Vec::new()")]
    pub inputs: Vec<String>,
    /// Ids of the output entities, in source order
    #[builder(default = "Vec::new()")]
    pub outputs: Vec<String>,
    /// Ids of the catalyst entities
    #[builder(default = "Vec::new()")]
    pub catalysts: Vec<String>,
    /// Ids of the positive regulator entities
    #[builder(default = "Vec::new()")]
    pub positive_regulators: Vec<String>,
    /// Ids of the negative regulator entities
    #[builder(default = "Vec::new()")]
    pub negative_regulators: Vec<String>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
}

impl Reaction {
    /// Create a reaction without any participants
    pub fn new(id: &str) -> Self {
        Reaction {
            id: id.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            catalysts: Vec::new(),
            positive_regulators: Vec::new(),
            negative_regulators: Vec::new(),
            name: None,
        }
    }

    /// Add a participating entity in the given role
    pub fn add_participant(&mut self, role: Role, entity_id: &str) {
        self.participants_mut(role).push(entity_id.to_string());
    }

    /// Ids of the entities participating in the given role
    pub fn participants(&self, role: Role) -> &[String] {
        match role {
            Role::Input => &self.inputs,
            Role::Output => &self.outputs,
            Role::Catalyst => &self.catalysts,
            Role::PositiveRegulator => &self.positive_regulators,
            Role::NegativeRegulator => &self.negative_regulators,
        }
    }

    fn participants_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Input => &mut self.inputs,
            Role::Output => &mut self.outputs,
            Role::Catalyst => &mut self.catalysts,
            Role::PositiveRegulator => &mut self.positive_regulators,
            Role::NegativeRegulator => &mut self.negative_regulators,
        }
    }

    /// Regulatory participants in record order: catalysts, positive then negative regulators
    pub fn regulators(&self) -> impl Iterator<Item = (Role, &str)> {
        [
            Role::Catalyst,
            Role::PositiveRegulator,
            Role::NegativeRegulator,
        ]
        .into_iter()
        .flat_map(move |role| {
            self.participants(role)
                .iter()
                .map(move |id| (role, id.as_str()))
        })
    }
}

/// One matched (input combination, output combination) pair of a reaction
///
/// Virtual reactions are created by the network builder, and never change afterward.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VirtualReaction {
    id: String,
    reaction_id: String,
    input: Combination,
    output: Combination,
}

impl VirtualReaction {
    pub(crate) fn new(id: String, reaction_id: &str, input: Combination, output: Combination) -> Self {
        VirtualReaction {
            id,
            reaction_id: reaction_id.to_string(),
            input,
            output,
        }
    }

    /// Id of the virtual reaction, distinct from the id of the reaction it was drawn from
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the reaction this virtual reaction was drawn from
    pub fn reaction_id(&self) -> &str {
        &self.reaction_id
    }

    pub fn input(&self) -> &Combination {
        &self.input
    }

    pub fn output(&self) -> &Combination {
        &self.output
    }
}

/// A (preceding reaction, following reaction) pair, stating that the first feeds the second
///
/// A connection without a following reaction lists a reaction that feeds nothing else in
/// the pathway.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionConnection {
    pub preceding_reaction_id: String,
    pub following_reaction_id: Option<String>,
}

impl ReactionConnection {
    pub fn new(preceding_reaction_id: &str, following_reaction_id: Option<&str>) -> Self {
        ReactionConnection {
            preceding_reaction_id: preceding_reaction_id.to_string(),
            following_reaction_id: following_reaction_id.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participants_by_role() {
        let mut reaction = Reaction::new("R-HSA-70171");
        reaction.add_participant(Role::Input, "glucose");
        reaction.add_participant(Role::Input, "ATP");
        reaction.add_participant(Role::Output, "glucose-6P");
        reaction.add_participant(Role::Catalyst, "HK1");
        assert_eq!(reaction.participants(Role::Input), &["glucose", "ATP"]);
        assert_eq!(reaction.participants(Role::Output), &["glucose-6P"]);
        assert!(reaction.participants(Role::NegativeRegulator).is_empty());
    }

    #[test]
    fn regulators_in_record_order() {
        let reaction = ReactionBuilder::default()
            .id("R1".to_string())
            .negative_regulators(vec!["N".to_string()])
            .positive_regulators(vec!["P".to_string()])
            .catalysts(vec!["C1".to_string(), "C2".to_string()])
            .build()
            .unwrap();
        let regulators: Vec<(Role, &str)> = reaction.regulators().collect();
        assert_eq!(
            regulators,
            vec![
                (Role::Catalyst, "C1"),
                (Role::Catalyst, "C2"),
                (Role::PositiveRegulator, "P"),
                (Role::NegativeRegulator, "N"),
            ]
        );
        assert!(regulators.iter().all(|(role, _)| role.is_regulatory()));
    }

    #[test]
    fn role_serialization() {
        let role: Role = serde_json::from_str("\"positive_regulator\"").unwrap();
        assert_eq!(role, Role::PositiveRegulator);
        assert_eq!(Role::NegativeRegulator.to_string(), "negative_regulator");
    }
}
