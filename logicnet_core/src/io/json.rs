//! Module providing JSON IO for pathway tables and logic networks
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::io::{id_string, optional_id_string, parse_table, TableError};
use crate::network::{EdgeType, LogicNetwork, PosNeg};
use crate::pathway::combination::Combination;
use crate::pathway::entity::{EntityKind, PhysicalEntity};
use crate::pathway::model::Pathway;
use crate::pathway::reaction::{Reaction, Role, VirtualReaction};

pub const REACTION_CONNECTIONS: &str = "reaction_connections";
pub const REACTION_PARTICIPANTS: &str = "reaction_participants";
pub const ENTITY_MEMBERSHIPS: &str = "entity_memberships";
pub const REFERENCE_ENTITIES: &str = "reference_entities";

// region Rows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionConnectionRow {
    #[serde(deserialize_with = "id_string")]
    pub preceding_reaction_id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub following_reaction_id: Option<String>,
}

impl ReactionConnectionRow {
    const COLUMNS: [&'static str; 2] = ["preceding_reaction_id", "following_reaction_id"];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRow {
    #[serde(deserialize_with = "id_string")]
    pub reaction_id: String,
    pub role: Role,
    #[serde(deserialize_with = "id_string")]
    pub entity_id: String,
}

impl ParticipantRow {
    const COLUMNS: [&'static str; 3] = ["reaction_id", "role", "entity_id"];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Complex,
    Set,
}

/// One (parent, member) relation of a complex or set
///
/// A row without a member declares the parent, so that complexes and sets without any
/// member can be represented.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MembershipRow {
    #[serde(deserialize_with = "id_string")]
    pub parent_entity_id: String,
    pub parent_kind: ParentKind,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub member_entity_id: Option<String>,
}

impl MembershipRow {
    const COLUMNS: [&'static str; 3] = ["parent_entity_id", "parent_kind", "member_entity_id"];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntityRow {
    #[serde(deserialize_with = "id_string")]
    pub entity_id: String,
    #[serde(deserialize_with = "id_string")]
    pub reference_entity_id: String,
}

impl ReferenceEntityRow {
    const COLUMNS: [&'static str; 2] = ["entity_id", "reference_entity_id"];
}

/// Edge of a logic network, as written out
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub source_id: String,
    pub target_id: String,
    pub pos_neg: PosNeg,
    /// `and`, `or`, or empty for regulatory edges
    pub and_or: String,
    pub edge_type: EdgeType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualReactionRow {
    pub reaction_id: String,
    pub virtual_reaction_id: String,
    pub input_combination: Combination,
    pub output_combination: Combination,
}

impl From<&VirtualReaction> for VirtualReactionRow {
    fn from(v: &VirtualReaction) -> Self {
        Self {
            reaction_id: v.reaction_id().to_string(),
            virtual_reaction_id: v.id().to_string(),
            input_combination: v.input().clone(),
            output_combination: v.output().clone(),
        }
    }
}
// endregion Rows

// region Pathway
impl Pathway {
    /// Build a pathway from its JSON tables
    ///
    /// Every table is parsed and checked for its required columns before the pathway is
    /// assembled. Entities which are never the parent of a membership are simple.
    ///
    /// # Parameters
    /// - `connections`: `reaction_connections` rows, which must not be empty
    /// - `participants`: `reaction_participants` rows
    /// - `memberships`: `entity_memberships` rows
    /// - `references`: optional `reference_entities` rows
    pub fn from_json_tables(
        connections: &str,
        participants: &str,
        memberships: &str,
        references: Option<&str>,
    ) -> Result<Pathway, TableError> {
        let connections: Vec<ReactionConnectionRow> = parse_table(
            REACTION_CONNECTIONS,
            connections,
            &ReactionConnectionRow::COLUMNS,
        )?;
        let participants: Vec<ParticipantRow> =
            parse_table(REACTION_PARTICIPANTS, participants, &ParticipantRow::COLUMNS)?;
        let memberships: Vec<MembershipRow> =
            parse_table(ENTITY_MEMBERSHIPS, memberships, &MembershipRow::COLUMNS)?;
        let references: Vec<ReferenceEntityRow> = match references {
            Some(json) => parse_table(REFERENCE_ENTITIES, json, &ReferenceEntityRow::COLUMNS)?,
            None => Vec::new(),
        };
        Pathway::from_rows(connections, participants, memberships, references)
    }

    /// Read a pathway from a directory holding one `<table>.json` file per table
    ///
    /// `reference_entities.json` is optional.
    pub fn read_json_tables<P: AsRef<Path>>(dir: P) -> Result<Pathway, TableError> {
        let dir = dir.as_ref();
        let read = |table: &str| -> Result<String, TableError> {
            fs::read_to_string(dir.join(format!("{}.json", table)))
                .map_err(|err| TableError::UnableToRead(format!("{}: {:?}", table, err)))
        };
        let connections = read(REACTION_CONNECTIONS)?;
        let participants = read(REACTION_PARTICIPANTS)?;
        let memberships = read(ENTITY_MEMBERSHIPS)?;
        let references = if dir.join(format!("{}.json", REFERENCE_ENTITIES)).exists() {
            Some(read(REFERENCE_ENTITIES)?)
        } else {
            None
        };
        info!("Read pathway tables from {}", dir.display());
        Pathway::from_json_tables(
            &connections,
            &participants,
            &memberships,
            references.as_deref(),
        )
    }

    fn from_rows(
        connections: Vec<ReactionConnectionRow>,
        participants: Vec<ParticipantRow>,
        memberships: Vec<MembershipRow>,
        references: Vec<ReferenceEntityRow>,
    ) -> Result<Pathway, TableError> {
        if connections.is_empty() {
            return Err(TableError::EmptyTable {
                table: REACTION_CONNECTIONS.to_string(),
            });
        }
        let mut pathway = Pathway::new_empty();

        // Complexes and sets, with their members in row order
        let mut parents: IndexMap<String, (ParentKind, Vec<String>)> = IndexMap::new();
        for row in &memberships {
            let (kind, members) = parents
                .entry(row.parent_entity_id.clone())
                .or_insert_with(|| (row.parent_kind, Vec::new()));
            if *kind != row.parent_kind {
                return Err(TableError::InvalidValue {
                    table: ENTITY_MEMBERSHIPS.to_string(),
                    reason: format!(
                        "entity {} is listed as both a complex and a set",
                        row.parent_entity_id
                    ),
                });
            }
            if let Some(member) = &row.member_entity_id {
                members.push(member.clone());
            }
        }
        for (id, (kind, members)) in parents {
            let kind = match kind {
                ParentKind::Complex => EntityKind::Complex(members),
                ParentKind::Set => EntityKind::AlternativeSet(members),
            };
            pathway.add_entity(PhysicalEntity {
                id,
                kind,
                reference_entity_id: None,
                name: None,
            });
        }
        let leaves = memberships
            .iter()
            .filter_map(|row| row.member_entity_id.as_ref())
            .chain(participants.iter().map(|row| &row.entity_id));
        for id in leaves {
            if !pathway.catalog.contains(id) {
                pathway.add_entity(PhysicalEntity::simple(id));
            }
        }
        for row in references {
            match pathway.catalog.get_mut(&row.entity_id) {
                Some(entity) => entity.reference_entity_id = Some(row.reference_entity_id),
                None => debug!(
                    "Ignoring reference entity of {}, which no reaction uses",
                    row.entity_id
                ),
            }
        }

        for row in participants {
            if !pathway.reactions.contains_key(&row.reaction_id) {
                pathway.add_reaction(Reaction::new(&row.reaction_id));
            }
            if let Some(reaction) = pathway.reactions.get_mut(&row.reaction_id) {
                reaction.add_participant(row.role, &row.entity_id);
            }
        }
        for row in connections {
            pathway.add_connection(
                &row.preceding_reaction_id,
                row.following_reaction_id.as_deref(),
            );
        }
        debug!(
            "Built pathway with {} reactions, {} entities and {} connections",
            pathway.reactions.len(),
            pathway.catalog.len(),
            pathway.connections.len()
        );
        Ok(pathway)
    }
}
// endregion Pathway

// region Network
impl LogicNetwork {
    /// The edges as output rows
    pub fn to_rows(&self) -> Vec<EdgeRow> {
        self.edges()
            .iter()
            .map(|e| EdgeRow {
                source_id: e.source_id.clone(),
                target_id: e.target_id.clone(),
                pos_neg: e.pos_neg,
                and_or: e.and_or.map(|a| a.to_string()).unwrap_or_default(),
                edge_type: e.edge_type,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string(&self.to_rows())?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let network_string = self.to_json()?;
        fs::write(path, network_string)?;
        Ok(())
    }
}

/// Serialize virtual reactions as rows, which can be read back as a match cache
pub fn virtual_reactions_to_json(virtual_reactions: &[VirtualReaction]) -> Result<String, TableError> {
    let rows: Vec<VirtualReactionRow> = virtual_reactions.iter().map(VirtualReactionRow::from).collect();
    Ok(serde_json::to_string(&rows)?)
}
// endregion Network

#[cfg(test)]
mod json_tests {
    use std::path::PathBuf;

    use super::*;
    use crate::network::builder::{GeneratorConfigBuilder, LogicNetworkBuilder};
    use crate::network::AndOr;
    use uuid::Uuid;

    fn test_data() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("pathway")
    }

    const CONNECTIONS: &str = r#"[{"preceding_reaction_id": "R1", "following_reaction_id": null}]"#;
    const PARTICIPANTS: &str = r#"[
        {"reaction_id": "R1", "role": "input", "entity_id": "C1"},
        {"reaction_id": "R1", "role": "output", "entity_id": "D"}
    ]"#;
    const MEMBERSHIPS: &str = r#"[
        {"parent_entity_id": "C1", "parent_kind": "complex", "member_entity_id": "A"},
        {"parent_entity_id": "C1", "parent_kind": "complex", "member_entity_id": 42}
    ]"#;

    #[test]
    fn tables_to_pathway() {
        let references = r#"[{"entity_id": "A", "reference_entity_id": 15422}]"#;
        let pathway =
            Pathway::from_json_tables(CONNECTIONS, PARTICIPANTS, MEMBERSHIPS, Some(references))
                .unwrap();
        assert_eq!(
            pathway.catalog.get("C1").unwrap().kind,
            EntityKind::Complex(vec!["A".to_string(), "42".to_string()])
        );
        assert!(pathway.catalog.get("42").unwrap().is_simple());
        assert!(pathway.catalog.get("D").unwrap().is_simple());
        assert_eq!(pathway.catalog.canonical_key("A"), "15422");
        let reaction = &pathway.reactions["R1"];
        assert_eq!(reaction.inputs, vec!["C1"]);
        assert_eq!(reaction.outputs, vec!["D"]);
        assert_eq!(pathway.connections[0].following_reaction_id, None);
    }

    #[test]
    fn missing_column_is_fatal() {
        let participants = r#"[{"reaction_id": "R1", "entity_id": "A"}]"#;
        match Pathway::from_json_tables(CONNECTIONS, participants, MEMBERSHIPS, None) {
            Err(TableError::SchemaMismatch { table, missing, .. }) => {
                assert_eq!(table, REACTION_PARTICIPANTS);
                assert_eq!(missing, vec!["role"]);
            }
            other => panic!("Expected a schema mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_connections_are_fatal() {
        assert!(matches!(
            Pathway::from_json_tables("[]", PARTICIPANTS, MEMBERSHIPS, None),
            Err(TableError::EmptyTable { .. })
        ));
    }

    #[test]
    fn unknown_role() {
        let participants = r#"[{"reaction_id": "R1", "role": "modulator", "entity_id": "A"}]"#;
        assert!(matches!(
            Pathway::from_json_tables(CONNECTIONS, participants, MEMBERSHIPS, None),
            Err(TableError::SerdeJson(_))
        ));
    }

    #[test]
    fn conflicting_parent_kind() {
        let memberships = r#"[
            {"parent_entity_id": "C1", "parent_kind": "complex", "member_entity_id": "A"},
            {"parent_entity_id": "C1", "parent_kind": "set", "member_entity_id": "B"}
        ]"#;
        assert!(matches!(
            Pathway::from_json_tables(CONNECTIONS, PARTICIPANTS, memberships, None),
            Err(TableError::InvalidValue { .. })
        ));
    }

    #[test]
    fn memberless_parent() {
        let memberships = r#"[{"parent_entity_id": "C1", "parent_kind": "set", "member_entity_id": null}]"#;
        let pathway = Pathway::from_json_tables(CONNECTIONS, PARTICIPANTS, memberships, None).unwrap();
        assert_eq!(
            pathway.catalog.get("C1").unwrap().kind,
            EntityKind::AlternativeSet(Vec::new())
        );
        let result = LogicNetworkBuilder::default().generate(&pathway).unwrap();
        assert_eq!(result.report.skipped_count(), 1);
        assert!(result.network.is_empty());
    }

    #[test]
    fn read_pathway_directory() {
        let pathway = Pathway::read_json_tables(test_data()).unwrap();
        assert_eq!(pathway.reactions.len(), 3);
        assert_eq!(pathway.catalog.canonical_key("ATP"), "CHEBI:15422");
        assert!(matches!(
            Pathway::read_json_tables(test_data().join("missing")),
            Err(TableError::UnableToRead(_))
        ));
    }

    #[test]
    fn glycolysis_network() {
        let pathway = Pathway::read_json_tables(test_data()).unwrap();
        let config = GeneratorConfigBuilder::default()
            .namespace(Some(Uuid::new_v5(&Uuid::NAMESPACE_OID, b"glycolysis")))
            .build()
            .unwrap();
        let result = LogicNetworkBuilder::new(config).generate(&pathway).unwrap();
        let network = &result.network;
        let source = |id: &str| result.identities.source_for(id).unwrap();

        assert_eq!(result.report.skipped_count(), 0);
        assert_eq!(network.transformation_edges().count(), 9);
        assert_eq!(result.report.catalyst_edges, 9);
        assert_eq!(result.report.negative_regulator_edges, 2);
        assert_eq!(network.len(), 20);

        let roots: Vec<&str> = network.root_inputs().into_iter().map(source).collect();
        assert_eq!(roots, vec!["ATP", "glucose"]);
        let terminals: Vec<&str> = network.terminal_outputs().into_iter().map(source).collect();
        assert_eq!(terminals, vec!["ADP", "F16BP"]);
        let intermediates: Vec<&str> = network.intermediates().into_iter().map(source).collect();
        assert_eq!(intermediates, vec!["G6P", "F6P"]);

        // ADP is made by both kinase reactions
        let adp = result.identities.get("ADP").unwrap();
        assert!(network
            .edges_into(adp)
            .filter(|e| e.is_transformation())
            .all(|e| e.and_or == Some(AndOr::Or) && e.edge_type == EdgeType::Output));
        let g6p = result.identities.get("G6P").unwrap();
        assert!(network
            .edges_into(g6p)
            .filter(|e| e.is_transformation())
            .all(|e| e.and_or == Some(AndOr::And) && e.edge_type == EdgeType::Input));
    }

    #[test]
    fn edge_rows() {
        let pathway = Pathway::read_json_tables(test_data()).unwrap();
        let result = LogicNetworkBuilder::default().generate(&pathway).unwrap();
        let rows = result.network.to_rows();
        assert_eq!(rows.len(), result.network.len());
        assert!(rows
            .iter()
            .all(|r| r.and_or.is_empty() == (r.edge_type == EdgeType::Catalyst
                || r.edge_type == EdgeType::Regulator)));

        let json = result.network.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value[0];
        for column in ["source_id", "target_id", "pos_neg", "and_or", "edge_type"] {
            assert!(first.get(column).is_some(), "missing column {}", column);
        }
        assert_eq!(first["pos_neg"], "pos");
    }

    #[test]
    fn write_network() {
        let pathway = Pathway::read_json_tables(test_data()).unwrap();
        let result = LogicNetworkBuilder::default().generate(&pathway).unwrap();
        let path = std::env::temp_dir().join(format!("logicnet-{}.json", Uuid::new_v4()));
        result.network.write_json(&path).unwrap();
        let rows: Vec<EdgeRow> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(rows, result.network.to_rows());
    }

    #[test]
    fn virtual_reaction_rows() {
        let pathway = Pathway::read_json_tables(test_data()).unwrap();
        let result = LogicNetworkBuilder::default().generate(&pathway).unwrap();
        let json = virtual_reactions_to_json(&result.virtual_reactions).unwrap();
        let rows: Vec<VirtualReactionRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].reaction_id, "R1");
        assert_eq!(rows[0].input_combination, Combination::new(["glucose", "ATP"]));
        assert_ne!(rows[0].virtual_reaction_id, rows[1].virtual_reaction_id);
    }
}
