//! This module provides the PhysicalEntity struct, and the catalog holding every entity
//! definition of a pathway
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use petgraph::algo::{astar, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};

/// Structure of a physical entity
///
/// Complex components and set members are references to other entities of the catalog
/// (by their source id), so shared sub-structures are only defined once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// An elementary entity (small molecule, protein, ...)
    Simple,
    /// A complex, which needs every one of its components to form
    Complex(Vec<String>),
    /// A set of alternative entities, any one of which can stand in for the set
    AlternativeSet(Vec<String>),
}

impl EntityKind {
    /// Ids of the entities directly referenced by this one
    pub fn child_ids(&self) -> &[String] {
        match self {
            EntityKind::Simple => &[],
            EntityKind::Complex(components) => components,
            EntityKind::AlternativeSet(members) => members,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Simple => write!(f, "simple entity"),
            EntityKind::Complex(_) => write!(f, "complex"),
            EntityKind::AlternativeSet(_) => write!(f, "set"),
        }
    }
}

/// Represents a physical entity of the pathway
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct PhysicalEntity {
    /// Stable source id of the entity (must be unique)
    pub id: String,
    /// Structure of the entity
    #[builder(default = "EntityKind::Simple")]
    pub kind: EntityKind,
    /// Id of the reference molecule this entity is a form of
    ///
    /// ### Note
    /// Different entities (e.g. a protein and its phosphorylated form) can share one
    /// reference entity, the combination matcher counts those as the same molecule.
    #[builder(default = "None")]
    pub reference_entity_id: Option<String>,
    /// Human-readable entity name
    #[builder(default = "None")]
    pub name: Option<String>,
}

impl PhysicalEntity {
    /// Create a new elementary entity
    pub fn simple(id: &str) -> Self {
        PhysicalEntity {
            id: id.to_string(),
            kind: EntityKind::Simple,
            reference_entity_id: None,
            name: None,
        }
    }

    /// Create a new complex out of the listed components
    pub fn complex(id: &str, components: &[&str]) -> Self {
        PhysicalEntity {
            id: id.to_string(),
            kind: EntityKind::Complex(components.iter().map(|c| c.to_string()).collect()),
            reference_entity_id: None,
            name: None,
        }
    }

    /// Create a new set of alternative entities
    pub fn alternative_set(id: &str, members: &[&str]) -> Self {
        PhysicalEntity {
            id: id.to_string(),
            kind: EntityKind::AlternativeSet(members.iter().map(|m| m.to_string()).collect()),
            reference_entity_id: None,
            name: None,
        }
    }

    pub fn is_simple(&self) -> bool {
        self.kind == EntityKind::Simple
    }
}

/// All entity definitions of a pathway, keyed by entity id
#[derive(Clone, Debug, Default)]
pub struct EntityCatalog {
    entities: IndexMap<String, PhysicalEntity>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        EntityCatalog {
            entities: IndexMap::new(),
        }
    }

    /// Add an entity to the catalog, replacing any previous definition with the same id
    ///
    /// # Examples
    /// ```rust
    /// use logicnet_core::pathway::entity::{EntityCatalog, PhysicalEntity};
    /// let mut catalog = EntityCatalog::new();
    /// catalog.add_entity(PhysicalEntity::simple("ATP"));
    /// catalog.add_entity(PhysicalEntity::complex("ATP:Mg", &["ATP", "Mg2+"]));
    /// assert_eq!(catalog.len(), 2);
    /// ```
    pub fn add_entity(&mut self, entity: PhysicalEntity) {
        let id = entity.id.clone();
        self.entities.insert(id, entity);
    }

    pub fn get(&self, entity_id: &str) -> Option<&PhysicalEntity> {
        self.entities.get(entity_id)
    }

    pub fn get_mut(&mut self, entity_id: &str) -> Option<&mut PhysicalEntity> {
        self.entities.get_mut(entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysicalEntity> {
        self.entities.values()
    }

    /// Key under which the matcher compares an entity: its reference entity if it has one,
    /// otherwise its own id
    pub fn canonical_key<'a>(&'a self, entity_id: &'a str) -> &'a str {
        self.entities
            .get(entity_id)
            .and_then(|e| e.reference_entity_id.as_deref())
            .unwrap_or(entity_id)
    }

    /// Graph of the nesting, with an edge from every complex or set to each entity it
    /// directly references
    ///
    /// Nodes follow catalog order. Ids referenced but not defined in the catalog have no node.
    pub fn nesting_graph(&self) -> DiGraph<&str, ()> {
        let mut graph = DiGraph::with_capacity(self.entities.len(), 0);
        for id in self.entities.keys() {
            graph.add_node(id.as_str());
        }
        for (parent, entity) in self.entities.values().enumerate() {
            for child in entity.kind.child_ids() {
                if let Some(child) = self.entities.get_index_of(child.as_str()) {
                    graph.update_edge(NodeIndex::new(parent), NodeIndex::new(child), ());
                }
            }
        }
        graph
    }

    /// Look for a complex or set that (transitively) contains itself
    ///
    /// # Returns
    /// - `Some(path)`: the ids along the cycle, starting and ending with the same entity
    /// - `None`: the nesting is acyclic
    ///
    /// Ids referenced but not defined in the catalog are treated as leaves here. When there
    /// are several cycles, the one through the earliest defined entity is reported.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let graph = self.nesting_graph();
        let components = tarjan_scc(&graph);
        let (start, component) = components
            .iter()
            .filter(|c| c.len() > 1 || graph.contains_edge(c[0], c[0]))
            .filter_map(|c| c.iter().min().map(|start| (*start, c)))
            .min_by_key(|(start, _)| *start)?;

        let mut cycle = vec![graph[start].to_string()];
        if graph.contains_edge(start, start) {
            cycle.push(graph[start].to_string());
            return Some(cycle);
        }
        // Every member of the component reaches back to the start
        let next = graph
            .neighbors(start)
            .filter(|n| component.contains(n))
            .min()?;
        let (_, path) = astar(&graph, next, |n| n == start, |_| 1usize, |_| 0usize)?;
        cycle.extend(path.into_iter().map(|n| graph[n].to_string()));
        Some(cycle)
    }
}
