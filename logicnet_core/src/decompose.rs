//! Decomposition of (possibly nested) complexes and sets into the combinations of elementary
//! entities they can stand for
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use thiserror::Error;

use crate::pathway::combination::Combination;
use crate::pathway::entity::{EntityCatalog, EntityKind};

/// Insertion ordered set of combinations
pub type CombinationSet = IndexSet<Combination>;

/// Errors raised while decomposing an entity
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecompositionError {
    /// A complex without components, or a set without members
    #[error("Entity {entity_id} is malformed: {reason}")]
    MalformedEntityRef { entity_id: String, reason: String },
    /// An entity (transitively) contains itself
    #[error("Entity nesting contains a cycle: {}", .path.join(" -> "))]
    CyclicEntityRef { path: Vec<String> },
    /// An entity is referenced but never defined
    #[error("Entity {0} is not defined in the catalog")]
    UnknownEntity(String),
}

/// Expands entity references into combinations, memoizing every entity it has expanded
///
/// A decomposer lives for a single generation run, over a single catalog.
pub struct Decomposer<'c> {
    catalog: &'c EntityCatalog,
    /// Entities which stand for a single canonical representative instead of their members
    canonical_entities: &'c IndexMap<String, String>,
    /// Number of combinations above which a decomposition is logged as large
    warning_threshold: usize,
    memo: HashMap<String, Arc<CombinationSet>>,
}

/// Work-stack frame of [`Decomposer::decompose`]
enum Frame {
    /// Start expanding an entity (push its children)
    Enter(String),
    /// All children are expanded, combine them
    Exit(String),
}

impl<'c> Decomposer<'c> {
    pub fn new(
        catalog: &'c EntityCatalog,
        canonical_entities: &'c IndexMap<String, String>,
        warning_threshold: usize,
    ) -> Self {
        Decomposer {
            catalog,
            canonical_entities,
            warning_threshold,
            memo: HashMap::new(),
        }
    }

    /// Decompose an entity into every combination of elementary entities it can represent
    ///
    /// # Parameters
    /// - `entity_id`: id of the entity in the catalog
    ///
    /// # Returns
    /// - `Ok`: the combinations, which are empty if some complex along the way can not form
    /// - `Err`: the entity (or one of its descendants) is malformed, unknown, or cyclic
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use logicnet_core::decompose::Decomposer;
    /// use logicnet_core::pathway::entity::{EntityCatalog, PhysicalEntity};
    /// let mut catalog = EntityCatalog::new();
    /// for id in ["A", "B", "C"] {
    ///     catalog.add_entity(PhysicalEntity::simple(id));
    /// }
    /// catalog.add_entity(PhysicalEntity::alternative_set("S", &["B", "C"]));
    /// catalog.add_entity(PhysicalEntity::complex("X", &["A", "S"]));
    /// let canonical = IndexMap::new();
    /// let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
    /// let combinations = decomposer.decompose("X").unwrap();
    /// assert_eq!(combinations.len(), 2);
    /// ```
    pub fn decompose(&mut self, entity_id: &str) -> Result<Arc<CombinationSet>, DecompositionError> {
        if let Some(done) = self.memo.get(entity_id) {
            return Ok(done.clone());
        }

        // Entities entered but not yet exited, which is exactly the current nesting path
        let mut path: IndexSet<String> = IndexSet::new();
        let mut stack = vec![Frame::Enter(entity_id.to_string())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if self.memo.contains_key(&id) {
                        continue;
                    }
                    if let Some(start) = path.get_index_of(&id) {
                        let mut cycle: Vec<String> = path.iter().skip(start).cloned().collect();
                        cycle.push(id);
                        return Err(DecompositionError::CyclicEntityRef { path: cycle });
                    }
                    if let Some(canonical) = self.canonical_entities.get(&id) {
                        let mut combinations = CombinationSet::new();
                        combinations.insert(Combination::singleton(canonical));
                        self.memo.insert(id, Arc::new(combinations));
                        continue;
                    }
                    let entity = self
                        .catalog
                        .get(&id)
                        .ok_or_else(|| DecompositionError::UnknownEntity(id.clone()))?;
                    let children = entity.kind.child_ids();
                    if entity.is_simple() {
                        let mut combinations = CombinationSet::new();
                        combinations.insert(Combination::singleton(&id));
                        self.memo.insert(id, Arc::new(combinations));
                        continue;
                    }
                    if children.is_empty() {
                        return Err(DecompositionError::MalformedEntityRef {
                            reason: format!("{} has nothing to expand into", entity.kind),
                            entity_id: id,
                        });
                    }
                    stack.push(Frame::Exit(id.clone()));
                    // Reversed, so the children are expanded in source order
                    for child in children.iter().rev() {
                        stack.push(Frame::Enter(child.clone()));
                    }
                    path.insert(id);
                }
                Frame::Exit(id) => {
                    path.pop();
                    let combinations = self.combine_children(&id)?;
                    if combinations.len() > self.warning_threshold {
                        warn!(
                            "Large combination set for entity {}: {} combinations",
                            id,
                            combinations.len()
                        );
                    }
                    debug!("Decomposed {} into {} combinations", id, combinations.len());
                    self.memo.insert(id, Arc::new(combinations));
                }
            }
        }

        self.memo
            .get(entity_id)
            .cloned()
            .ok_or_else(|| DecompositionError::UnknownEntity(entity_id.to_string()))
    }

    /// Decompose one side of a reaction
    ///
    /// The side behaves like an anonymous complex of its participants: every participant has
    /// to be present, so the result is the cartesian product of the participants'
    /// combinations. A side without participants has no combination.
    pub fn decompose_side(&mut self, entity_ids: &[String]) -> Result<CombinationSet, DecompositionError> {
        if entity_ids.is_empty() {
            return Ok(CombinationSet::new());
        }
        let mut parts = Vec::with_capacity(entity_ids.len());
        for id in entity_ids {
            parts.push(self.decompose(id)?);
        }
        let combinations = cartesian_product(parts.iter().map(|p| p.as_ref()));
        if combinations.len() > self.warning_threshold {
            warn!(
                "Large combination set for reaction side [{}]: {} combinations",
                entity_ids.join(", "),
                combinations.len()
            );
        }
        Ok(combinations)
    }

    /// Every elementary entity any combination of `entity_id` contains, in first-seen order
    pub fn elementary_entities(&mut self, entity_id: &str) -> Result<IndexSet<String>, DecompositionError> {
        let combinations = self.decompose(entity_id)?;
        Ok(combinations
            .iter()
            .flat_map(|c| c.iter().map(str::to_string))
            .collect())
    }

    /// Combine the (already memoized) expansions of an entity's children
    fn combine_children(&self, entity_id: &str) -> Result<CombinationSet, DecompositionError> {
        let entity = self
            .catalog
            .get(entity_id)
            .ok_or_else(|| DecompositionError::UnknownEntity(entity_id.to_string()))?;
        let mut parts = Vec::with_capacity(entity.kind.child_ids().len());
        for child in entity.kind.child_ids() {
            let part = self
                .memo
                .get(child)
                .ok_or_else(|| DecompositionError::UnknownEntity(child.clone()))?;
            parts.push(part.as_ref());
        }
        Ok(match &entity.kind {
            EntityKind::Simple => {
                let mut combinations = CombinationSet::new();
                combinations.insert(Combination::singleton(entity_id));
                combinations
            }
            EntityKind::Complex(_) => cartesian_product(parts),
            EntityKind::AlternativeSet(_) => union(parts),
        })
    }
}

/// Every way of picking one combination per part, each pick joined into one combination
///
/// An empty part makes the whole product empty.
pub fn cartesian_product<'a, I>(parts: I) -> CombinationSet
where
    I: IntoIterator<Item = &'a CombinationSet>,
{
    let mut product = CombinationSet::new();
    product.insert(Combination::default());
    for part in parts {
        if part.is_empty() {
            return CombinationSet::new();
        }
        let mut next = CombinationSet::with_capacity(product.len() * part.len());
        for prefix in &product {
            for combination in part {
                next.insert(prefix.concat(combination));
            }
        }
        product = next;
    }
    product
}

/// Every combination offered by any part, duplicates collapsed
pub fn union<'a, I>(parts: I) -> CombinationSet
where
    I: IntoIterator<Item = &'a CombinationSet>,
{
    let mut combined = CombinationSet::new();
    for part in parts {
        combined.extend(part.iter().cloned());
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathway::entity::PhysicalEntity;

    fn catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        for id in ["A", "B", "C", "D", "E"] {
            catalog.add_entity(PhysicalEntity::simple(id));
        }
        catalog.add_entity(PhysicalEntity::alternative_set("S1", &["A", "B"]));
        catalog.add_entity(PhysicalEntity::alternative_set("S2", &["C", "D", "E"]));
        catalog.add_entity(PhysicalEntity::complex("C1", &["S1", "S2"]));
        catalog.add_entity(PhysicalEntity::complex("C2", &["C1", "A"]));
        catalog.add_entity(PhysicalEntity::alternative_set("S3", &["C1", "S1"]));
        catalog
    }

    fn set(combinations: &[&[&str]]) -> CombinationSet {
        combinations
            .iter()
            .map(|c| Combination::new(c.iter().copied()))
            .collect()
    }

    #[test]
    fn simple_entity_is_singleton() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let combinations = decomposer.decompose("A").unwrap();
        assert_eq!(combinations.len(), 1);
        assert_eq!(combinations[0], Combination::singleton("A"));
    }

    #[test]
    fn cartesian_law() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let s1 = decomposer.decompose("S1").unwrap();
        let s2 = decomposer.decompose("S2").unwrap();
        let complex = decomposer.decompose("C1").unwrap();
        assert_eq!(complex.len(), s1.len() * s2.len());
        assert!(complex.iter().all(|c| c.len() == 2));
        assert_eq!(
            *complex,
            set(&[
                &["A", "C"],
                &["A", "D"],
                &["A", "E"],
                &["B", "C"],
                &["B", "D"],
                &["B", "E"]
            ])
        );
    }

    #[test]
    fn union_law() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let c1 = decomposer.decompose("C1").unwrap();
        let s1 = decomposer.decompose("S1").unwrap();
        let s3 = decomposer.decompose("S3").unwrap();
        let expected: CombinationSet = c1.iter().chain(s1.iter()).cloned().collect();
        assert_eq!(*s3, expected);
    }

    #[test]
    fn union_collapses_duplicates() {
        let mut catalog = catalog();
        catalog.add_entity(PhysicalEntity::alternative_set("S4", &["S1", "A", "B"]));
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        assert_eq!(*decomposer.decompose("S4").unwrap(), set(&[&["A"], &["B"]]));
    }

    #[test]
    fn nested_complex() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let combinations = decomposer.decompose("C2").unwrap();
        assert_eq!(combinations.len(), 6);
        assert!(combinations.iter().all(|c| c.len() == 3));
        assert!(combinations.contains(&Combination::new(["A", "A", "C"])));
    }

    #[test]
    fn empty_part_empties_product() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        assert!(decomposer.decompose_side(&[]).unwrap().is_empty());
        let empty = CombinationSet::new();
        let full = decomposer.decompose("C2").unwrap();
        assert!(cartesian_product([full.as_ref(), &empty]).is_empty());
        assert_eq!(union([full.as_ref(), &empty]), *full);
    }

    #[test]
    fn malformed_complex() {
        let mut catalog = catalog();
        catalog.add_entity(PhysicalEntity::complex("Empty", &[]));
        catalog.add_entity(PhysicalEntity::complex("HoldsEmpty", &["A", "Empty"]));
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        match decomposer.decompose("HoldsEmpty") {
            Err(DecompositionError::MalformedEntityRef { entity_id, .. }) => {
                assert_eq!(entity_id, "Empty")
            }
            other => panic!("Expected malformed entity, got {:?}", other),
        }
    }

    #[test]
    fn malformed_set() {
        let mut catalog = catalog();
        catalog.add_entity(PhysicalEntity::alternative_set("EmptySet", &[]));
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        assert!(matches!(
            decomposer.decompose("EmptySet"),
            Err(DecompositionError::MalformedEntityRef { .. })
        ));
    }

    #[test]
    fn unknown_entity() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        assert_eq!(
            decomposer.decompose("Z"),
            Err(DecompositionError::UnknownEntity("Z".to_string()))
        );
    }

    #[test]
    fn cycle_is_detected() {
        let mut catalog = catalog();
        catalog.add_entity(PhysicalEntity::complex("Loop1", &["A", "Loop2"]));
        catalog.add_entity(PhysicalEntity::alternative_set("Loop2", &["B", "Loop1"]));
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        match decomposer.decompose("Loop1") {
            Err(DecompositionError::CyclicEntityRef { path }) => {
                assert_eq!(path, vec!["Loop1", "Loop2", "Loop1"])
            }
            other => panic!("Expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn canonical_entity_is_not_expanded() {
        let catalog = catalog();
        let mut canonical = IndexMap::new();
        canonical.insert("S2".to_string(), "C".to_string());
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let combinations = decomposer.decompose("C1").unwrap();
        assert_eq!(*combinations, set(&[&["A", "C"], &["B", "C"]]));
    }

    #[test]
    fn reaction_side_is_a_product() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let side = decomposer
            .decompose_side(&["S1".to_string(), "C".to_string()])
            .unwrap();
        assert_eq!(side, set(&[&["A", "C"], &["B", "C"]]));
    }

    #[test]
    fn elementary_entities_in_first_seen_order() {
        let catalog = catalog();
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let entities: Vec<String> = decomposer.elementary_entities("C1").unwrap().into_iter().collect();
        assert_eq!(entities, vec!["A", "C", "D", "E", "B"]);
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut catalog = EntityCatalog::new();
        catalog.add_entity(PhysicalEntity::simple("leaf"));
        let mut previous = "leaf".to_string();
        for depth in 0..50_000 {
            let id = format!("level{}", depth);
            catalog.add_entity(PhysicalEntity::complex(&id, &[previous.as_str()]));
            previous = id;
        }
        let canonical = IndexMap::new();
        let mut decomposer = Decomposer::new(&catalog, &canonical, 1000);
        let combinations = decomposer.decompose(&previous).unwrap();
        assert_eq!(*combinations, set(&[&["leaf"]]));
    }
}
