//! This module provides the Combination struct, one concrete way of instantiating a physical
//! entity out of elementary entities
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::io::id_string;

/// A multiset of elementary entity ids
///
/// # Note:
/// The ids are kept sorted, so equality, hashing and ordering only depend on which entities
/// (and how many of each) the combination holds, not on the order they were collected in.
/// The derived ordering is lexicographic over the sorted ids, which gives the total order
/// used to break ties when pairing combinations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "Vec<String>")]
pub struct Combination {
    entities: Vec<String>,
}

impl Combination {
    /// Create a new combination from any collection of entity ids
    pub fn new<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entities: Vec<String> = entities.into_iter().map(Into::into).collect();
        entities.sort();
        Combination { entities }
    }

    /// Create a combination holding a single entity
    pub fn singleton(entity_id: &str) -> Self {
        Combination {
            entities: vec![entity_id.to_string()],
        }
    }

    /// Join two combinations into one holding the entities of both
    pub fn concat(&self, other: &Combination) -> Combination {
        let mut entities: Vec<String> = self
            .entities
            .iter()
            .chain(other.entities.iter())
            .cloned()
            .collect();
        entities.sort();
        Combination { entities }
    }

    /// Sorted entity ids of the combination
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities
            .binary_search_by(|id| id.as_str().cmp(entity_id))
            .is_ok()
    }

    /// Whether the two combinations share no entity
    pub fn is_disjoint(&self, other: &Combination) -> bool {
        !self.iter().any(|id| other.contains(id))
    }

    /// Size of the multiset symmetric difference between the two combinations, after mapping
    /// every entity id through `key`
    ///
    /// Entities that map to the same key count as the same entity, which lets callers treat
    /// e.g. two forms of one reference molecule as unchanged.
    pub fn mismatch_by<K, F>(&self, other: &Combination, key: F) -> usize
    where
        K: Ord,
        F: Fn(&str) -> K,
    {
        let mut left: Vec<K> = self.iter().map(&key).collect();
        let mut right: Vec<K> = other.iter().map(&key).collect();
        left.sort();
        right.sort();

        let (mut i, mut j, mut mismatched) = (0, 0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                Ordering::Less => {
                    mismatched += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    mismatched += 1;
                    j += 1;
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        mismatched + (left.len() - i) + (right.len() - j)
    }

    /// Size of the multiset symmetric difference between the two combinations
    pub fn mismatch(&self, other: &Combination) -> usize {
        self.mismatch_by(other, |id| id.to_string())
    }
}

impl From<Vec<String>> for Combination {
    fn from(value: Vec<String>) -> Self {
        Combination::new(value)
    }
}

/// Entity id inside a serialized combination, either a string or a number
#[derive(Deserialize)]
struct EntityId(#[serde(deserialize_with = "id_string")] String);

impl<'de> Deserialize<'de> for Combination {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids = Vec::<EntityId>::deserialize(deserializer)?;
        Ok(Combination::new(ids.into_iter().map(|EntityId(id)| id)))
    }
}

impl From<Combination> for Vec<String> {
    fn from(value: Combination) -> Self {
        value.entities
    }
}

impl Display for Combination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.entities.join(", "))
    }
}
