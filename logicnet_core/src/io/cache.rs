//! Provides the match cache, which lets a rerun skip matching reactions
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::io::{id_string, parse_table, TableError};
use crate::pathway::combination::Combination;
use crate::pathway::reaction::VirtualReaction;

pub const MATCH_CACHE: &str = "match_cache";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct MatchCacheRow {
    #[serde(deserialize_with = "id_string")]
    reaction_id: String,
    input_combination: Combination,
    output_combination: Combination,
}

impl MatchCacheRow {
    const COLUMNS: [&'static str; 3] = ["reaction_id", "input_combination", "output_combination"];
}

/// Matched (input, output) combination pairs of earlier runs, keyed by reaction id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchCache {
    pairs: IndexMap<String, Vec<(Combination, Combination)>>,
}

impl MatchCache {
    pub fn new() -> Self {
        MatchCache {
            pairs: IndexMap::new(),
        }
    }

    /// Read a cache from JSON rows with `reaction_id`, `input_combination` and
    /// `output_combination` columns
    ///
    /// Other columns are ignored, so the virtual reaction table written by
    /// [`crate::io::json::virtual_reactions_to_json`] can be read back directly.
    pub fn from_json_str(json: &str) -> Result<MatchCache, TableError> {
        let rows: Vec<MatchCacheRow> = parse_table(MATCH_CACHE, json, &MatchCacheRow::COLUMNS)?;
        let mut cache = MatchCache::new();
        for row in rows {
            cache.insert(&row.reaction_id, row.input_combination, row.output_combination);
        }
        debug!("Read match cache covering {} reactions", cache.len());
        Ok(cache)
    }

    /// Build a cache from the virtual reactions of a generation run
    pub fn from_virtual_reactions(virtual_reactions: &[VirtualReaction]) -> MatchCache {
        let mut cache = MatchCache::new();
        for v in virtual_reactions {
            cache.insert(v.reaction_id(), v.input().clone(), v.output().clone());
        }
        cache
    }

    pub fn insert(&mut self, reaction_id: &str, input: Combination, output: Combination) {
        self.pairs
            .entry(reaction_id.to_string())
            .or_default()
            .push((input, output));
    }

    /// Cached pairs of a reaction
    pub fn pairs_for(&self, reaction_id: &str) -> Option<&[(Combination, Combination)]> {
        self.pairs.get(reaction_id).map(Vec::as_slice)
    }

    /// Number of reactions covered
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, TableError> {
        let rows: Vec<MatchCacheRow> = self
            .pairs
            .iter()
            .flat_map(|(reaction_id, pairs)| {
                pairs.iter().map(move |(input, output)| MatchCacheRow {
                    reaction_id: reaction_id.clone(),
                    input_combination: input.clone(),
                    output_combination: output.clone(),
                })
            })
            .collect();
        Ok(serde_json::to_string(&rows)?)
    }
}
