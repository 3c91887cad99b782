//! Pairing of a reaction's input combinations with its output combinations
use std::fmt::{Display, Formatter};

use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decompose::CombinationSet;
use crate::optimize::assignment::minimum_cost_assignment;
use crate::pathway::combination::Combination;
use crate::pathway::entity::EntityCatalog;

/// How to cover every combination when a reaction has more input than output combinations,
/// or the reverse
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Pair every input combination with every output combination
    #[default]
    Cartesian,
    /// Only accept one-to-one pairings, reject reactions with unequal sides
    Strict,
}

impl Display for CoveragePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoveragePolicy::Cartesian => write!(f, "cartesian"),
            CoveragePolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Can't pair {inputs} input combinations with {outputs} output combinations under the {policy} coverage policy")]
    UnresolvableMatch {
        inputs: usize,
        outputs: usize,
        policy: CoveragePolicy,
    },
}

/// Pairs input combinations with output combinations so that as many entities as possible
/// are carried through the reaction unchanged
#[derive(Clone, Copy, Debug)]
pub struct CombinationMatcher<'c> {
    /// Used to compare entities by their reference entity
    catalog: Option<&'c EntityCatalog>,
    policy: CoveragePolicy,
}

impl<'c> CombinationMatcher<'c> {
    /// Create a matcher comparing entities by their own ids
    pub fn new(policy: CoveragePolicy) -> Self {
        CombinationMatcher {
            catalog: None,
            policy,
        }
    }

    /// Create a matcher comparing entities by their reference entity where the catalog
    /// knows one
    pub fn with_catalog(catalog: &'c EntityCatalog, policy: CoveragePolicy) -> Self {
        CombinationMatcher {
            catalog: Some(catalog),
            policy,
        }
    }

    pub fn policy(&self) -> CoveragePolicy {
        self.policy
    }

    /// Dissimilarity between an input and an output combination, the number of entities
    /// present in one but not the other
    pub fn cost(&self, input: &Combination, output: &Combination) -> i64 {
        let mismatch = match self.catalog {
            Some(catalog) => input.mismatch_by(output, |id| catalog.canonical_key(id).to_string()),
            None => input.mismatch(output),
        };
        mismatch as i64
    }

    /// Cost of every (input, output) pair, inputs along the rows
    pub fn cost_matrix(&self, inputs: &[&Combination], outputs: &[&Combination]) -> DMatrix<i64> {
        DMatrix::from_fn(inputs.len(), outputs.len(), |row, col| {
            self.cost(inputs[row], outputs[col])
        })
    }

    /// Pair the input combinations of a reaction with its output combinations
    ///
    /// # Parameters
    /// - `inputs`: Combinations of the reaction's inputs
    /// - `outputs`: Combinations of the reaction's outputs
    ///
    /// # Returns
    /// - `Ok`: the pairs, covering every input and every output combination. Empty when
    ///   either side is empty. Pairs are ordered by input combination, then output
    ///   combination, and do not depend on the order of the given sets.
    /// - `Err`: the sides have different sizes and the policy is
    ///   [`CoveragePolicy::Strict`]
    ///
    /// # Examples
    /// ```rust
    /// use logicnet_core::decompose::CombinationSet;
    /// use logicnet_core::optimize::matcher::{CombinationMatcher, CoveragePolicy};
    /// use logicnet_core::pathway::combination::Combination;
    /// let inputs: CombinationSet = [Combination::new(["A", "X"]), Combination::new(["B", "Y"])]
    ///     .into_iter()
    ///     .collect();
    /// let outputs: CombinationSet = [Combination::new(["B'", "Y"]), Combination::new(["A'", "X"])]
    ///     .into_iter()
    ///     .collect();
    /// let matcher = CombinationMatcher::new(CoveragePolicy::Cartesian);
    /// let pairs = matcher.pair(&inputs, &outputs).unwrap();
    /// assert_eq!(pairs[0], (Combination::new(["A", "X"]), Combination::new(["A'", "X"])));
    /// ```
    pub fn pair(
        &self,
        inputs: &CombinationSet,
        outputs: &CombinationSet,
    ) -> Result<Vec<(Combination, Combination)>, MatchError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Ok(Vec::new());
        }
        let mut inputs: Vec<&Combination> = inputs.iter().collect();
        let mut outputs: Vec<&Combination> = outputs.iter().collect();
        inputs.sort();
        outputs.sort();

        if inputs.len() != outputs.len() {
            return match self.policy {
                CoveragePolicy::Cartesian => {
                    debug!(
                        "Pairing {} input with {} output combinations exhaustively",
                        inputs.len(),
                        outputs.len()
                    );
                    Ok(inputs
                        .iter()
                        .flat_map(|input| {
                            outputs
                                .iter()
                                .map(move |output| ((*input).clone(), (*output).clone()))
                        })
                        .collect())
                }
                CoveragePolicy::Strict => Err(MatchError::UnresolvableMatch {
                    inputs: inputs.len(),
                    outputs: outputs.len(),
                    policy: self.policy,
                }),
            };
        }

        let costs = self.cost_matrix(&inputs, &outputs);
        Ok(minimum_cost_assignment(&costs)
            .into_iter()
            .map(|(row, col)| (inputs[row].clone(), outputs[col].clone()))
            .collect())
    }
}
