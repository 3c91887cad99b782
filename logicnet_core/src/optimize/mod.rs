//! Module for pairing the input combinations of a reaction with its output combinations
//!
//! The pairing is an assignment problem: [`matcher`] builds the cost matrix and applies the
//! coverage policy, while [`assignment`] hands the cost matrix to the Kuhn-Munkres solver.

pub mod assignment;
pub mod matcher;
