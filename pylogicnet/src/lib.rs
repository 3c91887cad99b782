use logicnet_core::io::json::virtual_reactions_to_json;
use logicnet_core::network::builder::{GenerationResult, LogicNetworkBuilder};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Logic network generated from a pathway, along with its run report
#[pyclass]
struct PyGenerationResult {
    inner: GenerationResult,
}

#[pymethods]
impl PyGenerationResult {
    /// Edges as (source_id, target_id, pos_neg, and_or, edge_type) tuples
    fn edges(&self) -> Vec<(String, String, String, String, String)> {
        self.inner
            .network
            .to_rows()
            .into_iter()
            .map(|row| {
                (
                    row.source_id,
                    row.target_id,
                    row.pos_neg.to_string(),
                    row.and_or,
                    row.edge_type.to_string(),
                )
            })
            .collect()
    }

    /// Skipped reactions as (reaction_id, reason) tuples
    fn skipped(&self) -> Vec<(String, String)> {
        self.inner
            .report
            .skipped()
            .map(|(id, reason)| (id.to_string(), reason.to_string()))
            .collect()
    }

    /// Virtual reaction table as JSON rows, usable as a match cache
    fn virtual_reactions_json(&self) -> PyResult<String> {
        virtual_reactions_to_json(&self.inner.virtual_reactions)
            .map_err(|err| PyValueError::new_err(err.to_string()))
    }

    /// Entity id behind a node identifier
    fn source_for(&self, node_id: &str) -> Option<String> {
        self.inner.identities.source_for(node_id).map(str::to_string)
    }
}

#[pyfunction]
#[pyo3(signature = (connections_json, participants_json, memberships_json, references_json=None, match_cache_json=None))]
fn generate_logic_network(
    connections_json: &str,
    participants_json: &str,
    memberships_json: &str,
    references_json: Option<&str>,
    match_cache_json: Option<&str>,
) -> PyResult<PyGenerationResult> {
    let mut builder = LogicNetworkBuilder::default();
    if let Some(cache) = match_cache_json {
        builder = builder.with_match_cache_json(cache);
    }
    let inner = builder
        .generate_from_json(
            connections_json,
            participants_json,
            memberships_json,
            references_json,
        )
        .map_err(|err| PyValueError::new_err(err.to_string()))?;
    Ok(PyGenerationResult { inner })
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(generate_logic_network, m)?)?;
    m.add_class::<PyGenerationResult>()?;
    Ok(())
}
