//! Barycentric interpolation of the value map over arbitrary beliefs
//! (spec §4.5).

use std::collections::HashMap;

use crate::belief::Belief;
use crate::error::SolveError;
use crate::simplex;

/// approximate `V(b)` for an arbitrary belief `b` by decomposing it into
/// grid vertices (spec §4.2) and taking the barycentric-weighted sum of
/// their values in `value`.
///
/// FAILs with `InternalError` if decomposition names a vertex that is not
/// a key of `value`; this should never happen for a belief whose
/// observation class was included when the grid was built, and indicates
/// a bug in grid construction or decomposition.
pub fn interpolate(
    b: &Belief,
    value: &HashMap<Belief, f64>,
    resolution: u32,
) -> Result<f64, SolveError> {
    let decomposition = simplex::decompose(b.refinements(), resolution)?;
    let mut total = 0.0;
    for (vertex, weight) in decomposition.pruned() {
        let vertex_belief = Belief::new(b.observation(), vertex.to_vec());
        let v = value.get(&vertex_belief).ok_or_else(|| {
            SolveError::InternalError(format!(
                "interpolation vertex {vertex:?} (observation {}) missing from value map",
                b.observation()
            ))
        })?;
        total += weight * v;
    }
    Ok(total)
}
