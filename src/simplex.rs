//! Freudenthal triangulation of the belief simplex (spec §4.2): grid
//! vertex enumeration and decomposition of an arbitrary belief into a
//! convex combination of grid vertices.

use crate::belief::Belief;
use crate::error::SolveError;
use crate::{ObservationIndex, Probability};

/// reconstruction-error tolerance for a decomposition self-check (spec
/// §4.2 "Self-check").
const RECONSTRUCTION_TOLERANCE: f64 = 1e-4;
/// weights below this are numerically insignificant and may be dropped
/// during interpolation to avoid spurious hash lookups (spec §4.2).
pub const WEIGHT_PRUNE_THRESHOLD: f64 = 1e-6;

/// enumerate every Freudenthal grid vertex of the `(n-1)`-simplex at
/// resolution `m`: all dense probability vectors of length `n` whose
/// entries are multiples of `1/m` and sum to exactly one.
///
/// implemented via the suffix-sum encoding spec §4.2 describes: a
/// weakly-decreasing integer sequence `g_1 = m >= g_2 >= ... >= g_n >= 0`
/// maps to the vertex `(g_1-g_2, g_2-g_3, ..., g_{n-1}-g_n, g_n) / m`.
pub fn grid_vertices(n: usize, m: u32) -> Vec<Vec<Probability>> {
    assert!(n >= 1, "an observation class must have at least one refinement");
    let mut sequences = Vec::new();
    let mut prefix = vec![m];
    enumerate_suffix_sums(n - 1, m, &mut prefix, &mut sequences);
    sequences
        .into_iter()
        .map(|g| vertex_from_suffix_sums(&g, m))
        .collect()
}

fn enumerate_suffix_sums(remaining: usize, bound: u32, prefix: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
    if remaining == 0 {
        out.push(prefix.clone());
        return;
    }
    for g in (0..=bound).rev() {
        prefix.push(g);
        enumerate_suffix_sums(remaining - 1, g, prefix, out);
        prefix.pop();
    }
}

fn vertex_from_suffix_sums(g: &[u32], m: u32) -> Vec<Probability> {
    let n = g.len();
    (0..n)
        .map(|i| {
            let next = g.get(i + 1).copied().unwrap_or(0);
            (g[i] - next) as f64 / m as f64
        })
        .collect()
}

/// convenience wrapper building full [`Belief`]s for observation class
/// `so` from [`grid_vertices`].
pub fn grid_beliefs(so: ObservationIndex, n: usize, m: u32) -> Vec<Belief> {
    grid_vertices(n, m)
        .into_iter()
        .map(|bu| Belief::new(so, bu))
        .collect()
}

/// a belief decomposed into a subsimplex of grid vertices with
/// nonnegative barycentric weights summing to one.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub vertices: Vec<Vec<Probability>>,
    pub weights: Vec<Probability>,
}

impl Decomposition {
    /// iterate `(vertex, weight)` pairs, dropping weights below
    /// [`WEIGHT_PRUNE_THRESHOLD`] (spec §4.2).
    pub fn pruned(&self) -> impl Iterator<Item = (&[Probability], Probability)> {
        self.vertices
            .iter()
            .map(Vec::as_slice)
            .zip(self.weights.iter().copied())
            .filter(|(_, w)| *w >= WEIGHT_PRUNE_THRESHOLD)
    }
}

/// decompose `b` (a dense probability vector over a single observation
/// class's refinements) into `n` grid vertices and barycentric weights
/// such that `b = Σ λⱼ vⱼ` (spec §4.2 steps 1-5).
pub fn decompose(b: &[Probability], m: u32) -> Result<Decomposition, SolveError> {
    let n = b.len();
    if n == 0 {
        return Err(SolveError::InternalError(
            "cannot decompose a belief with zero refinements".into(),
        ));
    }

    // step 1: suffix sums scaled by M, rounded to 6 decimals to absorb
    // float error.
    let suffix_mass: Vec<f64> = suffix_sums(b);
    let x: Vec<f64> = suffix_mass
        .iter()
        .map(|&s| round_6(s * m as f64))
        .collect();

    // step 2
    let v: Vec<u32> = x.iter().map(|&xi| xi.floor() as u32).collect();
    let d: Vec<f64> = x.iter().zip(v.iter()).map(|(&xi, &vi)| xi - vi as f64).collect();

    // step 3: sort indices by D descending, nonzero first, stable within
    // each group.
    let mut p: Vec<usize> = (0..n).collect();
    p.sort_by(|&i, &j| {
        let nz_i = d[i] > 0.0;
        let nz_j = d[j] > 0.0;
        match (nz_i, nz_j) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => d[j].partial_cmp(&d[i]).unwrap_or(std::cmp::Ordering::Equal),
        }
    });

    // step 4: build the n vertices Q^0..Q^{n-1}.
    let mut q_sequences: Vec<Vec<u32>> = Vec::with_capacity(n);
    q_sequences.push(v.clone());
    for i in 1..n {
        let mut next = q_sequences[i - 1].clone();
        next[p[i - 1]] += 1;
        q_sequences.push(next);
    }
    let vertices: Vec<Vec<Probability>> = q_sequences
        .iter()
        .map(|g| vertex_from_suffix_sums(g, m))
        .collect();

    // step 5: weights.
    let mut weights = vec![0.0; n];
    for i in 1..n {
        weights[i] = d[p[i - 1]] - d[p[i]];
    }
    weights[0] = 1.0 - weights[1..].iter().sum::<f64>();

    let decomposition = Decomposition { vertices, weights };

    // self-check: reconstruction error must be small, else this is a bug
    // in the decomposition logic itself.
    let reconstructed = reconstruct(&decomposition);
    let error = b
        .iter()
        .zip(reconstructed.iter())
        .map(|(a, r)| (a - r).abs())
        .fold(0.0_f64, f64::max);
    if error >= RECONSTRUCTION_TOLERANCE {
        return Err(SolveError::InternalError(format!(
            "simplex decomposition reconstruction error {error:.3e} exceeds tolerance \
             {RECONSTRUCTION_TOLERANCE:.1e}"
        )));
    }

    Ok(decomposition)
}

fn reconstruct(decomposition: &Decomposition) -> Vec<Probability> {
    let n = decomposition
        .vertices
        .first()
        .map(Vec::len)
        .unwrap_or_default();
    let mut out = vec![0.0; n];
    for (vertex, weight) in decomposition.vertices.iter().zip(&decomposition.weights) {
        for (o, v) in out.iter_mut().zip(vertex) {
            *o += weight * v;
        }
    }
    out
}

fn suffix_sums(b: &[Probability]) -> Vec<f64> {
    let mut sums = vec![0.0; b.len()];
    let mut running = 0.0;
    for i in (0..b.len()).rev() {
        running += b[i];
        sums[i] = running;
    }
    sums
}

fn round_6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
