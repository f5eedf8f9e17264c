use std::hash::{Hash, Hasher};

use crate::{ObservationIndex, Probability, RefinementIndex};

/// tolerance used when checking that a belief's mass sums to one (spec §3,
/// §8 "Universal invariants").
const MASS_TOLERANCE: f64 = 1e-9;

/// a belief: an observation class paired with a distribution over the
/// hidden refinements of that class (spec §3). `bu[u]` is `P(state is s |
/// obs(s) = so)` for the state `s` with `unobs(s) = u`; entries for
/// refinements that do not occur under `so` are always zero.
///
/// equality and hashing are bit-identical over the `f64` representation
/// (spec §9 "Floating-point identity of grid beliefs") so that grid
/// vertices constructed at different call sites, via identical integer
/// arithmetic, collide as the same `HashMap` key.
#[derive(Debug, Clone)]
pub struct Belief {
    so: ObservationIndex,
    bu: Vec<Probability>,
}

impl Belief {
    /// construct a belief without renormalizing. panics in debug builds if
    /// the invariants (non-negative, sums to one) are violated; release
    /// builds trust the caller, matching the teacher's convention of
    /// reserving `assert!` for genuinely-impossible states rather than
    /// recoverable input errors (`src/clustering/sinkhorn.rs`).
    pub fn new(so: ObservationIndex, bu: Vec<Probability>) -> Self {
        debug_assert!(bu.iter().all(|&p| p >= -1e-12), "belief mass is negative");
        let total: f64 = bu.iter().sum();
        debug_assert!(
            (total - 1.0).abs() <= 1e-6,
            "belief mass does not sum to one: {total}"
        );
        Belief { so, bu }
    }

    pub fn observation(&self) -> ObservationIndex {
        self.so
    }

    pub fn mass(&self, u: RefinementIndex) -> Probability {
        self.bu.get(u).copied().unwrap_or(0.0)
    }

    pub fn refinements(&self) -> &[Probability] {
        &self.bu
    }

    pub fn len(&self) -> usize {
        self.bu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bu.is_empty()
    }

    /// `Σ bu`; should be within [`MASS_TOLERANCE`] of one for any belief
    /// produced by this crate; exposed for the universal-invariant tests.
    pub fn total_mass(&self) -> Probability {
        self.bu.iter().sum()
    }

    pub fn is_well_formed(&self) -> bool {
        self.bu.iter().all(|&p| p >= -MASS_TOLERANCE)
            && (self.total_mass() - 1.0).abs() <= MASS_TOLERANCE.max(1e-6)
    }
}

impl PartialEq for Belief {
    fn eq(&self, other: &Self) -> bool {
        self.so == other.so
            && self.bu.len() == other.bu.len()
            && self
                .bu
                .iter()
                .zip(other.bu.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for Belief {}

impl Hash for Belief {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.so.hash(state);
        self.bu.len().hash(state);
        for p in &self.bu {
            p.to_bits().hash(state);
        }
    }
}
