use crate::ObservationIndex;

/// failure codes from spec §6/§7. propagation is strict: no retries, no
/// partial results returned alongside a failure.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// the target set is not a union of observation classes, so
    /// "target reached" cannot be pinned to the observation alone.
    #[error(
        "target is not observable: observation classes {target_observations:?} cover states \
         outside the target set"
    )]
    TargetNotObservable {
        target_observations: Vec<ObservationIndex>,
    },

    /// a model feature the engine does not support.
    #[error("unsupported: {0}")]
    Unsupported(#[from] Unsupported),

    /// value iteration exhausted `max_iters` without meeting the
    /// termination criterion, and `Config::error_on_non_converge` was set.
    #[error("value iteration did not converge after {iters} sweeps (residual {residual:.3e})")]
    NonConverged { iters: u32, residual: f64 },

    /// the cooperative cancellation token was observed set between sweeps.
    #[error("solve was cancelled")]
    Cancelled,

    /// an invariant the engine relies on was violated; always a bug.
    #[error("internal invariant violated: {0}")]
    InternalError(String),

    /// the external MDP solver failed while evaluating the strategy chain.
    #[error("inner-bound solve: {0}")]
    InnerSolve(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    #[error("POMDP declares more than one initial state")]
    MultipleInitialStates,
}
