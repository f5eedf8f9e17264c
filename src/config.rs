use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::objective::{Direction, Objective};

/// which per-entry comparison the sup-norm convergence check uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermCrit {
    /// `|V[b] - V_prev[b]| <= term_crit_param` for every grid belief `b`.
    Absolute,
    /// `|V[b] - V_prev[b]| <= term_crit_param * |V[b]|` for every grid
    /// belief `b`.
    Relative,
}

/// explicit, immutable configuration passed to [`crate::driver::solve`].
/// spec §9 Design Notes: "move [mutable driver fields] to an explicit
/// immutable `Config`".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// grid resolution `M`. must be >= 2.
    pub resolution: u32,
    pub max_iters: u32,
    pub term_crit: TermCrit,
    pub term_crit_param: f64,
    /// if set, exhausting `max_iters` without converging is a hard
    /// failure (`SolveError::NonConverged`); otherwise the driver returns
    /// a result with a widened outer-bound accuracy.
    pub error_on_non_converge: bool,
    pub direction: Direction,
    pub objective: Objective,
    /// whether to additionally run the §4.6 strategy extraction and
    /// return the built chain in `SolveResult` (renamed from the spec's
    /// `export_strategy_path`: this crate never opens a file itself, see
    /// SPEC_FULL.md §4.7).
    pub export_strategy: bool,
    /// cooperative cancellation; polled once per sweep (spec §5).
    #[serde(skip)]
    pub cancel: Option<CancellationToken>,
}

impl Config {
    pub fn new(resolution: u32, direction: Direction, objective: Objective) -> Self {
        Self {
            resolution,
            max_iters: 10_000,
            term_crit: TermCrit::Absolute,
            term_crit_param: 1e-6,
            error_on_non_converge: false,
            direction,
            objective,
            export_strategy: false,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_term_crit(mut self, term_crit: TermCrit, param: f64) -> Self {
        self.term_crit = term_crit;
        self.term_crit_param = param;
        self
    }

    pub fn erroring_on_non_converge(mut self) -> Self {
        self.error_on_non_converge = true;
        self
    }

    pub fn exporting_strategy(mut self) -> Self {
        self.export_strategy = true;
        self
    }
}
