use serde::{Deserialize, Serialize};

/// which side of the value is being optimized over strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Min,
    Max,
}

impl Direction {
    /// `true` if `candidate` strictly improves on `incumbent` under this
    /// direction, guarded by the action-comparison tolerance `eps_act`
    /// from spec §4.4.
    pub fn improves(self, incumbent: f64, candidate: f64, eps_act: f64) -> bool {
        match self {
            Direction::Min => incumbent - candidate > eps_act,
            Direction::Max => candidate - incumbent > eps_act,
        }
    }

    /// the value a sweep should start `best` at before scanning actions.
    pub fn init(self) -> f64 {
        match self {
            Direction::Min => f64::INFINITY,
            Direction::Max => f64::NEG_INFINITY,
        }
    }
}

/// spec §9 Design Notes: "Replace inheritance with a tagged variant
/// `Objective::{Reachability, ExpectedReward(rewards)}`". This single enum
/// decides (i) the target-belief value, (ii) whether per-action immediate
/// reward is folded into the Bellman update, and (iii) which external
/// solver call the driver invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// maximize/minimize probability of eventually reaching the target.
    Reachability,
    /// maximize/minimize expected cumulative reward accrued before
    /// reaching the target.
    ExpectedReward,
}

impl Objective {
    /// value pinned at a belief whose observation lies in the target set.
    pub fn target_value(self) -> f64 {
        match self {
            Objective::Reachability => 1.0,
            Objective::ExpectedReward => 0.0,
        }
    }

    pub fn adds_immediate_reward(self) -> bool {
        matches!(self, Objective::ExpectedReward)
    }
}

/// a bound interval; `lower <= upper` is not enforced at construction
/// since during a Min-direction solve the outer bound can momentarily sit
/// above the inner bound before convergence completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// accuracy metadata wrapping the two-sided bound. `value` is the point
/// estimate the driver reports (spec §4.7: derived from the bracketing
/// interval depending on `Direction`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Accuracy {
    pub interval: Interval,
}

impl Accuracy {
    /// standard value-iteration accuracy rule (spec §4.7): absolute
    /// termination reports the residual itself as the half-width; relative
    /// termination scales it by the magnitude of the value.
    pub fn from_residual(value: f64, residual: f64, relative: bool) -> Self {
        let half_width = if relative {
            residual * value.abs()
        } else {
            residual
        };
        Accuracy {
            interval: Interval {
                lower: value - half_width,
                upper: value + half_width,
            },
        }
    }

    /// combine the outer-bound accuracy with the inner-bound accuracy
    /// reported by the external solver into one bracketing interval,
    /// oriented by `Direction` (spec §4.7).
    pub fn combine(direction: Direction, outer: Accuracy, inner: Accuracy) -> Accuracy {
        let (outer_bound, inner_bound) = (outer.interval, inner.interval);
        match direction {
            Direction::Max => Interval {
                lower: inner_bound.lower.min(inner_bound.upper),
                upper: outer_bound.upper.max(outer_bound.lower),
            },
            Direction::Min => Interval {
                lower: outer_bound.lower.min(outer_bound.upper),
                upper: inner_bound.upper.max(inner_bound.lower),
            },
        }
        .into()
    }
}

impl From<Interval> for Accuracy {
    fn from(interval: Interval) -> Self {
        Accuracy { interval }
    }
}
