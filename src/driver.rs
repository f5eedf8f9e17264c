//! Top-level orchestration (spec §4.7 / C7): run value iteration for the
//! outer bound, extract a strategy chain, evaluate it with the external
//! MDP solver for the inner bound, and assemble the two-sided result.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::{Config, TermCrit};
use crate::error::SolveError;
use crate::interpolate;
use crate::objective::{Accuracy, Direction, Objective};
use crate::pomdp::{MdpSolver, Pomdp};
use crate::strategy::{self, StrategyChain, TARGET_LABEL};
use crate::value_iteration;

/// the outcome of [`solve`]: a two-sided bound on the objective with
/// accuracy metadata (spec §6 "Outputs").
#[derive(Debug)]
pub struct SolveResult {
    /// the point value reported for the objective: the inner bound,
    /// i.e. the value actually achievable by the extracted strategy (the
    /// outer bound from grid value iteration serves only to certify how
    /// close that achieved value is to optimal, via `accuracy`).
    pub value: f64,
    pub accuracy: Accuracy,
    pub num_iters: u32,
    pub time_taken: Duration,
    /// the extracted strategy chain, present only when
    /// `Config::export_strategy` is set (spec §6, see `SPEC_FULL.md` §4.7
    /// for why this crate never writes the on-disk export formats
    /// itself).
    pub strategy_chain: Option<StrategyChain>,
}

/// run the full belief-grid value-iteration pipeline against `pomdp`,
/// using `solver` to evaluate the extracted strategy's inner bound.
pub fn solve<P, S>(pomdp: &P, solver: &S, config: &Config) -> Result<SolveResult, SolveError>
where
    P: Pomdp + ?Sized,
    S: MdpSolver + ?Sized,
{
    let started = Instant::now();

    let target_observations: HashSet<_> = pomdp.target_observations()?.into_iter().collect();
    let b0 = pomdp.initial_belief()?;

    let sweep = value_iteration::run(pomdp, config, &target_observations)?;

    let v_outer = if target_observations.contains(&b0.observation()) {
        config.objective.target_value()
    } else {
        interpolate::interpolate(&b0, &sweep.value, config.resolution)?
    };
    let relative = matches!(config.term_crit, TermCrit::Relative);
    let acc_outer = Accuracy::from_residual(v_outer, sweep.residual, relative);

    let chain = strategy::extract(pomdp, config, &target_observations, &sweep.value)?;
    let (v_inner, acc_inner) = match config.objective {
        Objective::Reachability => solver.reach_probs(&chain, TARGET_LABEL)?,
        Objective::ExpectedReward => {
            let rewards = chain.rewards();
            solver.reach_rewards(&chain, &rewards, TARGET_LABEL)?
        }
    };

    let accuracy = Accuracy::combine(config.direction, acc_outer, acc_inner);
    log::info!(
        "solve finished after {} sweeps: outer={v_outer:.6}, inner={v_inner:.6}, accuracy width={:.3e}",
        sweep.iters,
        accuracy.interval.width(),
    );

    Ok(SolveResult {
        value: v_inner,
        accuracy,
        num_iters: sweep.iters,
        time_taken: started.elapsed(),
        strategy_chain: config.export_strategy.then_some(chain),
    })
}
