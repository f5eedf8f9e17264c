//! Synchronous Bellman sweeps over the belief grid (spec §4.4).

use std::collections::{HashMap, HashSet};

use crate::belief::Belief;
use crate::belief_mdp;
use crate::cancel::CancellationToken;
use crate::config::{Config, TermCrit};
use crate::error::SolveError;
use crate::interpolate;
use crate::objective::Objective;
use crate::pomdp::Pomdp;
use crate::simplex;
use crate::{ActionIndex, ObservationIndex, Probability};

/// strict-better action-comparison tolerance (spec §4.4).
const EPS_ACT: f64 = 1e-6;

/// precomputed belief-MDP: for every grid belief, the successor
/// distribution under each of its available actions (spec §4.3, built
/// once and reused across sweeps).
type BeliefMdp = HashMap<Belief, Vec<HashMap<Belief, Probability>>>;

/// the outer-bound result of value iteration: the converged (or best-
/// effort) value map plus convergence metadata.
#[derive(Debug)]
pub struct SweepResult {
    pub value: HashMap<Belief, f64>,
    pub iters: u32,
    pub residual: f64,
    pub converged: bool,
}

/// enumerate the grid beliefs for every non-target observation (spec
/// §4.2 "Grid enumeration"), skipping target observations entirely since
/// their value is pinned by the objective rather than computed.
///
/// every class's `bu` vector has the same length, `pomdp.num_unobservations()`
/// (spec §3's global `|U|`), not the class's own largest `unobs(s)` plus
/// one: a class may legitimately use a proper subset of the refinement
/// indices, leaving the rest of its `bu` vector zero.
pub fn build_grid<P: Pomdp + ?Sized>(
    pomdp: &P,
    target_observations: &HashSet<ObservationIndex>,
    resolution: u32,
) -> Vec<Belief> {
    let refinement_count = pomdp.num_unobservations();
    let mut observations: HashSet<ObservationIndex> = HashSet::new();
    for s in 0..pomdp.num_states() {
        let o = pomdp.obs(s);
        if !target_observations.contains(&o) {
            observations.insert(o);
        }
    }
    let mut observations: Vec<_> = observations.into_iter().collect();
    observations.sort_unstable();

    observations
        .into_iter()
        .flat_map(|o| simplex::grid_beliefs(o, refinement_count, resolution))
        .collect()
}

fn build_belief_mdp<P: Pomdp + ?Sized>(pomdp: &P, grid: &[Belief]) -> BeliefMdp {
    grid.iter()
        .map(|b| {
            let num_actions = pomdp.num_choices_for_observation(b.observation());
            let per_action = (0..num_actions)
                .map(|a: ActionIndex| belief_mdp::successors(pomdp, b, a))
                .collect();
            (b.clone(), per_action)
        })
        .collect()
}

/// run synchronous value iteration to convergence or `max_iters` (spec
/// §4.4). returns `NonConverged` only when `config.error_on_non_converge`
/// is set; otherwise returns the best-effort value map with the residual
/// the caller can use to widen the reported accuracy.
pub fn run<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
) -> Result<SweepResult, SolveError> {
    let grid = build_grid(pomdp, target_observations, config.resolution);
    log::info!("belief grid built: {} vertices", grid.len());
    let mdp = build_belief_mdp(pomdp, &grid);

    let mut v: HashMap<Belief, f64> = grid.iter().cloned().map(|b| (b, 0.0)).collect();
    let mut v_prev = v.clone();

    let progress = indicatif::ProgressBar::new(config.max_iters as u64);
    progress.set_style(
        indicatif::ProgressStyle::with_template(
            "{spinner:.cyan} sweep {pos}/{len} ~ residual will settle below tolerance",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );

    let mut iters = 0u32;
    let mut residual = f64::INFINITY;
    let mut converged = false;

    while iters < config.max_iters {
        poll_cancellation(config.cancel.as_ref())?;

        sweep(
            pomdp,
            config,
            target_observations,
            &grid,
            &mdp,
            &v_prev,
            &mut v,
        )?;
        residual = sup_norm(&v, &v_prev);
        iters += 1;
        progress.inc(1);
        log::debug!("sweep {iters}: residual {residual:.3e}");

        if has_converged(&v, &v_prev, config.term_crit, config.term_crit_param) {
            converged = true;
            std::mem::swap(&mut v, &mut v_prev);
            break;
        }
        std::mem::swap(&mut v, &mut v_prev);
    }
    progress.finish_and_clear();

    if !converged {
        if config.error_on_non_converge {
            return Err(SolveError::NonConverged { iters, residual });
        }
        log::warn!("value iteration did not converge after {iters} sweeps (residual {residual:.3e})");
    }

    Ok(SweepResult {
        value: v_prev,
        iters,
        residual,
        converged,
    })
}

fn poll_cancellation(cancel: Option<&CancellationToken>) -> Result<(), SolveError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(SolveError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(feature = "parallel")]
fn sweep<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
    grid: &[Belief],
    mdp: &BeliefMdp,
    v_prev: &HashMap<Belief, f64>,
    v: &mut HashMap<Belief, f64>,
) -> Result<(), SolveError> {
    use rayon::prelude::*;

    let updated: Result<Vec<(Belief, f64)>, SolveError> = grid
        .par_iter()
        .map(|b| {
            let best = bellman_update(pomdp, config, target_observations, mdp, v_prev, b)?;
            Ok((b.clone(), best))
        })
        .collect();
    *v = updated?.into_iter().collect();
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn sweep<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
    grid: &[Belief],
    mdp: &BeliefMdp,
    v_prev: &HashMap<Belief, f64>,
    v: &mut HashMap<Belief, f64>,
) -> Result<(), SolveError> {
    for b in grid {
        let best = bellman_update(pomdp, config, target_observations, mdp, v_prev, b)?;
        v.insert(b.clone(), best);
    }
    Ok(())
}

fn bellman_update<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
    mdp: &BeliefMdp,
    v_prev: &HashMap<Belief, f64>,
    b: &Belief,
) -> Result<f64, SolveError> {
    let per_action = mdp.get(b).ok_or_else(|| {
        SolveError::InternalError(format!(
            "belief (observation {}) missing from precomputed belief-MDP",
            b.observation()
        ))
    })?;

    let mut best = config.direction.init();
    for (a, successors) in per_action.iter().enumerate() {
        let mut q = if config.objective.adds_immediate_reward() {
            pomdp.reward_after_choice(b, a)
        } else {
            0.0
        };
        for (b_next, p) in successors {
            let v_tilde = tilde_value(config.objective, target_observations, v_prev, b_next, config.resolution)?;
            q += p * v_tilde;
        }
        if config.direction.improves(best, q, EPS_ACT) {
            best = q;
        }
    }
    Ok(best)
}

/// `ṽ(b′)` from spec §4.4: pinned at the objective's target value for
/// target beliefs, otherwise interpolated over the previous value map.
fn tilde_value(
    objective: Objective,
    target_observations: &HashSet<ObservationIndex>,
    v_prev: &HashMap<Belief, f64>,
    b_next: &Belief,
    resolution: u32,
) -> Result<f64, SolveError> {
    if target_observations.contains(&b_next.observation()) {
        Ok(objective.target_value())
    } else {
        interpolate::interpolate(b_next, v_prev, resolution)
    }
}

fn sup_norm(v: &HashMap<Belief, f64>, v_prev: &HashMap<Belief, f64>) -> f64 {
    v.iter()
        .map(|(b, val)| (val - v_prev.get(b).copied().unwrap_or(0.0)).abs())
        .fold(0.0_f64, f64::max)
}

fn has_converged(
    v: &HashMap<Belief, f64>,
    v_prev: &HashMap<Belief, f64>,
    term_crit: TermCrit,
    param: f64,
) -> bool {
    match term_crit {
        TermCrit::Absolute => sup_norm(v, v_prev) <= param,
        TermCrit::Relative => v.iter().all(|(b, val)| {
            let prev = v_prev.get(b).copied().unwrap_or(0.0);
            (val - prev).abs() <= param * val.abs()
        }),
    }
}
