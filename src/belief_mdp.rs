//! The belief-MDP builder (spec §4.3): for a grid belief and action,
//! compute the distribution over successor beliefs induced by an
//! observation-partitioned Bayesian update.

use std::collections::HashMap;

use crate::belief::Belief;
use crate::pomdp::Pomdp;
use crate::{ActionIndex, Probability, StateIndex};

/// probabilities below this are numerically insignificant and may be
/// pruned from a successor distribution (spec §4.3 "Determinism").
const PRUNE_THRESHOLD: f64 = 1e-12;

/// expand a belief into the full state-space distribution it represents
/// (spec §4.3 step 1, `bS = toDistribution(b)`).
pub fn to_distribution<P: Pomdp + ?Sized>(pomdp: &P, b: &Belief) -> HashMap<StateIndex, Probability> {
    (0..pomdp.num_states())
        .filter(|&s| pomdp.obs(s) == b.observation())
        .map(|s| (s, b.mass(pomdp.unobs(s))))
        .filter(|(_, p)| *p > 0.0)
        .collect()
}

/// the successor-belief distribution reached by taking `action` from
/// belief `b` (spec §4.3 steps 2-4): apply the transition kernel, then
/// partition the resulting full-state distribution by next observation
/// and renormalize each partition into its own posterior belief.
///
/// iteration is deterministic (ascending observation index, matching the
/// `Pomdp::observation_probs_after_action` contract, which is itself
/// expected to enumerate observations in ascending order).
pub fn successors<P: Pomdp + ?Sized>(
    pomdp: &P,
    b: &Belief,
    action: ActionIndex,
) -> HashMap<Belief, Probability> {
    let state_dist = to_distribution(pomdp, b);
    let observation_probs = pomdp.observation_probs_after_action(&state_dist, action);

    let mut next_observations: Vec<_> = observation_probs
        .into_iter()
        .filter(|(_, p)| *p > PRUNE_THRESHOLD)
        .collect();
    next_observations.sort_by_key(|(o, _)| *o);

    next_observations
        .into_iter()
        .map(|(o_next, p)| {
            let posterior = pomdp.belief_after_choice_and_observation(b, action, o_next);
            (posterior, p)
        })
        .collect()
}
