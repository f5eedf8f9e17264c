use std::collections::HashMap;

use crate::belief::Belief;
use crate::error::SolveError;
use crate::objective::Accuracy;
use crate::strategy::StrategyChain;
use crate::{ActionIndex, ObservationIndex, Probability, Reward, StateIndex};

/// the POMDP data source (spec §6). consumed read-only; never mutated by
/// this crate. implementors own the state/observation/action spaces, the
/// transition kernel, and the reward function.
pub trait Pomdp: Sync {
    fn num_states(&self) -> usize;
    fn num_observations(&self) -> usize;
    /// `|U|`, the length every belief's `bu` vector is built and
    /// compared at (spec §3). a single global count, not a per-class
    /// maximum: a class using only a subset of `0..|U|` still reports
    /// the full `|U|` here, with the unused entries of its beliefs zero.
    fn num_unobservations(&self) -> usize;

    /// the observation class of state `s`.
    fn obs(&self, s: StateIndex) -> ObservationIndex;
    /// the refinement index of state `s` within its observation class.
    fn unobs(&self, s: StateIndex) -> crate::RefinementIndex;

    /// the initial belief, assigning probability 1 to a single initial
    /// state. FAILs with `Unsupported::MultipleInitialStates` if the
    /// POMDP declares more than one.
    fn initial_belief(&self) -> Result<Belief, SolveError>;

    /// number of available choices (actions) for observation class `o`;
    /// identical for every state sharing that observation.
    fn num_choices_for_observation(&self, o: ObservationIndex) -> usize;

    /// human-readable label for action `choice` available at observation
    /// `o`, used only for strategy export (never for solving).
    fn action_label(&self, o: ObservationIndex, choice: ActionIndex) -> String;

    /// distribution over next observation classes reached by applying
    /// `action` to the full-state distribution `dist` and summing the
    /// transition kernel over each observation's member states.
    fn observation_probs_after_action(
        &self,
        dist: &HashMap<StateIndex, Probability>,
        action: ActionIndex,
    ) -> HashMap<ObservationIndex, Probability>;

    /// the posterior belief after taking `action` from belief `b` and
    /// observing `o_next` (Bayesian update, spec §4.3 step 3).
    fn belief_after_choice_and_observation(
        &self,
        b: &Belief,
        action: ActionIndex,
        o_next: ObservationIndex,
    ) -> Belief;

    /// expected one-step reward `R̄(b, a) = Σ_s bS(s)·R(s,a)` (spec §4.4).
    fn reward_after_choice(&self, b: &Belief, action: ActionIndex) -> Reward;

    /// target observation classes, `O_T = { obs(s) : s ∈ T }` for the
    /// POMDP's chosen target set. FAILs with `TargetNotObservable` if the
    /// preimage of `O_T` under `obs` is not exactly the target set (spec
    /// §4.1).
    fn target_observations(&self) -> Result<Vec<ObservationIndex>, SolveError>;
}

/// the external MDP solver consumed to evaluate the strategy-induced
/// chain (spec §6). not specified here; any sound solver for finite
/// Markov chains satisfies the contract.
pub trait MdpSolver {
    /// probability of eventually reaching a state labeled `target_label`.
    fn reach_probs(
        &self,
        chain: &StrategyChain,
        target_label: &str,
    ) -> Result<(f64, Accuracy), SolveError>;

    /// expected cumulative reward accrued before reaching a state labeled
    /// `target_label`, given the chain's per-state reward vector.
    fn reach_rewards(
        &self,
        chain: &StrategyChain,
        rewards: &[Reward],
        target_label: &str,
    ) -> Result<(f64, Accuracy), SolveError>;
}
