//! Shared fixtures for the integration tests: concrete `Pomdp`
//! implementations and a brute-force `MdpSolver` standing in for the
//! external solver the driver consumes (spec §6 leaves it unspecified).
//!
//! Non-`#[cfg(test)]`-gated so every integration test binary can `mod
//! common;` it directly, matching the shared-fixture-module pattern the
//! teacher uses for its own test layers.

use std::collections::HashMap;

use petgraph::visit::EdgeRef;
use pomdp_belief_grid::pomdp::{MdpSolver, Pomdp};
use pomdp_belief_grid::strategy::{StrategyChain, TARGET_LABEL};
use pomdp_belief_grid::{Accuracy, Belief, ObservationIndex, Probability, Reward, SolveError, StateIndex};

/// the classic Tiger problem (spec §8 scenario 1): two hidden tiger
/// positions, a noisy `listen` action, and two terminal `open` actions.
///
/// the state space augments the two hidden positions with "what was last
/// heard", since this crate's `obs(s)` is a fixed function of state.
/// noise enters through the transition kernel spreading probability mass
/// across states of different observation classes, not through a
/// separate per-step sensor model.
pub struct Tiger;

const LISTEN: usize = 0;
const OPEN_LEFT: usize = 1;
const OPEN_RIGHT: usize = 2;

const LISTEN_ACCURACY: f64 = 0.85;
const REWARD_LISTEN: f64 = -1.0;
const REWARD_CORRECT_OPEN: f64 = 10.0;
const REWARD_WRONG_OPEN: f64 = -100.0;

/// observation classes: 0 = start, 1 = just heard "left", 2 = just heard
/// "right", 3 = opened (target, absorbing).
const OBS_START: usize = 0;
const OBS_HEARD_LEFT: usize = 1;
const OBS_HEARD_RIGHT: usize = 2;
const OBS_OPENED: usize = 3;

impl Tiger {
    /// states alternate tiger-left (even index) / tiger-right (odd
    /// index) within each observation class's pair.
    fn is_tiger_left(s: StateIndex) -> bool {
        s % 2 == 0
    }

    fn obs_of(s: StateIndex) -> ObservationIndex {
        s / 2
    }
}

impl Pomdp for Tiger {
    fn num_states(&self) -> usize {
        8
    }
    fn num_observations(&self) -> usize {
        4
    }
    fn num_unobservations(&self) -> usize {
        2
    }
    fn obs(&self, s: StateIndex) -> ObservationIndex {
        Self::obs_of(s)
    }
    fn unobs(&self, s: StateIndex) -> usize {
        usize::from(!Self::is_tiger_left(s))
    }
    fn initial_belief(&self) -> Result<Belief, SolveError> {
        Ok(Belief::new(OBS_START, vec![0.5, 0.5]))
    }
    fn num_choices_for_observation(&self, o: ObservationIndex) -> usize {
        if o == OBS_OPENED {
            0
        } else {
            3
        }
    }
    fn action_label(&self, _o: ObservationIndex, choice: usize) -> String {
        match choice {
            LISTEN => "listen",
            OPEN_LEFT => "open-left",
            OPEN_RIGHT => "open-right",
            _ => "?",
        }
        .into()
    }
    fn observation_probs_after_action(
        &self,
        dist: &HashMap<StateIndex, Probability>,
        action: usize,
    ) -> HashMap<ObservationIndex, Probability> {
        let mut out = HashMap::new();
        match action {
            LISTEN => {
                for (&s, &p) in dist {
                    let p_left = if Self::is_tiger_left(s) {
                        LISTEN_ACCURACY
                    } else {
                        1.0 - LISTEN_ACCURACY
                    };
                    *out.entry(OBS_HEARD_LEFT).or_insert(0.0) += p * p_left;
                    *out.entry(OBS_HEARD_RIGHT).or_insert(0.0) += p * (1.0 - p_left);
                }
            }
            OPEN_LEFT | OPEN_RIGHT => {
                let total: f64 = dist.values().sum();
                out.insert(OBS_OPENED, total);
            }
            _ => unreachable!("Tiger has only 3 actions"),
        }
        out
    }
    fn belief_after_choice_and_observation(&self, b: &Belief, action: usize, o_next: ObservationIndex) -> Belief {
        match action {
            LISTEN => {
                let (p_left_heard_left, p_left_heard_right) = (LISTEN_ACCURACY, 1.0 - LISTEN_ACCURACY);
                let (like_left, like_right) = if o_next == OBS_HEARD_LEFT {
                    (p_left_heard_left, 1.0 - p_left_heard_left)
                } else {
                    (p_left_heard_right, 1.0 - p_left_heard_right)
                };
                let unnormalized = [b.mass(0) * like_left, b.mass(1) * like_right];
                let total: f64 = unnormalized.iter().sum();
                Belief::new(o_next, unnormalized.iter().map(|&m| m / total).collect())
            }
            OPEN_LEFT | OPEN_RIGHT => Belief::new(o_next, vec![b.mass(0), b.mass(1)]),
            _ => unreachable!("Tiger has only 3 actions"),
        }
    }
    fn reward_after_choice(&self, b: &Belief, action: usize) -> Reward {
        match action {
            LISTEN => REWARD_LISTEN,
            OPEN_LEFT => b.mass(0) * REWARD_WRONG_OPEN + b.mass(1) * REWARD_CORRECT_OPEN,
            OPEN_RIGHT => b.mass(0) * REWARD_CORRECT_OPEN + b.mass(1) * REWARD_WRONG_OPEN,
            _ => unreachable!("Tiger has only 3 actions"),
        }
    }
    fn target_observations(&self) -> Result<Vec<ObservationIndex>, SolveError> {
        Ok(vec![OBS_OPENED])
    }
}

/// a six-state, fully-observable Markov chain (spec §8 scenario 2): no
/// action choice, wired so the reachability probability from state 0 to
/// the absorbing target state 5 comes out to 0.018: state 1 is a 90/10
/// decision point between the dead-end absorbing state 2 and the target,
/// reached either directly (mass 0.08) or through the one-hop relay
/// state 4 (mass 0.10); state 3 is an unrelated dead-end sink.
pub struct SixStateChain;

impl SixStateChain {
    fn transitions(s: StateIndex) -> &'static [(StateIndex, f64)] {
        match s {
            0 => &[(1, 0.08), (4, 0.10), (3, 0.82)],
            1 => &[(2, 0.9), (5, 0.1)],
            2 => &[(2, 1.0)],
            3 => &[(3, 1.0)],
            4 => &[(1, 1.0)],
            5 => &[(5, 1.0)],
            _ => unreachable!("SixStateChain has 6 states"),
        }
    }
}

impl Pomdp for SixStateChain {
    fn num_states(&self) -> usize {
        6
    }
    fn num_observations(&self) -> usize {
        6
    }
    fn num_unobservations(&self) -> usize {
        1
    }
    fn obs(&self, s: StateIndex) -> ObservationIndex {
        s
    }
    fn unobs(&self, _s: StateIndex) -> usize {
        0
    }
    fn initial_belief(&self) -> Result<Belief, SolveError> {
        Ok(Belief::new(0, vec![1.0]))
    }
    fn num_choices_for_observation(&self, o: ObservationIndex) -> usize {
        if o == 5 {
            0
        } else {
            1
        }
    }
    fn action_label(&self, _o: ObservationIndex, _choice: usize) -> String {
        "step".into()
    }
    fn observation_probs_after_action(
        &self,
        dist: &HashMap<StateIndex, Probability>,
        _action: usize,
    ) -> HashMap<ObservationIndex, Probability> {
        let mut out = HashMap::new();
        for (&s, &p) in dist {
            for &(next, q) in Self::transitions(s) {
                *out.entry(next).or_insert(0.0) += p * q;
            }
        }
        out
    }
    fn belief_after_choice_and_observation(&self, _b: &Belief, _action: usize, o_next: ObservationIndex) -> Belief {
        Belief::new(o_next, vec![1.0])
    }
    fn reward_after_choice(&self, _b: &Belief, _action: usize) -> Reward {
        0.0
    }
    fn target_observations(&self) -> Result<Vec<ObservationIndex>, SolveError> {
        Ok(vec![5])
    }
}

/// a POMDP with an observationally-equivalent target: `target_observations`
/// FAILs because the target state's class is shared with a non-target
/// state (spec §8 scenario 3).
pub struct AmbiguousTarget;

impl Pomdp for AmbiguousTarget {
    fn num_states(&self) -> usize {
        2
    }
    fn num_observations(&self) -> usize {
        1
    }
    fn num_unobservations(&self) -> usize {
        2
    }
    fn obs(&self, _s: StateIndex) -> ObservationIndex {
        0
    }
    fn unobs(&self, s: StateIndex) -> usize {
        s
    }
    fn initial_belief(&self) -> Result<Belief, SolveError> {
        Ok(Belief::new(0, vec![1.0, 0.0]))
    }
    fn num_choices_for_observation(&self, _o: ObservationIndex) -> usize {
        1
    }
    fn action_label(&self, _o: ObservationIndex, _choice: usize) -> String {
        "step".into()
    }
    fn observation_probs_after_action(
        &self,
        _dist: &HashMap<StateIndex, Probability>,
        _action: usize,
    ) -> HashMap<ObservationIndex, Probability> {
        HashMap::from([(0, 1.0)])
    }
    fn belief_after_choice_and_observation(&self, b: &Belief, _action: usize, o_next: ObservationIndex) -> Belief {
        Belief::new(o_next, b.refinements().to_vec())
    }
    fn reward_after_choice(&self, _b: &Belief, _action: usize) -> Reward {
        0.0
    }
    fn target_observations(&self) -> Result<Vec<ObservationIndex>, SolveError> {
        // target is state 0 alone, but obs(0) == obs(1) == 0: the
        // preimage of {0} is {0, 1}, not the target set itself.
        Err(SolveError::TargetNotObservable {
            target_observations: vec![0],
        })
    }
}

/// a POMDP declaring two initial states; `initial_belief` FAILs (spec §8
/// scenario 4).
pub struct MultipleInitialStates;

impl Pomdp for MultipleInitialStates {
    fn num_states(&self) -> usize {
        2
    }
    fn num_observations(&self) -> usize {
        2
    }
    fn num_unobservations(&self) -> usize {
        1
    }
    fn obs(&self, s: StateIndex) -> ObservationIndex {
        s
    }
    fn unobs(&self, _s: StateIndex) -> usize {
        0
    }
    fn initial_belief(&self) -> Result<Belief, SolveError> {
        Err(SolveError::Unsupported(
            pomdp_belief_grid::error::Unsupported::MultipleInitialStates,
        ))
    }
    fn num_choices_for_observation(&self, _o: ObservationIndex) -> usize {
        1
    }
    fn action_label(&self, _o: ObservationIndex, _choice: usize) -> String {
        "step".into()
    }
    fn observation_probs_after_action(
        &self,
        _dist: &HashMap<StateIndex, Probability>,
        _action: usize,
    ) -> HashMap<ObservationIndex, Probability> {
        HashMap::from([(1, 1.0)])
    }
    fn belief_after_choice_and_observation(&self, _b: &Belief, _action: usize, o_next: ObservationIndex) -> Belief {
        Belief::new(o_next, vec![1.0])
    }
    fn reward_after_choice(&self, _b: &Belief, _action: usize) -> Reward {
        0.0
    }
    fn target_observations(&self) -> Result<Vec<ObservationIndex>, SolveError> {
        Ok(vec![1])
    }
}

/// fixed-point relaxation over the strategy chain's own edges, standing
/// in for the external MDP solver the driver is specified to consume
/// (spec §6). correct in the limit for any chain whose reachable-from-
/// root sub-chain has no probability leak; `iters` should be large enough
/// for the chain's mixing time.
pub struct BruteForceSolver {
    pub iters: usize,
}

impl BruteForceSolver {
    fn relax(&self, chain: &StrategyChain, base: impl Fn(petgraph::graph::NodeIndex) -> f64) -> Vec<f64> {
        let n = chain.graph.node_count();
        let mut v = vec![0.0; n];
        for _ in 0..self.iters {
            let mut next = vec![0.0; n];
            for node in chain.graph.node_indices() {
                if chain.label(node) == Some(TARGET_LABEL) {
                    next[node.index()] = base(node);
                    continue;
                }
                let mut acc = base(node);
                for edge in chain.graph.edges(node) {
                    acc += edge.weight().probability * v[edge.target().index()];
                }
                next[node.index()] = acc;
            }
            v = next;
        }
        v
    }
}

impl MdpSolver for BruteForceSolver {
    fn reach_probs(&self, chain: &StrategyChain, _target_label: &str) -> Result<(f64, Accuracy), SolveError> {
        let v = self.relax(chain, |node| if chain.label(node) == Some(TARGET_LABEL) { 1.0 } else { 0.0 });
        let value = v[chain.root.index()];
        Ok((value, Accuracy::from_residual(value, 1e-9, false)))
    }

    fn reach_rewards(
        &self,
        chain: &StrategyChain,
        rewards: &[Reward],
        _target_label: &str,
    ) -> Result<(f64, Accuracy), SolveError> {
        let v = self.relax(chain, |node| {
            if chain.label(node) == Some(TARGET_LABEL) {
                0.0
            } else {
                rewards[node.index()]
            }
        });
        let value = v[chain.root.index()];
        Ok((value, Accuracy::from_residual(value, 1e-9, false)))
    }
}
