//! Strategy extraction (spec §4.6): BFS-explore beliefs reachable under
//! the greedy policy rooted at the initial belief, emitting a Markov
//! chain for inner-bound evaluation by an external MDP solver.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::belief::Belief;
use crate::belief_mdp;
use crate::config::Config;
use crate::error::SolveError;
use crate::interpolate;
use crate::objective::Direction;
use crate::pomdp::Pomdp;
use crate::{ActionIndex, ObservationIndex, Probability, Reward};

/// action-comparison tolerance for tie-breaking (spec §4.6: "ties:
/// last-considered action wins").
const EPS_ACT: f64 = 1e-6;

/// the single label the strategy chain ever assigns to a node, matching
/// spec §4.6 ("mark src as target").
pub const TARGET_LABEL: &str = "target";

/// a node of the strategy-induced Markov chain.
#[derive(Debug, Clone)]
pub struct StrategyState {
    pub belief: Belief,
    pub is_target: bool,
    /// `R̄(b, a*)`, the expected immediate reward of the chosen action;
    /// only meaningful for the reward variant.
    pub reward: Reward,
}

/// an edge of the strategy-induced Markov chain: the probability of the
/// §4.3 posterior transition, labeled with the action that produced it
/// purely for exportability (spec §4.6).
#[derive(Debug, Clone)]
pub struct StrategyEdge {
    pub action_label: String,
    pub probability: Probability,
}

/// the Markov chain handed to the external [`crate::pomdp::MdpSolver`]
/// (spec §3 "Strategy chain"). cycles are expected (a belief can recur
/// under the greedy policy), so states are addressed by arena index
/// rather than owned pointers (spec §9).
#[derive(Debug)]
pub struct StrategyChain {
    pub graph: DiGraph<StrategyState, StrategyEdge>,
    pub root: NodeIndex,
}

impl StrategyChain {
    /// per-state reward vector in node-index order, for the reward
    /// variant of the external solver's `reach_rewards` call.
    pub fn rewards(&self) -> Vec<Reward> {
        self.graph.node_weights().map(|s| s.reward).collect()
    }

    /// the label a state carries, if any. every target state is labeled
    /// [`TARGET_LABEL`]; no other labels are produced.
    pub fn label(&self, node: NodeIndex) -> Option<&'static str> {
        self.graph[node].is_target.then_some(TARGET_LABEL)
    }
}

/// explore reachable beliefs by BFS from `b₀` under the policy greedy
/// with respect to the converged value map `value` (spec §4.6).
pub fn extract<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
    value: &HashMap<Belief, f64>,
) -> Result<StrategyChain, SolveError> {
    let b0 = pomdp.initial_belief()?;
    let mut graph = DiGraph::new();
    let mut index_of: HashMap<Belief, NodeIndex> = HashMap::new();

    let root = graph.add_node(StrategyState {
        belief: b0.clone(),
        is_target: target_observations.contains(&b0.observation()),
        reward: 0.0,
    });
    index_of.insert(b0.clone(), root);

    let mut queue: VecDeque<(Belief, NodeIndex)> = VecDeque::new();
    queue.push_back((b0, root));

    while let Some((b, src)) = queue.pop_front() {
        if target_observations.contains(&b.observation()) {
            continue;
        }

        let (a_star, reward, successors) =
            greedy_choice(pomdp, config, target_observations, value, &b)?;
        graph[src].reward = reward;
        let label = pomdp.action_label(b.observation(), a_star);

        for (b_next, p) in successors {
            let dst = *index_of.entry(b_next.clone()).or_insert_with(|| {
                let node = graph.add_node(StrategyState {
                    belief: b_next.clone(),
                    is_target: target_observations.contains(&b_next.observation()),
                    reward: 0.0,
                });
                queue.push_back((b_next.clone(), node));
                node
            });
            graph.add_edge(
                src,
                dst,
                StrategyEdge {
                    action_label: label.clone(),
                    probability: p,
                },
            );
        }
    }

    log::info!("strategy chain extracted: {} states", graph.node_count());
    Ok(StrategyChain { graph, root })
}

/// select `a*` (spec §4.6 step 2) and return its reward and successor
/// distribution so the caller doesn't recompute either.
fn greedy_choice<P: Pomdp + ?Sized>(
    pomdp: &P,
    config: &Config,
    target_observations: &HashSet<ObservationIndex>,
    value: &HashMap<Belief, f64>,
    b: &Belief,
) -> Result<(ActionIndex, Reward, HashMap<Belief, Probability>), SolveError> {
    let num_actions = pomdp.num_choices_for_observation(b.observation());
    let mut best_action = 0;
    let mut best_value = config.direction.init();
    let mut best_successors = HashMap::new();

    for a in 0..num_actions {
        let successors = belief_mdp::successors(pomdp, b, a);
        let mut q = if config.objective.adds_immediate_reward() {
            pomdp.reward_after_choice(b, a)
        } else {
            0.0
        };
        for (b_next, p) in &successors {
            let v_tilde = if target_observations.contains(&b_next.observation()) {
                config.objective.target_value()
            } else {
                interpolate::interpolate(b_next, value, config.resolution)?
            };
            q += p * v_tilde;
        }

        // last-wins: replace on strict improvement *or* a tie within
        // EPS_ACT, so later actions in iteration order win ties.
        let tied_or_better = match config.direction {
            Direction::Max => q >= best_value - EPS_ACT,
            Direction::Min => q <= best_value + EPS_ACT,
        };
        if tied_or_better {
            best_action = a;
            best_value = q;
            best_successors = successors;
        }
    }

    let reward = if config.objective.adds_immediate_reward() {
        pomdp.reward_after_choice(b, best_action)
    } else {
        0.0
    };
    Ok((best_action, reward, best_successors))
}
