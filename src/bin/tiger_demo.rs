//! Demo binary: solves the classic Tiger problem with the belief-grid
//! engine and a brute-force reference Markov-chain solver, and prints
//! the resulting bound.

use std::collections::HashMap;

use clap::Parser;
use pomdp_belief_grid::pomdp::{MdpSolver, Pomdp};
use pomdp_belief_grid::strategy::{StrategyChain, TARGET_LABEL};
use pomdp_belief_grid::{Accuracy, Belief, Config, Direction, ObservationIndex, Objective, Probability, Reward, SolveError, StateIndex};

#[derive(Parser)]
#[command(author, version, about = "Solve the Tiger problem with fixed-resolution belief-grid value iteration")]
struct Args {
    /// grid resolution M.
    #[arg(long, default_value_t = 10)]
    resolution: u32,
    /// maximum Bellman sweeps.
    #[arg(long, default_value_t = 1000)]
    max_iters: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let pomdp = Tiger;
    let solver = BruteForceSolver { iters: 1000 };
    let config = Config::new(args.resolution, Direction::Max, Objective::ExpectedReward).with_max_iters(args.max_iters);

    match pomdp_belief_grid::driver::solve(&pomdp, &solver, &config) {
        Ok(result) => {
            println!(
                "value = {:.4} (accuracy [{:.4}, {:.4}]), {} sweeps, {:?}",
                result.value,
                result.accuracy.interval.lower,
                result.accuracy.interval.upper,
                result.num_iters,
                result.time_taken
            );
        }
        Err(err) => {
            eprintln!("solve failed: {err}");
            std::process::exit(1);
        }
    }
}

const LISTEN: usize = 0;
const OPEN_LEFT: usize = 1;
const OPEN_RIGHT: usize = 2;
const LISTEN_ACCURACY: f64 = 0.85;
const REWARD_LISTEN: f64 = -1.0;
const REWARD_CORRECT_OPEN: f64 = 10.0;
const REWARD_WRONG_OPEN: f64 = -100.0;
const OBS_START: usize = 0;
const OBS_HEARD_LEFT: usize = 1;
const OBS_HEARD_RIGHT: usize = 2;
const OBS_OPENED: usize = 3;

/// the classic Tiger problem: two hidden tiger positions, a noisy
/// `listen` action, and two terminal `open` actions.
struct Tiger;

impl Tiger {
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
                let (like_left, like_right) = if o_next == OBS_HEARD_LEFT {
                    (LISTEN_ACCURACY, 1.0 - LISTEN_ACCURACY)
                } else {
                    (1.0 - LISTEN_ACCURACY, LISTEN_ACCURACY)
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

/// fixed-point relaxation over the strategy chain's own edges, standing
/// in for the external MDP solver the driver is specified to consume.
struct BruteForceSolver {
    iters: usize,
}

impl BruteForceSolver {
    fn relax(&self, chain: &StrategyChain, base: impl Fn(petgraph::graph::NodeIndex) -> f64) -> Vec<f64> {
        use petgraph::visit::EdgeRef;
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
