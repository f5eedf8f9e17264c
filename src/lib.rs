//! Fixed-resolution belief-grid value iteration for POMDP reachability and
//! expected-reward objectives (Lovejoy 1991).
//!
//! This crate builds a finite grid over the belief simplex, constructs the
//! induced "belief MDP" over that grid, runs bounded value iteration to
//! obtain a sound outer bound on the optimal value, and extracts a
//! strategy-induced Markov chain whose value (computed by an external MDP
//! solver) is a sound inner bound. The pair brackets the true optimum.
//!
//! The POMDP itself, the MDP solver used to evaluate the extracted
//! strategy, property parsing, CLI glue, and file I/O are all external
//! collaborators, consumed only through the traits in [`pomdp`].

pub mod belief;
pub mod belief_mdp;
pub mod cancel;
pub mod config;
pub mod driver;
pub mod error;
pub mod interpolate;
pub mod objective;
pub mod pomdp;
pub mod simplex;
pub mod strategy;
pub mod value_iteration;

/// probability mass, always in `[0, 1]`
pub type Probability = f64;
/// one-step or cumulative reward
pub type Reward = f64;
/// index into the POMDP's state space
pub type StateIndex = usize;
/// index into the POMDP's observation classes
pub type ObservationIndex = usize;
/// index into the POMDP's per-observation refinement space
pub type RefinementIndex = usize;
/// index into the per-observation action list
pub type ActionIndex = usize;

pub use belief::Belief;
pub use config::Config;
pub use driver::SolveResult;
pub use error::SolveError;
pub use objective::{Accuracy, Direction, Interval, Objective};
pub use pomdp::{MdpSolver, Pomdp};
