//! State inference: beliefs, observations and the mean-field update.

pub mod beliefs;
pub mod state;

pub use beliefs::{Beliefs, MostLikelyState, Observation, TrueState, BELIEF_TOLERANCE};
pub use state::{infer_states, surprise, StateInference};
