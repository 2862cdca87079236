//! Decision layer: expected free energy, policy formation and sampling.

pub mod efe;
pub mod sampling;

pub use efe::{
    free_energy_terms, infer_policies, predict_states, ActionEvaluation, PolicyInference,
};
pub use sampling::sample_index;
