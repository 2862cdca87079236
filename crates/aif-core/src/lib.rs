//! Active Inference Core Library
//!
//! A POMDP-style agent that keeps categorical beliefs over hidden-state
//! factors, updates them from discrete observations by mean-field
//! variational inference, and selects actions by minimizing expected free
//! energy:
//! - `model`: factors, channels, actions and the A/B/C/D tables
//! - `inference`: beliefs and the state update
//! - `decision`: expected free energy, policies and sampling
//! - `learning`: online updates of the likelihood matrices
//! - `engine`: the stateful agent tying these together
//! - `events` and `logging`: observation of the agent from outside
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod inference;
pub mod learning;
pub mod logging;
pub mod model;
pub mod stats;

pub use engine::{Engine, EngineSnapshot, StepOutcome};
pub use error::{Error, Result};
pub use events::{EngineEvent, JsonlSink, Subscription};
pub use inference::{Beliefs, MostLikelyState, Observation, TrueState};
pub use model::{Action, Channel, Factor, GenerativeModel, ModelBuilder};
pub use stats::EngineStats;
