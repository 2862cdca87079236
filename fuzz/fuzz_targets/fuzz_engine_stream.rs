//! Fuzz target for long observation streams with supervision.
//!
//! Drives a seeded engine through arbitrary steps, learning updates and
//! resets, checking that beliefs and likelihoods stay normalized.

#![no_main]

use aif_config::{EngineConfig, LearningRule};
use aif_core::inference::BELIEF_TOLERANCE;
use aif_core::{Channel, Engine, Factor, Observation, TrueState};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Step([u8; 5]),
    Learn([u8; 5], u8, u8),
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    dirichlet: bool,
    iterations: u8,
    ops: Vec<Op>,
}

fn observation(raw: [u8; 5]) -> Observation {
    let [e, p, t, c, k] = raw.map(usize::from);
    Observation::new(
        e % Channel::Energy.cardinality(),
        p % Channel::Phi.cardinality(),
        t % Channel::ToolOutcome.cardinality(),
        c % Channel::Coherence.cardinality(),
        k % Channel::Task.cardinality(),
    )
}

fuzz_target!(|input: Input| {
    let rule = if input.dirichlet {
        LearningRule::Dirichlet
    } else {
        LearningRule::Counting
    };
    let config = EngineConfig::default()
        .with_seed(input.seed)
        .with_learning_rule(rule)
        .with_inference_iterations(u32::from(input.iterations % 64));
    let mut engine = Engine::new(config).expect("valid config");

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Step(raw) => {
                engine.step(&observation(raw)).expect("in-range observation");
            }
            Op::Learn(raw, factor, state) => {
                let factor = Factor::ALL[usize::from(factor) % Factor::ALL.len()];
                let truth = TrueState::default()
                    .with(factor, usize::from(state) % factor.cardinality());
                engine
                    .update_a_matrix(&observation(raw), &truth)
                    .expect("in-range supervision");
            }
            Op::Reset => engine.reset_beliefs(),
        }
        assert!(engine.beliefs().is_valid(BELIEF_TOLERANCE));
    }

    for channel in Channel::ALL {
        let a = engine.model().likelihood(channel);
        for s in 0..a.num_states() {
            let sum: f64 = a.column(s).iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }
});
