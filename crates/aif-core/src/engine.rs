//! The active inference engine.
//!
//! Owns the generative model, the current beliefs, the learner, statistics,
//! the event registry and the random source. All operations take `&mut self`
//! and run synchronously; there is no global instance.

use aif_config::{validate_engine_config, EngineConfig};
use aif_math::uniform;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::sync::mpsc;

use crate::decision::{self, sample_index, PolicyInference};
use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventBus, Subscription};
use crate::inference::{self, Beliefs, MostLikelyState, Observation, TrueState};
use crate::learning::LikelihoodLearner;
use crate::logging::{event_names, Stage};
use crate::model::{default_model, Action, GenerativeModel};
use crate::stats::{EngineStats, StatsTracker};

/// Everything produced by one perception-action cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub action: Action,
    /// Policy probability of the selected action.
    pub probability: f64,
    /// Surprise of the observation under the updated beliefs.
    pub surprise: f64,
    pub efe: Vec<f64>,
    pub policy: Vec<f64>,
    pub most_likely: MostLikelyState,
}

/// Serializable view of engine state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub beliefs: Beliefs,
    pub most_likely: MostLikelyState,
    pub stats: EngineStats,
    pub config: EngineConfig,
}

/// Active inference agent over the fixed factor/channel/action layout.
#[derive(Debug)]
pub struct Engine<R: RngCore = StdRng> {
    config: EngineConfig,
    model: GenerativeModel,
    beliefs: Beliefs,
    learner: LikelihoodLearner,
    stats: StatsTracker,
    events: EventBus,
    rng: R,
}

impl Engine<StdRng> {
    /// Engine with the default model. Fails on an invalid config.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_model(config, default_model())
    }

    /// Engine with default config and model.
    pub fn with_defaults() -> Self {
        match Self::new(EngineConfig::default()) {
            Ok(engine) => engine,
            Err(e) => unreachable!("default engine config is invalid: {e}"),
        }
    }

    /// Engine with a caller-supplied model. The sampler is seeded from
    /// `config.seed` when set, otherwise from OS entropy.
    pub fn with_model(config: EngineConfig, model: GenerativeModel) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Engine::with_rng(config, model, rng)
    }
}

impl<R: RngCore> Engine<R> {
    /// Engine with an injected random source. `config.seed` is ignored.
    pub fn with_rng(config: EngineConfig, model: GenerativeModel, rng: R) -> Result<Self> {
        validate_engine_config(&config)?;
        let learner = LikelihoodLearner::from_config(&config, &model)?;
        let beliefs = Beliefs::from_prior(&model);

        tracing::debug!(
            target: event_names::ENGINE_CREATED,
            inference_iterations = config.inference_iterations,
            action_temperature = config.action_temperature,
            learning_rule = %config.learning_rule,
            seeded = config.seed.is_some(),
            "engine created"
        );

        Ok(Self {
            config,
            model,
            beliefs,
            learner,
            stats: StatsTracker::default(),
            events: EventBus::new(),
            rng,
        })
    }

    /// Update beliefs from `obs` and return a copy of the posterior.
    ///
    /// Out-of-range readings are rejected before any state changes.
    pub fn infer_states(&mut self, obs: &Observation) -> Result<Beliefs> {
        self.update_beliefs(obs)?;
        Ok(self.beliefs.clone())
    }

    /// State inference proper; returns the surprise.
    fn update_beliefs(&mut self, obs: &Observation) -> Result<f64> {
        let out = inference::infer_states(
            &self.model,
            &self.beliefs,
            obs,
            self.config.inference_iterations,
        )?;
        self.beliefs = out.beliefs;
        self.stats.record_inference(out.surprise);

        tracing::debug!(
            target: event_names::INFER_FINISHED,
            stage = %Stage::Infer,
            surprise = out.surprise,
            log_evidence = out.log_evidence,
            passes = out.passes,
            "state inference complete"
        );

        self.events.emit(&EngineEvent::BeliefsUpdated {
            beliefs: self.beliefs.clone(),
            surprise: out.surprise,
        });

        if out.surprise > self.config.surprise_threshold {
            tracing::warn!(
                target: event_names::INFER_SURPRISE_HIGH,
                stage = %Stage::Infer,
                surprise = out.surprise,
                threshold = self.config.surprise_threshold,
                "observation is highly surprising"
            );
            self.events.emit(&EngineEvent::SurpriseHigh {
                surprise: out.surprise,
                observation: *obs,
            });
        }

        Ok(out.surprise)
    }

    /// Evaluate expected free energy for every action and form the policy.
    ///
    /// Does not change beliefs or model.
    pub fn infer_policies(&mut self) -> PolicyInference {
        let out = decision::infer_policies(&self.model, &self.beliefs, self.config.action_temperature);

        tracing::debug!(
            target: event_names::POLICY_INFERRED,
            stage = %Stage::Decide,
            best_action = %out.best_action(),
            best_probability = out.probability(out.best_action()),
            "policy inferred"
        );

        self.events.emit(&EngineEvent::PolicyInferred {
            efe: out.efe.clone(),
            policy: out.policy.clone(),
        });
        out
    }

    /// Sample an action from `policy` (one probability per action).
    ///
    /// A policy with no positive mass is treated as uniform.
    pub fn sample_action(&mut self, policy: &[f64]) -> Result<Action> {
        if policy.len() != Action::COUNT {
            return Err(Error::PolicyLengthMismatch {
                expected: Action::COUNT,
                actual: policy.len(),
            });
        }

        let index = sample_index(policy, &mut self.rng)
            .or_else(|| sample_index(&uniform(Action::COUNT), &mut self.rng));
        let action = index.and_then(Action::from_index).unwrap_or(Action::Idle);
        let probability = policy[action.index()];
        self.stats.record_action(action);

        tracing::debug!(
            target: event_names::ACTION_SELECTED,
            stage = %Stage::Act,
            action = %action,
            probability,
            "action selected"
        );

        self.events.emit(&EngineEvent::ActionSelected {
            action,
            probability,
        });
        Ok(action)
    }

    /// Infer states, infer policies and sample an action.
    pub fn step(&mut self, obs: &Observation) -> Result<Action> {
        self.step_detailed(obs).map(|outcome| outcome.action)
    }

    /// [`step`](Self::step), returning the intermediate results too.
    pub fn step_detailed(&mut self, obs: &Observation) -> Result<StepOutcome> {
        let surprise = self.update_beliefs(obs)?;
        let policy = self.infer_policies();
        let action = self.sample_action(&policy.policy)?;
        Ok(StepOutcome {
            action,
            probability: policy.probability(action),
            surprise,
            efe: policy.efe,
            policy: policy.policy,
            most_likely: self.beliefs.most_likely(),
        })
    }

    /// Copy of the current beliefs.
    pub fn beliefs(&self) -> Beliefs {
        self.beliefs.clone()
    }

    /// Argmax label per factor.
    pub fn most_likely_state(&self) -> MostLikelyState {
        self.beliefs.most_likely()
    }

    /// Surprise of `obs` under the current beliefs, without updating them.
    pub fn surprise_of(&self, obs: &Observation) -> Result<f64> {
        inference::surprise(&self.model, &self.beliefs, obs)
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.snapshot()
    }

    /// Restore beliefs to the prior D. Learned A and statistics are kept.
    pub fn reset_beliefs(&mut self) {
        self.beliefs = Beliefs::from_prior(&self.model);
        tracing::debug!(target: event_names::BELIEFS_RESET, "beliefs reset to prior");
    }

    /// Supervised update of the likelihood matrices.
    pub fn update_a_matrix(&mut self, obs: &Observation, truth: &TrueState) -> Result<()> {
        let channels = self.learner.update(&mut self.model, obs, truth)?;
        self.stats.record_learning();

        tracing::debug!(
            target: event_names::LEARN_A_UPDATED,
            stage = %Stage::Learn,
            rule = %self.learner.rule(),
            channels = ?channels,
            "likelihood updated"
        );
        Ok(())
    }

    /// Register an event handler.
    pub fn on<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Receive events through a channel instead of a callback.
    pub fn subscribe_channel(&mut self) -> (Subscription, mpsc::Receiver<EngineEvent>) {
        self.events.subscribe_channel()
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.events.unsubscribe(sub)
    }

    pub fn model(&self) -> &GenerativeModel {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            beliefs: self.beliefs(),
            most_likely: self.most_likely_state(),
            stats: self.stats(),
            config: self.config.clone(),
        }
    }
}
