//! Engine event emission.
//!
//! Events are dispatched synchronously, in registration order, to every
//! subscribed handler. Each handler call is isolated: a panicking handler is
//! logged and skipped without affecting later handlers or engine state.
//! Consumers that prefer pulling can subscribe a channel instead, and
//! [`JsonlSink`] turns any writer into a JSONL event log.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inference::{Beliefs, Observation};
use crate::logging::event_names as log_events;
use crate::model::Action;

/// Standard engine event names (the `type` tag of [`EngineEvent`]).
pub mod event_names {
    pub const BELIEFS_UPDATED: &str = "beliefs_updated";
    pub const SURPRISE_HIGH: &str = "surprise_high";
    pub const POLICY_INFERRED: &str = "policy_inferred";
    pub const ACTION_SELECTED: &str = "action_selected";
}

/// Notification emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Beliefs were replaced by a state-inference call.
    BeliefsUpdated { beliefs: Beliefs, surprise: f64 },
    /// Surprise exceeded the configured threshold.
    SurpriseHigh {
        surprise: f64,
        observation: Observation,
    },
    /// A policy was computed.
    PolicyInferred { efe: Vec<f64>, policy: Vec<f64> },
    /// An action was sampled from a policy.
    ActionSelected { action: Action, probability: f64 },
}

impl EngineEvent {
    /// Stable event name, identical to the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::BeliefsUpdated { .. } => event_names::BELIEFS_UPDATED,
            EngineEvent::SurpriseHigh { .. } => event_names::SURPRISE_HIGH,
            EngineEvent::PolicyInferred { .. } => event_names::POLICY_INFERRED,
            EngineEvent::ActionSelected { .. } => event_names::ACTION_SELECTED,
        }
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","type":"{}"}}"#,
                self.name()
            )
        })
    }
}

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler = Box<dyn FnMut(&EngineEvent) + Send>;

/// Ordered registry of event handlers.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    handlers: Vec<(Subscription, Handler)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it runs after every handler registered earlier.
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&EngineEvent) + Send + 'static,
    {
        let sub = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((sub, Box::new(handler)));
        sub
    }

    /// Subscribe a channel that receives a clone of every event.
    ///
    /// Once the receiver is dropped, sends fail silently.
    pub fn subscribe_channel(&mut self) -> (Subscription, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel();
        let sub = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (sub, rx)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != sub);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `event` to every handler. Returns the number of handlers
    /// that panicked.
    pub fn emit(&mut self, event: &EngineEvent) -> usize {
        let mut failures = 0;
        for (sub, handler) in &mut self.handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if let Err(payload) = result {
                failures += 1;
                tracing::error!(
                    target: log_events::EVENT_HANDLER_FAILED,
                    event = event.name(),
                    subscription = sub.0,
                    panic = %panic_message(payload.as_ref()),
                    "event handler panicked"
                );
            }
        }
        failures
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// One line of a JSONL event log.
#[derive(Serialize)]
struct EventRecord<'a> {
    ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<&'a str>,
    #[serde(flatten)]
    event: &'a EngineEvent,
}

/// Writes each event as a timestamped JSON line.
pub struct JsonlSink<W: Write + Send> {
    writer: W,
    run_id: Option<String>,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            run_id: None,
        }
    }

    /// Tag every line with a run ID.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Write one event. Write errors are reported to the caller.
    pub fn write_event(&mut self, event: &EngineEvent) -> std::io::Result<()> {
        let record = EventRecord {
            ts: Utc::now(),
            run_id: self.run_id.as_deref(),
            event,
        };
        let line = serde_json::to_string(&record).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }

    /// Convert into an event handler. Write errors are logged and dropped.
    pub fn into_handler(mut self) -> impl FnMut(&EngineEvent) + Send
    where
        W: 'static,
    {
        move |event| {
            if let Err(e) = self.write_event(event) {
                tracing::warn!(event = event.name(), error = %e, "failed to write event");
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
