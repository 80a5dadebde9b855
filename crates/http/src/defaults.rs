//! Defaulters applied to outgoing events before they are encoded.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use evently_core::Timestamp;
use evently_events::Event;

/// Source of "now" for timestamp defaulting.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(Utc::now())
    }
}

/// Clock frozen at one instant. Prefer this in tests for determinism.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Which attributes get filled in when the producer left them unset.
///
/// The default applies nothing.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    clock: Option<Arc<dyn Clock>>,
    generate_ids: bool,
}

impl Defaults {
    /// Set `time` from `clock` when unset.
    pub fn with_time_now(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Some(Arc::new(clock)),
            generate_ids: false,
        }
    }

    /// Also set an empty `id` to a random UUID.
    pub fn with_uuid_ids(mut self) -> Self {
        self.generate_ids = true;
        self
    }

    /// Return `event` with the configured defaults filled in; set attributes
    /// are never overwritten.
    pub fn apply(&self, event: Event) -> Event {
        let (mut context, data) = event.into_parts();
        if self.generate_ids && context.id().is_empty() {
            context = context.with_id(Uuid::new_v4().to_string());
        }
        if let Some(clock) = &self.clock {
            if context.time().is_none() {
                context = context.with_time(clock.now());
            }
        }
        Event::from_parts(context, data)
    }
}
