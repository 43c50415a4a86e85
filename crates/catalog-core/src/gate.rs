//! Confirmation gate: two-step arm/confirm state machine for destructive or
//! costly actions.
//!
//! ```text
//!          request            request
//!   Idle ───────────▶ Armed ───────────▶ Pending
//!    ▲                  │                   │
//!    │  expire / cancel │                   │ complete / cancel
//!    └──────────────────┴───────────────────┘
//!          input change (while Armed)
//! ```
//!
//! The gate is pure: it never sleeps or spawns. Arming hands back an
//! [`ArmToken`] the owner uses to schedule the expiry, and confirmation hands
//! back an [`Authorization`] carrying the payload captured at that instant.
//! Both carry the gate generation, so an expiry or completion delivered after
//! the gate has moved on is recognised as stale and ignored.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::Subject;

/// Window for the second request, after which an armed gate disarms.
pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatePhase {
    Idle,
    Armed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Armed { armed_at: DateTime<Utc> },
    Pending,
}

/// Handed out on Idle → Armed. The owner schedules an expiry for `deadline`
/// and reports it back through [`ConfirmationGate::expire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmToken {
    pub subject: Subject,
    pub generation: u64,
    pub deadline: DateTime<Utc>,
}

/// Handed out on Armed → Pending: the one permission to run the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization<P> {
    pub subject: Subject,
    pub payload: P,
    pub ticket: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome<P> {
    /// First request: the gate is now armed.
    Armed(ArmToken),
    /// Second request within the window: run the action exactly once.
    Confirmed(Authorization<P>),
    /// An action is already in flight.
    Ignored,
}

/// Rendering view of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Idle,
    Armed { remaining: Duration },
    Pending,
}

#[derive(Debug, Clone)]
pub struct ConfirmationGate<P> {
    subject: Subject,
    payload: P,
    timeout: Duration,
    state: State,
    generation: u64,
}

impl<P: Clone + PartialEq> ConfirmationGate<P> {
    pub fn new(subject: Subject, payload: P, timeout: Duration) -> Self {
        Self {
            subject,
            payload,
            timeout,
            state: State::Idle,
            generation: 0,
        }
    }

    pub fn with_default_timeout(subject: Subject, payload: P) -> Self {
        Self::new(
            subject,
            payload,
            Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
        )
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn phase(&self) -> GatePhase {
        match self.state {
            State::Idle => GatePhase::Idle,
            State::Armed { .. } => GatePhase::Armed,
            State::Pending => GatePhase::Pending,
        }
    }

    pub fn armed_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            State::Armed { armed_at } => Some(armed_at),
            _ => None,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> GateStatus {
        match self.state {
            State::Idle => GateStatus::Idle,
            State::Armed { armed_at } => {
                let left = self.deadline_from(armed_at) - now;
                GateStatus::Armed {
                    remaining: left.to_std().unwrap_or(Duration::ZERO),
                }
            }
            State::Pending => GateStatus::Pending,
        }
    }

    /// A user asks for the action.
    ///
    /// An armed gate whose window has already elapsed is treated as expired
    /// even if its timer has not been delivered yet, so a late second request
    /// re-arms instead of confirming.
    pub fn request(&mut self, now: DateTime<Utc>) -> RequestOutcome<P> {
        match self.state {
            State::Pending => RequestOutcome::Ignored,
            State::Armed { armed_at } if now < self.deadline_from(armed_at) => {
                self.transition(State::Pending);
                RequestOutcome::Confirmed(Authorization {
                    subject: self.subject,
                    payload: self.payload.clone(),
                    ticket: self.generation,
                })
            }
            State::Idle | State::Armed { .. } => {
                self.transition(State::Armed { armed_at: now });
                RequestOutcome::Armed(ArmToken {
                    subject: self.subject,
                    generation: self.generation,
                    deadline: self.deadline_from(now),
                })
            }
        }
    }

    /// Force Idle from any state. Returns whether anything changed.
    ///
    /// Cancelling while Pending does not stop the in-flight action; its
    /// completion will arrive with a stale ticket and be ignored.
    pub fn cancel(&mut self) -> bool {
        if self.state == State::Idle {
            return false;
        }
        self.transition(State::Idle);
        true
    }

    /// Timer delivery for the arming identified by `generation`.
    pub fn expire(&mut self, generation: u64) -> bool {
        if matches!(self.state, State::Armed { .. }) && generation == self.generation {
            self.transition(State::Idle);
            return true;
        }
        false
    }

    /// The invoker finished (success or failure) for `ticket`.
    pub fn complete(&mut self, ticket: u64) -> bool {
        if self.state == State::Pending && ticket == self.generation {
            self.transition(State::Idle);
            return true;
        }
        false
    }

    /// The input the action would run with has changed. An armed gate
    /// disarms before anything else is processed. Returns whether it
    /// disarmed.
    pub fn set_input(&mut self, payload: P) -> bool {
        if payload == self.payload {
            return false;
        }
        self.payload = payload;
        if matches!(self.state, State::Armed { .. }) {
            self.transition(State::Idle);
            return true;
        }
        false
    }

    fn transition(&mut self, next: State) {
        self.state = next;
        self.generation = self.generation.wrapping_add(1);
    }

    fn deadline_from(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.timeout)
            .ok()
            .and_then(|delta| at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
