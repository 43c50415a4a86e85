//! GateBoard: owns the confirmation gates of one view.
//!
//! Each gate gets a countdown task while armed and an invoker task while
//! pending. Both report back over a single channel, and the owning view feeds
//! every event through [`GateBoard::handle_event`], so a gate only ever changes
//! on the view's own task, one event at a time.
//!
//! Dropping the board cancels every countdown. Invoker tasks are not
//! cancelled; their completions find the channel closed and vanish.
//!
//! Every slot gets a board-wide epoch when it is created. Events carry the
//! epoch of the slot that scheduled them, so a timer or completion from a
//! disposed gate never reaches a later gate for the same subject.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use catalog_client::CatalogApi;
use catalog_core::{ConfirmationGate, GatePhase, GateStatus, RequestOutcome, Subject};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::invoker::{self, Action, ActionFailure, ActionResult, ActionSuccess};

/// Delivered to the view from timer and invoker tasks.
#[derive(Debug)]
pub enum GateEvent {
    Expired {
        subject: Subject,
        epoch: u64,
        generation: u64,
    },
    Completed {
        subject: Subject,
        epoch: u64,
        ticket: u64,
        result: ActionResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisarmReason {
    Expired,
    Cancelled,
    InputChanged,
}

/// What a command or event did, for the view to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardUpdate {
    Armed {
        subject: Subject,
        deadline: DateTime<Utc>,
    },
    /// Armed → Pending: the invoker has been started.
    Confirmed { subject: Subject },
    /// A request hit a gate that is already pending.
    Ignored { subject: Subject },
    Disarmed {
        subject: Subject,
        reason: DisarmReason,
    },
    Succeeded(ActionSuccess),
    Failed(ActionFailure),
    /// Nothing to do: idle gate cancelled, or an event for a gate that has
    /// since moved on or been disposed.
    Unchanged,
}

struct Slot {
    epoch: u64,
    gate: ConfirmationGate<Action>,
    /// Cancels the countdown when replaced or dropped.
    countdown: Option<DropGuard>,
}

/// Wall clock derived from tokio's clock so paused-time tests move both.
#[derive(Debug, Clone, Copy)]
struct Clock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Clock {
    fn start() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.mono.elapsed()).unwrap_or(TimeDelta::zero());
        self.wall + elapsed
    }
}

pub struct GateBoard {
    api: Arc<dyn CatalogApi>,
    timeout: Duration,
    slots: HashMap<Subject, Slot>,
    next_epoch: u64,
    events_tx: mpsc::UnboundedSender<GateEvent>,
    events_rx: mpsc::UnboundedReceiver<GateEvent>,
    clock: Clock,
}

impl GateBoard {
    pub fn new(api: Arc<dyn CatalogApi>, timeout: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            timeout,
            slots: HashMap::new(),
            next_epoch: 0,
            events_tx,
            events_rx,
            clock: Clock::start(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn phase(&self, subject: Subject) -> GatePhase {
        self.slots
            .get(&subject)
            .map_or(GatePhase::Idle, |slot| slot.gate.phase())
    }

    pub fn status(&self, subject: Subject) -> GateStatus {
        self.slots
            .get(&subject)
            .map_or(GateStatus::Idle, |slot| slot.gate.status(self.now()))
    }

    /// Gates that are not idle, for a status listing.
    pub fn active(&self) -> Vec<(Subject, &Action, GateStatus)> {
        let now = self.now();
        let mut active: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.gate.phase() != GatePhase::Idle)
            .map(|(subject, slot)| (*subject, slot.gate.payload(), slot.gate.status(now)))
            .collect();
        active.sort_by_key(|(subject, ..)| subject.to_string());
        active
    }

    /// A user asks for `action`. If the gate for its subject is armed with a
    /// different payload, it disarms first and this request arms it again.
    pub fn request(&mut self, action: Action) -> BoardUpdate {
        let subject = action.subject();
        let now = self.now();
        let timeout = self.timeout;

        let next_epoch = &mut self.next_epoch;
        let slot = self.slots.entry(subject).or_insert_with(|| {
            *next_epoch += 1;
            Slot {
                epoch: *next_epoch,
                gate: ConfirmationGate::new(subject, action.clone(), timeout),
                countdown: None,
            }
        });
        let epoch = slot.epoch;
        if slot.gate.set_input(action) {
            slot.countdown = None;
            tracing::debug!(%subject, "input changed, gate disarmed");
        }

        match slot.gate.request(now) {
            RequestOutcome::Armed(token) => {
                slot.countdown = Some(spawn_countdown(
                    self.events_tx.clone(),
                    subject,
                    epoch,
                    token.generation,
                    timeout,
                ));
                tracing::debug!(%subject, deadline = %token.deadline, "gate armed");
                BoardUpdate::Armed {
                    subject,
                    deadline: token.deadline,
                }
            }
            RequestOutcome::Confirmed(auth) => {
                slot.countdown = None;
                tracing::info!(%subject, verb = auth.payload.verb(), "action confirmed");
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = invoker::invoke(api.as_ref(), &auth.payload).await;
                    // The view may be gone; then there is nobody to tell.
                    let _ = tx.send(GateEvent::Completed {
                        subject: auth.subject,
                        epoch,
                        ticket: auth.ticket,
                        result,
                    });
                });
                BoardUpdate::Confirmed { subject }
            }
            RequestOutcome::Ignored => {
                tracing::debug!(%subject, "request ignored, action in flight");
                BoardUpdate::Ignored { subject }
            }
        }
    }

    /// The input for `action`'s subject changed without a request (a form
    /// field was edited). An armed gate disarms.
    pub fn edit(&mut self, action: Action) -> BoardUpdate {
        let subject = action.subject();
        let Some(slot) = self.slots.get_mut(&subject) else {
            return BoardUpdate::Unchanged;
        };
        if slot.gate.set_input(action) {
            slot.countdown = None;
            return BoardUpdate::Disarmed {
                subject,
                reason: DisarmReason::InputChanged,
            };
        }
        BoardUpdate::Unchanged
    }

    /// Input for `subject` became unusable (the form no longer validates).
    /// An armed gate disarms; a pending one keeps its in-flight action.
    pub fn disarm(&mut self, subject: Subject) -> BoardUpdate {
        match self.phase(subject) {
            GatePhase::Armed => match self.cancel(subject) {
                BoardUpdate::Disarmed { subject, .. } => BoardUpdate::Disarmed {
                    subject,
                    reason: DisarmReason::InputChanged,
                },
                other => other,
            },
            GatePhase::Idle | GatePhase::Pending => BoardUpdate::Unchanged,
        }
    }

    pub fn cancel(&mut self, subject: Subject) -> BoardUpdate {
        let Some(slot) = self.slots.get_mut(&subject) else {
            return BoardUpdate::Unchanged;
        };
        slot.countdown = None;
        if slot.gate.cancel() {
            tracing::debug!(%subject, "gate cancelled");
            return BoardUpdate::Disarmed {
                subject,
                reason: DisarmReason::Cancelled,
            };
        }
        BoardUpdate::Unchanged
    }

    /// Cancel every gate that is not idle.
    pub fn cancel_all(&mut self) -> Vec<BoardUpdate> {
        let subjects: Vec<Subject> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.gate.phase() != GatePhase::Idle)
            .map(|(subject, _)| *subject)
            .collect();
        subjects.into_iter().map(|s| self.cancel(s)).collect()
    }

    /// Dispose gates whose rows are gone. Their timers stop; a pending
    /// completion for a disposed gate is dropped on arrival.
    pub fn retain(&mut self, mut keep: impl FnMut(Subject) -> bool) {
        self.slots.retain(|subject, _| keep(*subject));
    }

    /// Next timer or invoker event. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<GateEvent> {
        self.events_rx.recv().await
    }

    /// Non-blocking variant of [`Self::next_event`].
    pub fn try_next_event(&mut self) -> Option<GateEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn handle_event(&mut self, event: GateEvent) -> BoardUpdate {
        match event {
            GateEvent::Expired {
                subject,
                epoch,
                generation,
            } => {
                let Some(slot) = self.live_slot(subject, epoch) else {
                    return BoardUpdate::Unchanged;
                };
                if slot.gate.expire(generation) {
                    slot.countdown = None;
                    tracing::debug!(%subject, "confirmation window elapsed");
                    BoardUpdate::Disarmed {
                        subject,
                        reason: DisarmReason::Expired,
                    }
                } else {
                    BoardUpdate::Unchanged
                }
            }
            GateEvent::Completed {
                subject,
                epoch,
                ticket,
                result,
            } => {
                let Some(slot) = self.live_slot(subject, epoch) else {
                    tracing::debug!(%subject, "completion for disposed gate dropped");
                    return BoardUpdate::Unchanged;
                };
                if !slot.gate.complete(ticket) {
                    tracing::debug!(%subject, ok = result.is_ok(), "completion after cancel dropped");
                    return BoardUpdate::Unchanged;
                }
                match result {
                    Ok(success) => BoardUpdate::Succeeded(success),
                    Err(failure) => BoardUpdate::Failed(failure),
                }
            }
        }
    }

    /// The slot for `subject`, if it is still the one that scheduled `epoch`.
    fn live_slot(&mut self, subject: Subject, epoch: u64) -> Option<&mut Slot> {
        self.slots
            .get_mut(&subject)
            .filter(|slot| slot.epoch == epoch)
    }
}

fn spawn_countdown(
    tx: mpsc::UnboundedSender<GateEvent>,
    subject: Subject,
    epoch: u64,
    generation: u64,
    timeout: Duration,
) -> DropGuard {
    let token = CancellationToken::new();
    let cancelled = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = cancelled.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                let _ = tx.send(GateEvent::Expired {
                    subject,
                    epoch,
                    generation,
                });
            }
        }
    });
    token.drop_guard()
}
