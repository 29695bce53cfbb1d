//! Typed publish/subscribe event bus
//!
//! Subscribers are registered per `EventKind` and invoked synchronously in
//! subscription order. Each invocation is isolated: an error or a panic in one
//! handler is logged and dispatch continues with the next one.
//!
//! Handlers never get the bus itself. They receive the shared context and
//! queue follow-up events through its `Outbox`; those are dispatched after the
//! current event's handlers return, before `publish` itself returns.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use glam::Vec3;

use super::powerup::PowerUpKind;
use super::registry::Handle;
use super::state::GameState;

/// Upper bound on follow-up events dispatched by one `publish` call
const MAX_CASCADE: usize = 1024;

/// Everything that travels over the bus
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// UI: start a new run from the title screen
    StartGame,
    /// UI: pause the running game
    PauseGame,
    /// UI: resume a paused game
    ResumeGame,
    /// UI: close the application
    QuitGame,
    /// UI: leave the game over screen for the title screen
    ExitGameOver,
    /// UI: abandon the current run and start over
    RespawnGame,
    /// A brick ran out of hits. Carries the last known position.
    BrickDestroyed { brick: Handle, position: Vec3, points: u32 },
    /// A ball left the play area
    BallDestroyed { ball: Handle },
    /// The paddle caught a power-up
    PowerUpCollected { kind: PowerUpKind },
    /// Bricks stop blocking for the bulldozer duration
    BulldozerActivated,
    /// Re-broadcast of every phase change for presentation layers
    GameStateChanged { current: GameState, previous: GameState },
}

/// Discriminant used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartGame,
    PauseGame,
    ResumeGame,
    QuitGame,
    ExitGameOver,
    RespawnGame,
    BrickDestroyed,
    BallDestroyed,
    PowerUpCollected,
    BulldozerActivated,
    GameStateChanged,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::StartGame => EventKind::StartGame,
            GameEvent::PauseGame => EventKind::PauseGame,
            GameEvent::ResumeGame => EventKind::ResumeGame,
            GameEvent::QuitGame => EventKind::QuitGame,
            GameEvent::ExitGameOver => EventKind::ExitGameOver,
            GameEvent::RespawnGame => EventKind::RespawnGame,
            GameEvent::BrickDestroyed { .. } => EventKind::BrickDestroyed,
            GameEvent::BallDestroyed { .. } => EventKind::BallDestroyed,
            GameEvent::PowerUpCollected { .. } => EventKind::PowerUpCollected,
            GameEvent::BulldozerActivated => EventKind::BulldozerActivated,
            GameEvent::GameStateChanged { .. } => EventKind::GameStateChanged,
        }
    }
}

/// Context side of the bus: where handlers leave follow-up events
pub trait Outbox {
    /// Queue an event for dispatch after the current one
    fn emit(&mut self, event: GameEvent);
    /// Hand every queued event to the bus, oldest first
    fn take_emitted(&mut self) -> Vec<GameEvent>;
}

/// Handler signature. `Err` is logged and counted, never propagated.
pub type Handler<C> = Box<dyn FnMut(&mut C, &GameEvent) -> anyhow::Result<()>>;

/// Identifies a subscription for explicit removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<C> {
    id: SubscriptionId,
    name: &'static str,
    handler: Handler<C>,
}

/// Outcome counters of one `publish` call, follow-up events included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events dispatched (the published one plus follow-ups)
    pub events: usize,
    /// Handler invocations that returned `Ok`
    pub delivered: usize,
    /// Handler invocations that returned `Err` or panicked
    pub failed: usize,
}

/// Publish/subscribe registry keyed by event kind
pub struct EventBus<C> {
    subscribers: HashMap<EventKind, Vec<Subscriber<C>>>,
    next_id: u64,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<C: Outbox> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event of `kind`
    pub fn subscribe<F>(&mut self, kind: EventKind, name: &'static str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut C, &GameEvent) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.entry(kind).or_default().push(Subscriber {
            id,
            name,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subs in self.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of handlers registered for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Dispatch `event` and every follow-up event it causes
    pub fn publish(&mut self, ctx: &mut C, event: GameEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            if report.events == MAX_CASCADE {
                log::error!(
                    "Event cascade exceeded {} events, dropping {:?} and {} more",
                    MAX_CASCADE,
                    event.kind(),
                    queue.len()
                );
                break;
            }
            report.events += 1;
            self.dispatch(ctx, &event, &mut report);
            queue.extend(ctx.take_emitted());
        }

        report
    }

    fn dispatch(&mut self, ctx: &mut C, event: &GameEvent, report: &mut DispatchReport) {
        let kind = event.kind();
        let Some(subs) = self.subscribers.get_mut(&kind) else {
            log::debug!("No subscribers for {:?}", kind);
            return;
        };

        for sub in subs.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (sub.handler)(ctx, event)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    log::warn!("Handler '{}' failed on {:?}: {:#}", sub.name, kind, err);
                }
                Err(payload) => {
                    report.failed += 1;
                    log::error!(
                        "Handler '{}' panicked on {:?}: {}",
                        sub.name,
                        kind,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
