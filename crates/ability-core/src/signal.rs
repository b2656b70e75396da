//! Single-threaded publish/subscribe used to feed coarse game-state changes and quit requests
//! into ability systems.
//!
//! A [`Subscription`] is a queue owned by the subscriber. The publisher keeps only a weak link,
//! and dropping the subscription unregisters it, so a rebuilt subscriber never receives stale
//! deliveries meant for its predecessor.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameState {
    #[default]
    Running,
    Paused,
}

/// Payload of the quit/teardown signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuitRequested;

struct SignalInner<T> {
    next_id: u64,
    queues: BTreeMap<u64, VecDeque<T>>,
}

pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: Clone> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                queues: BTreeMap::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.queues.insert(id, VecDeque::new());
        Subscription {
            id,
            signal: Rc::downgrade(&self.inner),
        }
    }

    /// Queues `value` for every live subscription.
    pub fn emit(&self, value: T) {
        let mut inner = self.inner.borrow_mut();
        for queue in inner.queues.values_mut() {
            queue.push_back(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().queues.len()
    }
}

impl<T: Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Subscription<T> {
    id: u64,
    signal: Weak<RefCell<SignalInner<T>>>,
}

impl<T> Subscription<T> {
    /// Takes every value delivered since the last call, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let Some(inner) = self.signal.upgrade() else {
            return Vec::new();
        };
        let mut inner = inner.borrow_mut();
        let drained = inner
            .queues
            .get_mut(&self.id)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default();
        drained
    }

    pub fn is_connected(&self) -> bool {
        let Some(inner) = self.signal.upgrade() else {
            return false;
        };
        let connected = inner.borrow().queues.contains_key(&self.id);
        connected
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.borrow_mut().queues.remove(&self.id);
        }
    }
}

/// Owner of the current [`GameState`]; publishes transitions to subscribers.
pub struct GameStateManager {
    current: Cell<GameState>,
    changes: Signal<GameState>,
}

impl GameStateManager {
    pub fn new(initial: GameState) -> Self {
        Self {
            current: Cell::new(initial),
            changes: Signal::new(),
        }
    }

    pub fn current(&self) -> GameState {
        self.current.get()
    }

    /// Publishes `state` if it differs from the current one.
    pub fn set_state(&self, state: GameState) {
        if self.current.replace(state) != state {
            self.changes.emit(state);
        }
    }

    pub fn subscribe(&self) -> Subscription<GameState> {
        self.changes.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.subscriber_count()
    }
}

impl Default for GameStateManager {
    fn default() -> Self {
        Self::new(GameState::Running)
    }
}
