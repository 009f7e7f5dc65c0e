//! Blocking FIFO of combat tasks between the detector and the combat role.
//!
//! The queue has two states, open and closed. Closing drops the only sender of
//! an unbounded crossbeam channel; every receiver blocked in [`TaskQueue::pop`]
//! wakes once the remaining tasks are drained and observes closure. Nothing is
//! lost on close: tasks pushed before [`TaskQueue::stop`] are still delivered,
//! in push order.

use std::fmt;
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::entity::Entity;

/// A request to resolve combat between two entities.
///
/// Holds non-owning references: the registry alone decides entity lifetime.
/// A task may go stale between enqueue and processing; see
/// [`live_participants`](Self::live_participants).
#[derive(Clone)]
pub struct CombatTask {
    attacker: Weak<Entity>,
    defender: Weak<Entity>,
}

impl CombatTask {
    /// Creates a task for `attacker` engaging `defender`.
    #[must_use]
    pub fn new(attacker: &Arc<Entity>, defender: &Arc<Entity>) -> Self {
        Self {
            attacker: Arc::downgrade(attacker),
            defender: Arc::downgrade(defender),
        }
    }

    /// The attacking entity, if it is still registered.
    #[must_use]
    pub fn attacker(&self) -> Option<Arc<Entity>> {
        self.attacker.upgrade()
    }

    /// The defending entity, if it is still registered.
    #[must_use]
    pub fn defender(&self) -> Option<Arc<Entity>> {
        self.defender.upgrade()
    }

    /// Both participants, provided both still exist and are alive right now.
    ///
    /// `None` means the task is stale and must be discarded without effect.
    #[must_use]
    pub fn live_participants(&self) -> Option<(Arc<Entity>, Arc<Entity>)> {
        let attacker = self.attacker()?;
        let defender = self.defender()?;
        (attacker.is_alive() && defender.is_alive()).then_some((attacker, defender))
    }
}

impl fmt::Debug for CombatTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |side: Option<Arc<Entity>>| {
            side.map_or_else(|| "<gone>".to_string(), |e| e.name().to_string())
        };
        f.debug_struct("CombatTask")
            .field("attacker", &name(self.attacker()))
            .field("defender", &name(self.defender()))
            .finish()
    }
}

/// Unbounded multi-producer, multi-consumer task queue with cooperative close.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::queue::{CombatTask, TaskQueue};
/// use glam::DVec2;
///
/// let a = Arc::new(Entity::new("A", EntityKind::Knight, DVec2::ZERO));
/// let b = Arc::new(Entity::new("B", EntityKind::Elf, DVec2::ZERO));
///
/// let queue = TaskQueue::new();
/// assert!(queue.push(CombatTask::new(&a, &b)));
/// queue.stop();
///
/// assert!(queue.pop().is_some()); // queued before stop: still delivered
/// assert!(queue.pop().is_none()); // closed and drained
/// ```
pub struct TaskQueue {
    sender: Mutex<Option<Sender<CombatTask>>>,
    receiver: Receiver<CombatTask>,
}

impl TaskQueue {
    /// Creates an open, empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Appends a task and wakes one waiting consumer. Never blocks on capacity.
    ///
    /// Returns `false` if the queue is already closed; the task is dropped.
    pub fn push(&self, task: CombatTask) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).is_ok(),
            None => false,
        }
    }

    /// Blocks until a task is available or the queue is closed and empty.
    ///
    /// Returns `None` exactly when no task will ever arrive again.
    #[must_use]
    pub fn pop(&self) -> Option<CombatTask> {
        self.receiver.recv().ok()
    }

    /// Takes a task if one is ready, without blocking.
    #[must_use]
    pub fn try_pop(&self) -> Option<CombatTask> {
        self.receiver.try_recv().ok()
    }

    /// Closes the queue and wakes every blocked consumer. Idempotent.
    pub fn stop(&self) {
        self.sender.lock().take();
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Best-effort emptiness check; may be stale as soon as it returns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Best-effort count of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
