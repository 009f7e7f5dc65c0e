//! Kill notification fan-out.
//!
//! The [`KillFeed`] multicasts each [`KillEvent`] to the attached
//! [`KillSink`]s, synchronously and in attachment order. The sink list has its
//! own lock; a notify call holds it for the duration of the delivery, which
//! serializes concurrent notifiers without touching any other component.
//!
//! Sink failures are isolated: a failing sink is logged with `tracing::warn!`
//! and delivery continues with the next sink. Nothing is propagated to the
//! role that produced the kill.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skirmish_core::entity::{Descriptor, EntityKind};
//! use skirmish_core::feed::{KillEvent, KillFeed, RecordingSink, Side};
//!
//! let feed = KillFeed::new();
//! let log = Arc::new(RecordingSink::new());
//! feed.attach(log.clone());
//!
//! feed.notify(&KillEvent {
//!     killer: Descriptor { name: "Arthur".into(), kind: EntityKind::Knight },
//!     victim: Descriptor { name: "Legolas".into(), kind: EntityKind::Elf },
//!     winner: Side::Attacker,
//!     attack_roll: 6,
//!     defense_roll: 1,
//! });
//!
//! assert_eq!(log.event_count(), 1);
//! ```

mod sinks;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entity::Descriptor;
use crate::error::SinkError;

pub use sinks::{ConsoleSink, FileSink, RecordingSink, TracingSink};

/// Which side of a combat task won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The entity that initiated the task.
    Attacker,
    /// The entity that was engaged.
    Defender,
}

/// A single kill, created by the combat resolver and discarded after delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    /// The surviving entity.
    pub killer: Descriptor,
    /// The entity that died.
    pub victim: Descriptor,
    /// Which side of the task the killer was on.
    pub winner: Side,
    /// The attacker's die.
    pub attack_roll: u8,
    /// The defender's die.
    pub defense_roll: u8,
}

impl KillEvent {
    /// Human-readable account of the deciding rolls, winner first.
    ///
    /// ```
    /// # use skirmish_core::entity::{Descriptor, EntityKind};
    /// # use skirmish_core::feed::{KillEvent, Side};
    /// # let d = |n: &str| Descriptor { name: n.into(), kind: EntityKind::Druid };
    /// let event = KillEvent {
    ///     killer: d("B"), victim: d("A"),
    ///     winner: Side::Defender, attack_roll: 2, defense_roll: 5,
    /// };
    /// assert_eq!(event.justification(), "[defense:5 > attack:2]");
    /// ```
    #[must_use]
    pub fn justification(&self) -> String {
        match self.winner {
            Side::Attacker => format!(
                "[attack:{} > defense:{}]",
                self.attack_roll, self.defense_roll
            ),
            Side::Defender => format!(
                "[defense:{} > attack:{}]",
                self.defense_roll, self.attack_roll
            ),
        }
    }
}

impl fmt::Display for KillEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} killed {} {}",
            self.killer,
            self.victim,
            self.justification()
        )
    }
}

/// A destination for kill events.
///
/// Sinks perform their own I/O and are treated as opaque by the feed.
/// Implementations must be thread-safe because combat roles notify from
/// their own threads.
pub trait KillSink: Send + Sync {
    /// Short label used in diagnostics.
    fn name(&self) -> &str;

    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the event could not be written. The feed logs
    /// the failure and moves on.
    fn on_kill(&self, event: &KillEvent) -> Result<(), SinkError>;
}

/// Thread-safe multicast of kill events.
#[derive(Default)]
pub struct KillFeed {
    sinks: Mutex<Vec<Arc<dyn KillSink>>>,
}

impl KillFeed {
    /// Creates a feed with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink. Attaching the same sink twice delivers twice.
    pub fn attach(&self, sink: Arc<dyn KillSink>) {
        self.sinks.lock().push(sink);
    }

    /// Delivers `event` to every sink in attachment order.
    ///
    /// Returns the number of sinks that accepted the event.
    pub fn notify(&self, event: &KillEvent) -> usize {
        let sinks = self.sinks.lock();
        let mut delivered = 0;
        for sink in sinks.iter() {
            match sink.on_kill(event) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::warn!(sink = sink.name(), %error, "kill sink failed; continuing");
                }
            }
        }
        delivered
    }

    /// Number of attached sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Returns `true` if no sink is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }
}

impl fmt::Debug for KillFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .sinks
            .lock()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        f.debug_struct("KillFeed").field("sinks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use std::io;
    use std::thread;

    pub(crate) fn sample_event() -> KillEvent {
        KillEvent {
            killer: Descriptor {
                name: "Knight1".into(),
                kind: EntityKind::Knight,
            },
            victim: Descriptor {
                name: "Elf1".into(),
                kind: EntityKind::Elf,
            },
            winner: Side::Attacker,
            attack_roll: 6,
            defense_roll: 1,
        }
    }

    struct FailingSink;

    impl KillSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_kill(&self, _event: &KillEvent) -> Result<(), SinkError> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into())
        }
    }

    mod event_tests {
        use super::*;

        #[test]
        fn display_includes_rolls() {
            let event = sample_event();
            assert_eq!(
                event.to_string(),
                "Knight1 (Knight) killed Elf1 (Elf) [attack:6 > defense:1]"
            );
        }

        #[test]
        fn serialization_roundtrip() {
            let event = sample_event();
            let json = serde_json::to_string(&event).unwrap();
            let back: KillEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }

    mod feed_tests {
        use super::*;

        #[test]
        fn empty_feed_delivers_nowhere() {
            let feed = KillFeed::new();
            assert!(feed.is_empty());
            assert_eq!(feed.notify(&sample_event()), 0);
        }

        #[test]
        fn delivers_to_every_sink_in_order() {
            let feed = KillFeed::new();
            let first = Arc::new(RecordingSink::new());
            let second = Arc::new(RecordingSink::new());
            feed.attach(first.clone());
            feed.attach(second.clone());

            assert_eq!(feed.notify(&sample_event()), 2);
            assert_eq!(first.take_events(), vec![sample_event()]);
            assert_eq!(second.take_events(), vec![sample_event()]);
        }

        #[test]
        fn duplicate_attach_delivers_twice() {
            let feed = KillFeed::new();
            let sink = Arc::new(RecordingSink::new());
            feed.attach(sink.clone());
            feed.attach(sink.clone());
            feed.notify(&sample_event());
            assert_eq!(sink.event_count(), 2);
        }

        #[test]
        fn failing_sink_does_not_block_others() {
            let feed = KillFeed::new();
            let after = Arc::new(RecordingSink::new());
            feed.attach(Arc::new(FailingSink));
            feed.attach(after.clone());

            assert_eq!(feed.notify(&sample_event()), 1);
            assert_eq!(after.event_count(), 1);
        }

        #[test]
        fn concurrent_notifiers_lose_nothing() {
            let feed = KillFeed::new();
            let sink = Arc::new(RecordingSink::new());
            feed.attach(sink.clone());

            thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..100 {
                            feed.notify(&sample_event());
                        }
                    });
                }
            });
            assert_eq!(sink.event_count(), 400);
        }
    }
}
