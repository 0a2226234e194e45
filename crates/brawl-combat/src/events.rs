//! Battle event bus.
//!
//! The battle publishes what happened during a tick; front ends (renderers,
//! audio, loggers) drain the bus afterwards.

use brawl_common::PlayerSlot;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::combat::{HitEvent, SoundCue};
use crate::state::FighterState;

/// Something that happened during a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// An attack connected
    Hit(HitEvent),
    /// A fighter wants a sound played
    Sound {
        /// Fighter
        slot: PlayerSlot,
        /// Sound
        cue: SoundCue,
    },
    /// A fighter's state changed
    StateChanged {
        /// Fighter
        slot: PlayerSlot,
        /// New state
        state: FighterState,
    },
    /// A fighter's health reached zero
    KnockOut {
        /// Fighter that went down
        loser: PlayerSlot,
    },
    /// The round clock ran out
    TimeOver,
    /// A fighter was declared the winner
    Victory {
        /// Winner
        winner: PlayerSlot,
    },
    /// The round finished
    RoundOver {
        /// Winner, or `None` for a draw
        winner: Option<PlayerSlot>,
    },
    /// The round clock counted down
    ClockTick {
        /// Counts remaining
        remaining: u32,
    },
}

impl BattleEvent {
    /// Round milestones take precedence over routine events on a full bus.
    #[must_use]
    pub const fn is_milestone(&self) -> bool {
        matches!(
            self,
            Self::KnockOut { .. } | Self::TimeOver | Self::Victory { .. } | Self::RoundOver { .. }
        )
    }
}

/// Event bus for broadcasting battle events.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<BattleEvent>,
    /// Receiver for collecting events
    receiver: Receiver<BattleEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event and reports whether it was queued.
    ///
    /// When the bus is full a milestone evicts the oldest routine event
    /// (or the oldest milestone if nothing else is pending); routine events
    /// are dropped.
    pub fn publish(&self, event: BattleEvent) -> bool {
        let event = match self.sender.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Full(event)) => event,
            Err(TrySendError::Disconnected(_)) => return false,
        };

        if !event.is_milestone() {
            warn!(event = ?event, capacity = self.capacity, "Event bus full, dropping event");
            return false;
        }
        let mut pending = self.drain();
        let oldest = pending.iter().position(|e| !e.is_milestone()).unwrap_or(0);
        if oldest < pending.len() {
            let evicted = pending.remove(oldest);
            warn!(event = ?evicted, "Event bus full, evicting oldest event");
        }
        pending.push(event);
        pending.into_iter().all(|e| self.sender.try_send(e).is_ok())
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<BattleEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(BattleEvent::TimeOver);
        bus.publish(BattleEvent::ClockTick { remaining: 42 });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(
            events,
            vec![
                BattleEvent::TimeOver,
                BattleEvent::ClockTick { remaining: 42 }
            ]
        );
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_routine_events() {
        let bus = EventBus::new(1);
        assert!(bus.publish(BattleEvent::ClockTick { remaining: 3 }));
        assert!(!bus.publish(BattleEvent::ClockTick { remaining: 2 }));
        assert_eq!(bus.drain(), vec![BattleEvent::ClockTick { remaining: 3 }]);
        assert_eq!(bus.capacity(), 1);
    }

    #[test]
    fn test_full_bus_keeps_milestones() {
        let bus = EventBus::new(2);
        bus.publish(BattleEvent::ClockTick { remaining: 1 });
        bus.publish(BattleEvent::KnockOut {
            loser: PlayerSlot::One,
        });
        assert!(bus.publish(BattleEvent::RoundOver {
            winner: Some(PlayerSlot::Two),
        }));
        assert_eq!(
            bus.drain(),
            vec![
                BattleEvent::KnockOut {
                    loser: PlayerSlot::One
                },
                BattleEvent::RoundOver {
                    winner: Some(PlayerSlot::Two)
                },
            ]
        );
    }
}
