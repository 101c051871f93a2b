//! An in-process simulated CAN bus and clock.
//!
//! Real CAN delivers a transmitted frame to every other node at
//! (approximately) the same instant, propagation delay aside. This
//! simulation models that as "broadcast at the next clock tick", skipping
//! arbitration and signal propagation entirely — the core under test
//! never knows the difference, since it only ever sees `on_receive`/
//! `on_timer_fire` calls carrying NUT values.

use std::collections::BinaryHeap;
use std::cmp::Reverse;

use gttcan_hal::Nut;

/// One pending occurrence: either a node's armed timer firing, or a frame
/// landing on the bus for every node but its sender to receive.
enum Event {
    Timer { node: usize },
    Frame { from: usize, id_field: u32, data: u64 },
}

struct Scheduled {
    at: u64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// A min-heap of pending events, driven one tick at a time by [`Bus::step`].
pub struct Bus {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Nut {
        Nut::new(self.now as u32)
    }

    pub fn arm_timer(&mut self, node: usize, delay: Nut) {
        self.push(self.now + delay.ticks() as u64, Event::Timer { node });
    }

    pub fn broadcast(&mut self, from: usize, id_field: u32, data: u64, propagation_delay: u64) {
        self.push(
            self.now + propagation_delay,
            Event::Frame { from, id_field, data },
        );
    }

    fn push(&mut self, at: u64, event: Event) {
        self.seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq: self.seq, event }));
    }

    /// Pops and returns the next event, advancing `now` to its timestamp.
    /// `None` once the queue is drained (the simulation has nothing left
    /// to do).
    pub fn step(&mut self) -> Option<(u64, PendingEvent)> {
        let Reverse(scheduled) = self.queue.pop()?;
        self.now = scheduled.at;
        let event = match scheduled.event {
            Event::Timer { node } => PendingEvent::Timer { node },
            Event::Frame { from, id_field, data } => PendingEvent::Frame { from, id_field, data },
        };
        Some((self.now, event))
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

pub enum PendingEvent {
    Timer { node: usize },
    Frame { from: usize, id_field: u32, data: u64 },
}
