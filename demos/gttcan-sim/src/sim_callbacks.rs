//! [`gttcan_hal::Callbacks`] implementation wiring a [`Gttcan`](gttcan::Gttcan)
//! node to the in-process simulated bus: transmits and timer arms become
//! bus events, the whiteboard is a plain fixed-size array private to each
//! node (exactly as real firmware would keep a node-local whiteboard, with
//! no cross-node sharing except through frames on the bus).

use std::cell::RefCell;
use std::rc::Rc;

use gttcan::consts::NETWORK_TIME_SLOT;
use gttcan_hal::{Callbacks, DiagnosticEvent, Nut};
use log::warn;

use crate::bus::Bus;

/// Number of whiteboard cells this demo's toy schedule needs: one
/// reference slot plus one datum per follower.
const WHITEBOARD_SIZE: usize = 4;

pub struct SimCallbacks {
    index: usize,
    bus: Rc<RefCell<Bus>>,
    propagation_delay: u64,
    whiteboard: [u64; WHITEBOARD_SIZE],
}

impl SimCallbacks {
    pub fn new(index: usize, bus: Rc<RefCell<Bus>>, propagation_delay: u64) -> Self {
        Self {
            index,
            bus,
            propagation_delay,
            whiteboard: [0; WHITEBOARD_SIZE],
        }
    }
}

impl Callbacks for SimCallbacks {
    fn transmit(&mut self, id_field: u32, data: u64) {
        self.bus
            .borrow_mut()
            .broadcast(self.index, id_field, data, self.propagation_delay);
    }

    fn set_timer(&mut self, delay: Nut) {
        self.bus.borrow_mut().arm_timer(self.index, delay);
    }

    fn read_value(&self, data_id: u16) -> u64 {
        // Only the time master ever reads the reference slot, and only to
        // transmit it: stand in for the host's own free-running clock
        // rather than whatever was last written, so the demo has a real
        // network time to discipline against.
        if data_id == NETWORK_TIME_SLOT {
            return self.bus.borrow().now().ticks() as u64;
        }
        self.whiteboard.get(data_id as usize).copied().unwrap_or(0)
    }

    fn write_value(&mut self, data_id: u16, value: u64) {
        if let Some(slot) = self.whiteboard.get_mut(data_id as usize) {
            *slot = value;
        }
    }

    fn on_diagnostic(&mut self, event: DiagnosticEvent) {
        warn!("node {}: {:?}", self.index, event);
    }
}
