//! Transmission handler: the timer-interrupt entry point. Fires when this
//! node's own schedule position comes up, transmits either a reference
//! frame (time master) or a whiteboard value, advances the local schedule
//! position, and re-arms the timer for whichever owned slot comes next.

use gttcan_hal::{Callbacks, FrameId};

use crate::consts::NETWORK_TIME_SLOT;
use crate::node::Gttcan;

const START_OF_SCHEDULE_BIT: u64 = 1 << 63;

impl<H: Callbacks> Gttcan<H> {
    /// Handles a timer interrupt that fires at this node's own transmit
    /// instant. Must be called with reception interrupts excluded, same as
    /// [`Gttcan::on_receive`].
    ///
    /// No-op if the node has never observed a start-of-schedule frame and
    /// isn't the master (`!is_active()`).
    pub fn on_timer_fire(&mut self) {
        if !self.is_active() {
            return;
        }

        let entry = match self.local().get(self.local_schedule_index()) {
            Some(entry) => entry,
            None => return,
        };

        self.mark_transmitted();

        let mut data = self.callbacks_mut().read_value(entry.data_id);

        if entry.data_id == NETWORK_TIME_SLOT {
            let (mean, state_correction, clamp_event) = self.accumulator_mut().fta();
            if let Some(event) = clamp_event {
                self.callbacks_mut().on_diagnostic(event);
            }
            self.set_error_offset(mean);
            self.set_state_correction(state_correction);
        }

        if entry.slot_index == 0 {
            data |= START_OF_SCHEDULE_BIT;
        }

        let id_field = FrameId {
            global_schedule_index: entry.slot_index,
            data_id: entry.data_id,
        }
        .to_bits();

        self.advance_local_schedule_index();

        // Timer armed before the transmit callback runs: the host is
        // scheduled for its next slot even if transmission itself takes
        // variable time.
        match self.slots_to_next_transmit(entry.slot_index) {
            Some(distance) => self.arm_timer_for(distance),
            None => self.clear_state_correction(),
        }

        self.callbacks_mut().transmit(id_field, data);
    }
}

#[cfg(test)]
mod tests {
    use gttcan_hal::{Callbacks, DiagnosticEvent, FrameId, Nut};

    use crate::consts::NETWORK_TIME_SLOT;
    use crate::node::Gttcan;
    use crate::schedule::SlotEntry;

    #[derive(Default)]
    struct Harness {
        transmitted: Vec<(u32, u64)>,
        timer_delay: Option<Nut>,
        whiteboard: [u64; 4],
    }

    impl Callbacks for Harness {
        fn transmit(&mut self, id_field: u32, data: u64) {
            self.transmitted.push((id_field, data));
        }
        fn set_timer(&mut self, delay: Nut) {
            self.timer_delay = Some(delay);
        }
        fn read_value(&self, data_id: u16) -> u64 {
            self.whiteboard[data_id as usize]
        }
        fn write_value(&mut self, data_id: u16, value: u64) {
            self.whiteboard[data_id as usize] = value;
        }
        fn on_diagnostic(&mut self, _event: DiagnosticEvent) {}
    }

    fn schedule() -> Vec<SlotEntry> {
        vec![
            SlotEntry::new(1, NETWORK_TIME_SLOT),
            SlotEntry::new(10, 1),
            SlotEntry::new(8, 2),
            SlotEntry::new(9, 3),
        ]
    }

    #[test]
    fn master_transmits_reference_frame_with_start_flag() {
        let mut node = Gttcan::init(&schedule(), 1, Nut::new(1000), Harness::default()).unwrap();
        node.on_timer_fire();
        let (id_field, data) = node.callbacks_mut().transmitted[0];
        let frame = FrameId::from_bits(id_field);
        assert_eq!(frame.global_schedule_index, 0);
        assert_eq!(frame.data_id, NETWORK_TIME_SLOT);
        assert_eq!(data & (1 << 63), 1 << 63);
    }

    #[test]
    fn follower_transmits_its_own_data_slot_and_advances() {
        let mut harness = Harness::default();
        harness.whiteboard[1] = 0xCAFE;
        let mut node = Gttcan::init(&schedule(), 10, Nut::new(1000), harness).unwrap();
        node.set_active(true);
        node.on_timer_fire();
        assert_eq!(node.callbacks_mut().transmitted[0].1, 0xCAFE);
        // Only one owned slot: local_schedule_index wraps back to 0.
        assert_eq!(node.local_schedule_index(), 0);
    }

    #[test]
    fn node_with_no_owned_slot_does_nothing() {
        let mut node = Gttcan::init(&schedule(), 99, Nut::new(1000), Harness::default()).unwrap();
        node.set_active(true);
        node.on_timer_fire();
        assert!(node.callbacks_mut().transmitted.is_empty());
    }

    #[test]
    fn inactive_node_does_not_transmit() {
        let mut node = Gttcan::init(&schedule(), 10, Nut::new(1000), Harness::default()).unwrap();
        node.on_timer_fire();
        assert!(node.callbacks_mut().transmitted.is_empty());
    }

    /// Two owned slots at global indices `[3,7]` in a ten-slot schedule,
    /// `slot_duration = 100`, `local_schedule_index = 1` on entry. After:
    /// transmit for `gsi=7`, advance to entry 0, timer armed to
    /// `slots_to_next_transmit(7) = 6`, i.e. 600 NUT.
    #[test]
    fn transmit_wraps_local_schedule_and_rearms_timer() {
        let slots: Vec<SlotEntry> = (0..10)
            .map(|i| match i {
                3 => SlotEntry::new(5, 10),
                7 => SlotEntry::new(5, 11),
                _ => SlotEntry::new(1, i as u16),
            })
            .collect();
        let mut node = Gttcan::init(&slots, 5, Nut::new(100), Harness::default()).unwrap();
        node.set_active(true);
        // Force local_schedule_index to 1 (entry at global index 7) by
        // consuming entry 0 first.
        node.on_timer_fire(); // consumes entry 0 (global index 3), advances to 1
        node.on_timer_fire(); // consumes entry 1 (global index 7), advances to 0
        let (id_field, _) = node.callbacks_mut().transmitted[1];
        assert_eq!(FrameId::from_bits(id_field).global_schedule_index, 7);
        assert_eq!(node.local_schedule_index(), 0);
        assert_eq!(node.callbacks_mut().timer_delay, Some(Nut::new(600)));
    }
}
