//! Reception handler: the RX-interrupt entry point. Decodes an arrived
//! CAN frame, classifies it as reference or data, updates the whiteboard
//! and the fault-tolerant averager, and — for reference frames — re-arms
//! the timer for this node's next owned slot.

use gttcan_hal::{Callbacks, FrameId, Nut, ReferencePayload};

use crate::consts::NETWORK_TIME_SLOT;
use crate::node::Gttcan;

impl<H: Callbacks> Gttcan<H> {
    /// Handles one received CAN frame.
    ///
    /// `id_field` is the 28-bit extended identifier as it arrived; `data`
    /// is the 64-bit payload; `action_time` is this node's own clock
    /// reading at the moment the frame was accepted — "time since the
    /// interrupt was scheduled to fire" — supplied by the host's RX path,
    /// not read by this function itself.
    ///
    /// Must be called with reception and timer interrupts mutually
    /// excluded by the host; the `&mut self` receiver only prevents two
    /// *safe* callers from overlapping, not a raw ISR re-entering itself.
    pub fn on_receive(&mut self, id_field: u32, data: u64, action_time: Nut) {
        let frame_id = FrameId::from_bits(id_field);
        let slot_id = frame_id.data_id;
        let global_schedule_index = frame_id.global_schedule_index;

        let slots_since = self.slots_since_last_transmit(global_schedule_index);
        let expected = slots_since as i64 * self.slot_duration().ticks() as i64;
        let error = (expected - action_time.ticks() as i64) as i32;
        if self.transmitted() {
            self.accumulator_mut().accumulate(error);
        }

        if slot_id == NETWORK_TIME_SLOT {
            self.on_reference_frame(global_schedule_index, data);
        } else if slot_id >= 1 {
            self.callbacks_mut().write_value(slot_id, data);
        }
        // slot_id == 0 on a non-reference layout is unreachable (0 *is*
        // NETWORK_TIME_SLOT); an undecodable frame still gets no
        // whiteboard write and no timer rearm, beyond the accumulate
        // already performed above.

        // Periodic resync: a full schedule revolution passed with no
        // reference frame observed. Fold another fta() pass into a fresh
        // timer arm so clock discipline doesn't stall indefinitely on a
        // missed reference frame.
        if self.accumulator_mut().sample_count() as u16 >= self.global().len() {
            self.resync(global_schedule_index);
        }
    }

    fn on_reference_frame(&mut self, global_schedule_index: u16, data: u64) {
        let payload = ReferencePayload::from_bits(data);

        if payload.start_of_schedule {
            self.set_active(true);
            self.reset_local_schedule_index();
        }

        // Additive transmission-latency compensation; a bitwise `|=` here
        // would corrupt the time value instead of offsetting it.
        let adjusted = data.wrapping_add(self.slot_offset().ticks() as u64);
        let masked = adjusted & 0x3FFF_FFFF_FFFF_FFFF;
        self.callbacks_mut().write_value(NETWORK_TIME_SLOT, masked);

        let (mean, state_correction, clamp_event) = self.accumulator_mut().fta();
        if let Some(event) = clamp_event {
            self.callbacks_mut().on_diagnostic(event);
        }
        self.set_error_offset(mean);
        self.set_state_correction(state_correction);

        match self.slots_to_next_transmit(global_schedule_index) {
            Some(distance) => self.arm_timer_for(distance),
            None => self.clear_state_correction(),
        }
    }

    fn resync(&mut self, current_index: u16) {
        let (mean, state_correction, clamp_event) = self.accumulator_mut().fta();
        if let Some(event) = clamp_event {
            self.callbacks_mut().on_diagnostic(event);
        }
        self.set_error_offset(mean);
        self.set_state_correction(state_correction);
        if let Some(distance) = self.slots_to_next_transmit(current_index) {
            self.arm_timer_for(distance);
        }
    }
}

#[cfg(test)]
mod tests {
    use gttcan_hal::{Callbacks, DiagnosticEvent, FrameId, Nut, ReferencePayload};

    use crate::consts::NETWORK_TIME_SLOT;
    use crate::node::Gttcan;
    use crate::schedule::SlotEntry;

    #[derive(Default)]
    struct Harness {
        transmitted: Vec<(u32, u64)>,
        timer_delay: Option<Nut>,
        whiteboard: [u64; 4],
        diagnostics: Vec<DiagnosticEvent>,
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
        fn on_diagnostic(&mut self, event: DiagnosticEvent) {
            self.diagnostics.push(event);
        }
    }

    fn schedule() -> Vec<SlotEntry> {
        vec![
            SlotEntry::new(1, NETWORK_TIME_SLOT),
            SlotEntry::new(10, 1),
            SlotEntry::new(8, 2),
            SlotEntry::new(9, 3),
        ]
    }

    /// Start-of-schedule reception. `id_field = 0`, `data =
    /// 0x8000_0000_0000_00C8` (bit 63 set, time = 200 NUT). After: node
    /// active, `local_schedule_index = 0`, whiteboard[0] = 200 + 1480 =
    /// 1680.
    #[test]
    fn start_of_schedule_frame_activates_node_and_offsets_whiteboard() {
        let mut node = Gttcan::init(&schedule(), 10, Nut::new(1000), Harness::default()).unwrap();
        let id = FrameId {
            global_schedule_index: 0,
            data_id: NETWORK_TIME_SLOT,
        }
        .to_bits();
        let payload = ReferencePayload {
            start_of_schedule: true,
            network_time: 200,
        }
        .to_bits();
        node.on_receive(id, payload, Nut::new(0));
        assert!(node.is_active());
        assert_eq!(node.local_schedule_index(), 0);
        assert_eq!(node.callbacks_mut().whiteboard[NETWORK_TIME_SLOT as usize], 1680);
    }

    #[test]
    fn data_frame_writes_whiteboard_without_rearming() {
        let mut node = Gttcan::init(&schedule(), 8, Nut::new(1000), Harness::default()).unwrap();
        let id = FrameId {
            global_schedule_index: 1,
            data_id: 1,
        }
        .to_bits();
        node.on_receive(id, 0xAAAA, Nut::new(1234));
        assert_eq!(node.callbacks_mut().whiteboard[1], 0xAAAA);
        // Data frames don't arm the timer; only reference frames do.
        assert!(node.callbacks_mut().timer_delay.is_none());
    }

    #[test]
    fn reference_frame_without_start_flag_keeps_schedule_index() {
        let mut node = Gttcan::init(&schedule(), 9, Nut::new(1000), Harness::default()).unwrap();
        let id = FrameId {
            global_schedule_index: 0,
            data_id: NETWORK_TIME_SLOT,
        }
        .to_bits();
        let payload = ReferencePayload {
            start_of_schedule: false,
            network_time: 1000,
        }
        .to_bits();
        node.on_receive(id, payload, Nut::new(1005));
        assert_eq!(node.local_schedule_index(), 0);
        assert!(node.callbacks_mut().timer_delay.is_some());
    }
}
