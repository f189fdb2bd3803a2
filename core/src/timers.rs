use crate::irq::Interrupt;
use crate::state::{StateError, StateWrapper};
use crate::{System, TickCount};
use tracing::{debug, error};

pub const PADDR_START: u32 = 0x1F801100;
pub const PADDR_END: u32 = 0x1F80112F;

const NUM_TIMERS: usize = 3;

bitfield::bitfield! {
    #[derive(Clone, Copy, Default)]
    pub struct Mode(u32);
    pub sync_enable, set_sync_enable: 0;
    pub sync_mode, _: 2, 1;
    pub reset_at_target, _: 3;
    pub irq_at_target, _: 4;
    pub irq_on_overflow, _: 5;
    pub irq_repeat, _: 6;
    pub irq_pulse_n, _: 7;
    pub clock_source, _: 9, 8;
    pub interrupt_request_n, set_interrupt_request_n: 10;
    pub reached_target, set_reached_target: 11;
    pub reached_overflow, set_reached_overflow: 12;
}

/// What a rising gate edge does while `sync_enable` is set.
#[derive(Clone, Copy, PartialEq)]
enum SyncMode {
    PauseOnGate,
    ResetOnGate,
    ResetAndRunOnGate,
    FreeRunOnGate,
}

impl Mode {
    fn sync(self) -> SyncMode {
        match self.sync_mode() {
            0 => SyncMode::PauseOnGate,
            1 => SyncMode::ResetOnGate,
            2 => SyncMode::ResetAndRunOnGate,
            _ => SyncMode::FreeRunOnGate,
        }
    }
}

pub struct CounterState {
    mode: Mode,
    counter: u32,
    target: u32,
    gate: bool,
    use_external_clock: bool,
    external_counting_enabled: bool,
    counting_enabled: bool,
    irq_done: bool,
}

impl Default for CounterState {
    fn default() -> Self {
        Self {
            mode: Mode(0),
            counter: 0,
            target: 0,
            gate: false,
            use_external_clock: false,
            external_counting_enabled: false,
            counting_enabled: true,
            irq_done: false,
        }
    }
}

/// The three hardware counters. Timers 0 and 1 can count external events
/// (dot clock, hblank) fed in through `add_ticks`; timer 2 can divide
/// sysclk by 8, carrying the remainder between `execute` calls.
#[derive(Default)]
pub struct Timers {
    states: [CounterState; 3],
    sysclk_div_8_carry: TickCount,
}

impl Timers {
    pub fn reset(&mut self) {
        for cs in &mut self.states {
            *cs = CounterState::default();
        }
        self.sysclk_div_8_carry = 0;
    }

    /// Drives a timer's gate input (hblank/vblank edge from the video
    /// side). Level-triggered effects only apply while sync is enabled.
    pub fn set_gate(&mut self, timer: usize, state: bool) {
        let cs = &mut self.states[timer];
        if cs.gate == state {
            return;
        }

        cs.gate = state;

        if cs.mode.sync_enable() {
            if state {
                match cs.mode.sync() {
                    SyncMode::ResetOnGate | SyncMode::ResetAndRunOnGate => cs.counter = 0,
                    // One-shot: the first gate edge releases the counter
                    SyncMode::FreeRunOnGate => cs.mode.set_sync_enable(false),
                    SyncMode::PauseOnGate => (),
                }
            }

            Self::update_counting_enabled(cs);
        }
    }

    fn update_counting_enabled(cs: &mut CounterState) {
        if cs.mode.sync_enable() {
            cs.counting_enabled = match cs.mode.sync() {
                SyncMode::PauseOnGate | SyncMode::FreeRunOnGate => !cs.gate,
                SyncMode::ResetOnGate => true,
                SyncMode::ResetAndRunOnGate => cs.gate,
            };
        } else {
            cs.counting_enabled = true;
        }

        cs.external_counting_enabled = cs.use_external_clock && cs.counting_enabled;
    }

    /// Advances a counter and fires target/overflow interrupts. `count`
    /// is in the timer's own clock domain.
    pub fn add_ticks(system: &mut System, timer: usize, count: TickCount) {
        let cs = &mut system.timers.states[timer];
        let old_counter = cs.counter;
        cs.counter = cs.counter.wrapping_add(count as u32);

        let mut interrupt_request = false;
        if cs.counter >= cs.target && old_counter < cs.target {
            interrupt_request = true;
            cs.mode.set_reached_target(true);
        }
        if cs.counter >= 0xFFFF {
            interrupt_request = true;
            cs.mode.set_reached_overflow(true);
        }
        let pulse = !cs.mode.irq_pulse_n();

        if interrupt_request {
            if pulse {
                // the request line actually only drops for a few cycles
                system.timers.states[timer]
                    .mode
                    .set_interrupt_request_n(false);
                Self::update_irq(system, timer);
                system.timers.states[timer]
                    .mode
                    .set_interrupt_request_n(true);
            } else {
                let cs = &mut system.timers.states[timer];
                let level = cs.mode.interrupt_request_n();
                cs.mode.set_interrupt_request_n(!level);
                Self::update_irq(system, timer);
            }
        }

        let cs = &mut system.timers.states[timer];
        if cs.mode.reset_at_target() {
            if cs.target > 0 {
                cs.counter %= cs.target;
            } else {
                cs.counter = 0;
            }
        } else {
            // modulo, not mask: 0xFFFF wraps straight to zero, as on the
            // real counter
            cs.counter %= 0xFFFF;
        }
    }

    /// Runs all three counters over a sysclk budget.
    pub fn execute(system: &mut System, sysclk_ticks: TickCount) {
        for timer in 0..2 {
            let cs = &system.timers.states[timer];
            if !cs.external_counting_enabled && cs.counting_enabled {
                Self::add_ticks(system, timer, sysclk_ticks);
            }
        }

        let cs = &system.timers.states[2];
        if cs.external_counting_enabled {
            let carry = system.timers.sysclk_div_8_carry;
            let div_8_ticks = (sysclk_ticks + carry) / 8;
            system.timers.sysclk_div_8_carry = (sysclk_ticks + carry) % 8;
            Self::add_ticks(system, 2, div_8_ticks);
        } else if cs.counting_enabled {
            Self::add_ticks(system, 2, sysclk_ticks);
        }

        Self::update_downcount(system);
    }

    fn update_irq(system: &mut System, timer: usize) {
        let cs = &mut system.timers.states[timer];
        if cs.mode.interrupt_request_n() || (!cs.mode.irq_repeat() && cs.irq_done) {
            return;
        }

        debug!("raising timer {timer} irq");
        cs.irq_done = true;

        let irq = match timer {
            0 => Interrupt::Timer0,
            1 => Interrupt::Timer1,
            _ => Interrupt::Timer2,
        };
        system.intc.interrupt_request(irq);
    }

    /// Publishes how many sysclk ticks may pass before a timer event,
    /// so the CPU can run unchecked until then.
    fn update_downcount(system: &mut System) {
        let mut min_ticks = TickCount::MAX;
        for i in 0..NUM_TIMERS {
            let cs = &system.timers.states[i];
            if !cs.counting_enabled || (i < 2 && cs.external_counting_enabled) {
                continue;
            }

            let mut ticks_for_timer = min_ticks;
            if cs.mode.irq_at_target() && cs.counter < cs.target {
                ticks_for_timer = (cs.target - cs.counter) as TickCount;
            }
            if cs.mode.irq_on_overflow() && cs.counter < cs.target {
                ticks_for_timer = ticks_for_timer.min((0xFFFF - cs.counter) as TickCount);
            }

            if cs.external_counting_enabled {
                // sysclk/8 for timer 2
                ticks_for_timer = (ticks_for_timer / 8).max(1);
            }

            min_ticks = min_ticks.min(ticks_for_timer);
        }

        system.scheduler.set_downcount(min_ticks);
    }

    /// Counter and mode reads must observe ticks up to "now", so both
    /// force a synchronize first.
    pub fn read_register(system: &mut System, offset: u32) -> u32 {
        let timer_index = ((offset >> 4) & 0x03) as usize;
        let port_offset = offset & 0x0F;

        match port_offset {
            0x00 => {
                system.synchronize();
                system.timers.states[timer_index].counter
            }

            0x04 => {
                system.synchronize();

                let cs = &mut system.timers.states[timer_index];
                let bits = cs.mode.0;
                cs.mode.set_reached_overflow(false);
                cs.mode.set_reached_target(false);
                bits
            }

            0x08 => system.timers.states[timer_index].target,

            _ => {
                error!("unknown timer {timer_index} register read {port_offset:02X}");
                0xFFFF_FFFF
            }
        }
    }

    pub fn write_register(system: &mut System, offset: u32, value: u32) {
        let timer_index = ((offset >> 4) & 0x03) as usize;
        let port_offset = offset & 0x0F;

        match port_offset {
            0x00 => {
                debug!("timer {timer_index} write counter {value}");
                system.synchronize();
                system.timers.states[timer_index].counter = value & 0xFFFF;
            }

            0x04 => {
                debug!("timer {timer_index} write mode {value:04X}");
                system.synchronize();

                let cs = &mut system.timers.states[timer_index];
                cs.mode.0 = value & 0x1FFF;
                let source_bit = if timer_index == 2 { 2 } else { 1 };
                cs.use_external_clock = cs.mode.clock_source() & source_bit != 0;
                cs.counter = 0;
                cs.irq_done = false;
                if cs.mode.irq_pulse_n() {
                    cs.mode.set_interrupt_request_n(true);
                }

                Self::update_counting_enabled(cs);
                Self::update_irq(system, timer_index);
            }

            0x08 => {
                debug!("timer {timer_index} write target {value:04X}");
                system.synchronize();
                system.timers.states[timer_index].target = value & 0xFFFF;
            }

            _ => error!("unknown timer {timer_index} register write {port_offset:02X} <- {value:X}"),
        }
    }

    pub fn do_state(&mut self, sw: &mut StateWrapper) -> Result<(), StateError> {
        for cs in &mut self.states {
            sw.do_u32(&mut cs.mode.0)?;
            sw.do_u32(&mut cs.counter)?;
            sw.do_u32(&mut cs.target)?;
            sw.do_bool(&mut cs.gate)?;
            sw.do_bool(&mut cs.use_external_clock)?;
            sw.do_bool(&mut cs.external_counting_enabled)?;
            sw.do_bool(&mut cs.counting_enabled)?;
            sw.do_bool(&mut cs.irq_done)?;
        }

        sw.do_i32(&mut self.sysclk_div_8_carry)
    }
}
