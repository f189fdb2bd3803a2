use crate::TickCount;

/// Sysclk bookkeeping between the CPU driver and the timers: ticks the
/// driver has produced but the timers have not yet consumed, plus the
/// downcount horizon the timers publish back.
pub struct Scheduler {
    sysclk: u64,
    pending: TickCount,
    downcount: TickCount,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            sysclk: 0,
            pending: 0,
            downcount: TickCount::MAX,
        }
    }
}

impl Scheduler {
    /// Total sysclk ticks committed so far.
    pub fn sysclk(&self) -> u64 {
        self.sysclk
    }

    pub fn add_pending(&mut self, ticks: TickCount) {
        self.pending += ticks;
    }

    /// Commits and returns the pending budget. A second call before more
    /// ticks accrue returns zero.
    pub fn take_pending(&mut self) -> TickCount {
        let ticks = std::mem::take(&mut self.pending);
        self.sysclk += ticks as u64;
        ticks
    }

    pub fn set_downcount(&mut self, ticks: TickCount) {
        self.downcount = ticks;
    }

    pub fn downcount(&self) -> TickCount {
        self.downcount
    }
}
