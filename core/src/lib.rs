mod consts;
mod irq;
pub mod memory;
pub mod ports;
mod sched;
pub mod state;
mod timers;

use memory::Expansion1;
use memory::bios::{self, Bios};
use memory::memctrl::MemCtrl;
use memory::ram::Ram;
use memory::scratch::Scratch;
use ports::{BytePort, HalfwordPort, NullPort, WordPort};
use sched::Scheduler;
use state::{StateError, StateWrapper};
use std::error::Error;
use std::path::PathBuf;

pub use consts::SYSCLK_FREQUENCY;
pub use irq::{Interrupt, InterruptController};
pub use memory::utils::Exception;
pub use timers::Timers;

/// Cycle quantities exchanged with the CPU driver. Signed, as downcount
/// arithmetic can go through zero.
pub type TickCount = i32;

pub struct Config {
    pub bios_path: PathBuf,
}

/// Central context: the bus-owned stores and register files, the timer
/// unit, and the register ports of every attached collaborator. All
/// accesses flow through `read`/`write`; the CPU driver pumps time in
/// through `tick`/`synchronize`.
pub struct System {
    pub ram: Ram,
    bios: Bios,
    scratch: Scratch,
    exp1: Expansion1,
    memctrl: MemCtrl,

    pub timers: Timers,
    pub intc: InterruptController,

    pub gpu: Box<dyn WordPort>,
    pub mdec: Box<dyn WordPort>,
    pub dma: Box<dyn WordPort>,
    pub pad: Box<dyn WordPort>,
    pub spu: Box<dyn HalfwordPort>,
    pub cdrom: Box<dyn BytePort>,

    scheduler: Scheduler,
    tty: String,
}

impl System {
    pub fn build(config: Config) -> Result<Self, Box<dyn Error>> {
        Ok(Self::new(Bios::from_path(&config.bios_path)?))
    }

    pub fn new(bios: Bios) -> Self {
        let mut psx = System {
            ram: Ram::default(),
            bios,
            scratch: Scratch::default(),
            exp1: Expansion1::default(),
            memctrl: MemCtrl::default(),
            timers: Timers::default(),
            intc: InterruptController::default(),
            gpu: Box::new(NullPort("gpu")),
            mdec: Box::new(NullPort("mdec")),
            dma: Box::new(NullPort("dma")),
            pad: Box::new(NullPort("pad")),
            spu: Box::new(NullPort("spu")),
            cdrom: Box::new(NullPort("cdrom")),
            scheduler: Scheduler::default(),
            tty: String::new(),
        };

        // Enable BIOS TTY output
        let (offset, word) = consts::BIOS_TTY_PATCH_A;
        psx.patch_bios(bios::PADDR_START + offset, word, 0xFFFF_FFFF);
        let (offset, word) = consts::BIOS_TTY_PATCH_B;
        psx.patch_bios(bios::PADDR_START + offset, word, 0xFFFF_FFFF);

        psx
    }

    /// Restores the power-on state of everything but the BIOS image.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.memctrl.reset();
        self.timers.reset();
        self.tty.clear();
    }

    /// Accrues sysclk ticks the CPU has executed since the last
    /// synchronize.
    pub fn tick(&mut self, cycles: TickCount) {
        self.scheduler.add_pending(cycles);
    }

    /// Flushes pending sysclk ticks into the timers so counter state
    /// reflects "now". Re-entrant: a nested call observes zero pending
    /// ticks and does nothing.
    pub fn synchronize(&mut self) {
        let ticks = self.scheduler.take_pending();
        if ticks > 0 {
            Timers::execute(self, ticks);
        }
    }

    /// How many cycles the CPU may run before the next timer event.
    pub fn downcount(&self) -> TickCount {
        self.scheduler.downcount()
    }

    /// Total sysclk ticks committed through `synchronize`.
    pub fn sysclk(&self) -> u64 {
        self.scheduler.sysclk()
    }

    /// The TTY line being accumulated at EXP2.
    pub fn tty_line(&self) -> &str {
        &self.tty
    }

    /// Saves or restores everything the bus and timers own. Field order
    /// is fixed for cross-version state compatibility.
    pub fn do_state(&mut self, sw: &mut StateWrapper) -> Result<(), StateError> {
        sw.do_i32_array(&mut self.memctrl.exp1_access_time)?;
        sw.do_i32_array(&mut self.memctrl.exp2_access_time)?;
        sw.do_i32_array(&mut self.memctrl.bios_access_time)?;
        sw.do_i32_array(&mut self.memctrl.cdrom_access_time)?;
        sw.do_i32_array(&mut self.memctrl.spu_access_time)?;
        sw.do_bytes(self.ram.bytes_mut())?;
        sw.do_bytes(self.bios.bytes_mut())?;
        for reg in self.memctrl.regs_mut() {
            sw.do_u32(reg)?;
        }
        sw.do_u32(&mut self.memctrl.ram_size)?;
        sw.do_string(&mut self.tty)?;

        self.timers.do_state(sw)
    }
}
