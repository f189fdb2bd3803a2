use crate::TickCount;
use tracing::debug;

pub const PADDR_START: u32 = 0x1F801000;
pub const PADDR_END: u32 = 0x1F801023;

pub const RAMSIZE_PADDR_START: u32 = 0x1F801060;
pub const RAMSIZE_PADDR_END: u32 = 0x1F801063;

bitfield::bitfield! {
    /// Per-region delay/size configuration, layout per the nocash docs
    /// (psx-spx, "Memory Control").
    #[derive(Clone, Copy, Default)]
    pub struct MemDelay(u32);
    pub access_time, set_access_time: 7, 4;
    pub use_com0_time, set_use_com0_time: 8;
    pub use_com1_time, _: 9;
    pub use_com2_time, set_use_com2_time: 10;
    pub use_com3_time, set_use_com3_time: 11;
    pub data_bus_16bit, set_data_bus_16bit: 12;
    pub memory_window_size, _: 20, 16;
}

impl MemDelay {
    pub const WRITE_MASK: u32 = 0b10101111_00011111_11111111_11111111;
}

bitfield::bitfield! {
    /// Shared COM0..COM3 delay fields, layout per the nocash docs.
    #[derive(Clone, Copy, Default)]
    pub struct ComDelay(u32);
    pub com0, set_com0: 3, 0;
    pub com1, _: 7, 4;
    pub com2, set_com2: 11, 8;
    pub com3, set_com3: 15, 12;
}

impl ComDelay {
    pub const WRITE_MASK: u32 = 0b00000000_00000011_11111111_11111111;
}

// Register indices within the MEMCTRL block.
const EXP1_BASE: usize = 0;
const EXP2_BASE: usize = 1;
const EXP1_DELAY_SIZE: usize = 2;
const EXP3_DELAY_SIZE: usize = 3;
const BIOS_DELAY_SIZE: usize = 4;
const SPU_DELAY_SIZE: usize = 5;
const CDROM_DELAY_SIZE: usize = 6;
const EXP2_DELAY_SIZE: usize = 7;
const COMMON_DELAY: usize = 8;

/// MEMCTRL and MEMCTRL2 register state plus the access-time tables derived
/// from them. Tables are indexed byte/halfword/word.
pub struct MemCtrl {
    regs: [u32; 9],
    pub ram_size: u32,

    pub exp1_access_time: [TickCount; 3],
    pub exp2_access_time: [TickCount; 3],
    pub bios_access_time: [TickCount; 3],
    pub cdrom_access_time: [TickCount; 3],
    pub spu_access_time: [TickCount; 3],
}

impl Default for MemCtrl {
    fn default() -> Self {
        let mut ctrl = MemCtrl {
            regs: [0; 9],
            ram_size: 0,
            exp1_access_time: [0; 3],
            exp2_access_time: [0; 3],
            bios_access_time: [0; 3],
            cdrom_access_time: [0; 3],
            spu_access_time: [0; 3],
        };
        ctrl.reset();
        ctrl
    }
}

impl MemCtrl {
    /// Power-on register values, as the BIOS expects to find them.
    pub fn reset(&mut self) {
        self.regs[EXP1_BASE] = 0x1F000000;
        self.regs[EXP2_BASE] = 0x1F802000;
        self.regs[EXP1_DELAY_SIZE] = 0x0013243F;
        self.regs[EXP3_DELAY_SIZE] = 0x00003022;
        self.regs[BIOS_DELAY_SIZE] = 0x0013243F;
        self.regs[SPU_DELAY_SIZE] = 0x200931E1;
        self.regs[CDROM_DELAY_SIZE] = 0x00020843;
        self.regs[EXP2_DELAY_SIZE] = 0x00070777;
        self.regs[COMMON_DELAY] = 0x00031125;
        self.ram_size = 0x00000B88;
        self.recalculate();
    }

    pub fn read_reg(&self, offset: u32) -> u32 {
        self.regs[(offset / 4) as usize]
    }

    /// Masked register write. Access times are only recomputed when the
    /// stored value actually changes.
    pub fn write_reg(&mut self, offset: u32, value: u32) {
        let index = (offset / 4) as usize;
        let write_mask = if index == COMMON_DELAY {
            ComDelay::WRITE_MASK
        } else {
            MemDelay::WRITE_MASK
        };

        let new_value = (self.regs[index] & !write_mask) | (value & write_mask);
        if self.regs[index] != new_value {
            self.regs[index] = new_value;
            self.recalculate();
        }
    }

    pub fn regs_mut(&mut self) -> &mut [u32; 9] {
        &mut self.regs
    }

    pub fn recalculate(&mut self) {
        let common = ComDelay(self.regs[COMMON_DELAY]);
        self.bios_access_time = calculate_memory_timing(MemDelay(self.regs[BIOS_DELAY_SIZE]), common);
        self.cdrom_access_time =
            calculate_memory_timing(MemDelay(self.regs[CDROM_DELAY_SIZE]), common);
        self.spu_access_time = calculate_memory_timing(MemDelay(self.regs[SPU_DELAY_SIZE]), common);

        debug!(
            "bios timing: byte={} half={} word={}",
            self.bios_access_time[0], self.bios_access_time[1], self.bios_access_time[2]
        );
        debug!(
            "cdrom timing: byte={} half={} word={}",
            self.cdrom_access_time[0], self.cdrom_access_time[1], self.cdrom_access_time[2]
        );
        debug!(
            "spu timing: byte={} half={} word={}",
            self.spu_access_time[0], self.spu_access_time[1], self.spu_access_time[2]
        );
    }
}

/// Converts a region's MEMDELAY and the global COMDELAY into byte, halfword
/// and word access ticks, per the nocash timing formula.
fn calculate_memory_timing(mem_delay: MemDelay, common_delay: ComDelay) -> [TickCount; 3] {
    let mut first: TickCount = 0;
    let mut seq: TickCount = 0;
    let mut min: TickCount = 0;

    if mem_delay.use_com0_time() {
        first += common_delay.com0() as TickCount - 1;
        seq += common_delay.com0() as TickCount - 1;
    }
    if mem_delay.use_com2_time() {
        first += common_delay.com2() as TickCount;
        seq += common_delay.com2() as TickCount;
    }
    if mem_delay.use_com3_time() {
        min = common_delay.com3() as TickCount;
    }
    if first < 6 {
        first += 1;
    }

    first += mem_delay.access_time() as TickCount + 2;
    seq += mem_delay.access_time() as TickCount + 2;

    first = first.max(min + 6);
    seq = seq.max(min + 2);

    let byte = first;
    let (halfword, word) = if mem_delay.data_bus_16bit() {
        (first, first + seq)
    } else {
        (first + seq, first + seq * 3)
    };

    [byte, halfword, word]
}
