mod exp;
mod fastmem;
mod handlers;
pub mod memctrl;
pub mod utils;

pub use exp::{Expansion1, exp1, exp2};
pub use fastmem::{bios, ram, scratch};

use crate::{System, TickCount, irq, timers};
use tracing::{error, info, warn};
use utils::{ByteAddressable, Exception, mask_region};

// Fixed access costs for regions without a configurable delay.
const RAM_ACCESS_TICKS: TickCount = 4;
const SCRATCHPAD_ACCESS_TICKS: TickCount = 1;
const IO_ACCESS_TICKS: TickCount = 2;
const INVALID_ACCESS_TICKS: TickCount = 1;

// Collaborator register blocks inside the I/O page.
const PAD_START: u32 = 0x1F801040;
const PAD_END: u32 = 0x1F80104F;
const SIO_START: u32 = 0x1F801050;
const SIO_END: u32 = 0x1F80105F;
const DMA_START: u32 = 0x1F801080;
const DMA_END: u32 = 0x1F8010FF;
const CDROM_START: u32 = 0x1F801800;
const CDROM_END: u32 = 0x1F801803;
const GPU_START: u32 = 0x1F801810;
const GPU_END: u32 = 0x1F801817;
const MDEC_START: u32 = 0x1F801820;
const MDEC_END: u32 = 0x1F801827;
const SPU_START: u32 = 0x1F801C00;
const SPU_END: u32 = 0x1F801E7F;

impl System {
    /// Reads `T` at a virtual address, returning the value and the access
    /// cost in CPU cycles. Unmapped addresses read as all-ones.
    pub fn read<T: ByteAddressable>(&mut self, addr: u32) -> Result<(T, TickCount), Exception> {
        if !addr.is_multiple_of(T::LEN as u32) {
            return Err(Exception::LoadAddressError(addr));
        }

        let addr = mask_region(addr);

        let access = match addr {
            ram::PADDR_START..=ram::PADDR_END => (self.ram.read(addr), RAM_ACCESS_TICKS),

            bios::PADDR_START..=bios::PADDR_END => (
                self.bios.read(addr),
                self.memctrl.bios_access_time[T::SIZE_INDEX],
            ),

            scratch::PADDR_START..=scratch::PADDR_END => {
                (self.scratch.read(addr), SCRATCHPAD_ACCESS_TICKS)
            }

            exp1::PADDR_START..=exp1::PADDR_END => (
                self.exp1.read(addr - exp1::PADDR_START),
                self.memctrl.exp1_access_time[T::SIZE_INDEX],
            ),

            memctrl::PADDR_START..=memctrl::PADDR_END => (
                self.memctrl_read(addr - memctrl::PADDR_START),
                IO_ACCESS_TICKS,
            ),

            PAD_START..=PAD_END => (self.pad_read(addr - PAD_START), IO_ACCESS_TICKS),

            SIO_START..=SIO_END => (self.sio_read(addr - SIO_START), IO_ACCESS_TICKS),

            memctrl::RAMSIZE_PADDR_START..=memctrl::RAMSIZE_PADDR_END => (
                self.memctrl2_read(addr - memctrl::RAMSIZE_PADDR_START),
                IO_ACCESS_TICKS,
            ),

            irq::PADDR_START..=irq::PADDR_END => {
                (self.intc_read(addr - irq::PADDR_START), IO_ACCESS_TICKS)
            }

            DMA_START..=DMA_END => (self.dma_read(addr - DMA_START), IO_ACCESS_TICKS),

            timers::PADDR_START..=timers::PADDR_END => (
                self.timers_read(addr - timers::PADDR_START),
                IO_ACCESS_TICKS,
            ),

            CDROM_START..=CDROM_END => (
                self.cdrom_read(addr - CDROM_START),
                self.memctrl.cdrom_access_time[T::SIZE_INDEX],
            ),

            GPU_START..=GPU_END => (self.gpu_read(addr - GPU_START), IO_ACCESS_TICKS),

            MDEC_START..=MDEC_END => (self.mdec_read(addr - MDEC_START), IO_ACCESS_TICKS),

            SPU_START..=SPU_END => (
                self.spu_read(addr - SPU_START),
                self.memctrl.spu_access_time[T::SIZE_INDEX],
            ),

            exp2::PADDR_START..=exp2::PADDR_END => (
                self.exp2_read(addr - exp2::PADDR_START),
                self.memctrl.exp2_access_time[T::SIZE_INDEX],
            ),

            _ => {
                error!("invalid {}-byte read at {addr:08X}", T::LEN);
                (T::from_u32(0xFFFF_FFFF), INVALID_ACCESS_TICKS)
            }
        };

        Ok(access)
    }

    /// Writes `T` at a virtual address, returning the access cost in CPU
    /// cycles. Unmapped or read-only addresses swallow the write.
    pub fn write<T: ByteAddressable>(&mut self, addr: u32, data: T) -> Result<TickCount, Exception> {
        if !addr.is_multiple_of(T::LEN as u32) {
            return Err(Exception::StoreAddressError(addr));
        }

        let addr = mask_region(addr);

        let ticks = match addr {
            ram::PADDR_START..=ram::PADDR_END => {
                self.ram.write(addr, data);
                RAM_ACCESS_TICKS
            }

            bios::PADDR_START..=bios::PADDR_END => {
                warn!("write to bios ignored: {addr:08X} <- {data:08x}");
                self.memctrl.bios_access_time[T::SIZE_INDEX]
            }

            scratch::PADDR_START..=scratch::PADDR_END => {
                self.scratch.write(addr, data);
                SCRATCHPAD_ACCESS_TICKS
            }

            exp1::PADDR_START..=exp1::PADDR_END => {
                self.exp1_write(addr - exp1::PADDR_START, data);
                self.memctrl.exp1_access_time[T::SIZE_INDEX]
            }

            memctrl::PADDR_START..=memctrl::PADDR_END => {
                self.memctrl_write(addr - memctrl::PADDR_START, data);
                IO_ACCESS_TICKS
            }

            PAD_START..=PAD_END => {
                self.pad_write(addr - PAD_START, data);
                IO_ACCESS_TICKS
            }

            SIO_START..=SIO_END => {
                self.sio_write(addr - SIO_START, data);
                IO_ACCESS_TICKS
            }

            memctrl::RAMSIZE_PADDR_START..=memctrl::RAMSIZE_PADDR_END => {
                self.memctrl2_write(addr - memctrl::RAMSIZE_PADDR_START, data);
                IO_ACCESS_TICKS
            }

            irq::PADDR_START..=irq::PADDR_END => {
                self.intc_write(addr - irq::PADDR_START, data);
                IO_ACCESS_TICKS
            }

            DMA_START..=DMA_END => {
                self.dma_write(addr - DMA_START, data);
                IO_ACCESS_TICKS
            }

            timers::PADDR_START..=timers::PADDR_END => {
                self.timers_write(addr - timers::PADDR_START, data);
                IO_ACCESS_TICKS
            }

            CDROM_START..=CDROM_END => {
                self.cdrom_write(addr - CDROM_START, data);
                self.memctrl.cdrom_access_time[T::SIZE_INDEX]
            }

            GPU_START..=GPU_END => {
                self.gpu_write(addr - GPU_START, data);
                IO_ACCESS_TICKS
            }

            MDEC_START..=MDEC_END => {
                self.mdec_write(addr - MDEC_START, data);
                IO_ACCESS_TICKS
            }

            SPU_START..=SPU_END => {
                self.spu_write(addr - SPU_START, data);
                self.memctrl.spu_access_time[T::SIZE_INDEX]
            }

            exp2::PADDR_START..=exp2::PADDR_END => {
                self.exp2_write(addr - exp2::PADDR_START, data);
                self.memctrl.exp2_access_time[T::SIZE_INDEX]
            }

            _ => {
                error!("invalid {}-byte write at {addr:08X} (value {data:08x})", T::LEN);
                INVALID_ACCESS_TICKS
            }
        };

        Ok(ticks)
    }

    /// In-place read-modify-write on the BIOS image; used to install the
    /// TTY-enable patch after load.
    pub fn patch_bios(&mut self, address: u32, value: u32, mask: u32) {
        let phys_address = address & 0x1FFFFFFF;
        let offset = phys_address - bios::PADDR_START;
        debug_assert!(phys_address >= bios::PADDR_START && offset < bios::SIZE as u32);

        let existing_value = self.bios.word(offset);
        let new_value = (existing_value & !mask) | value;
        self.bios.set_word(offset, new_value);

        info!("bios patch {address:08X}: {existing_value:08X} -> {new_value:08X}");
    }

    /// Installs an optional EXP1 parallel-port ROM.
    pub fn set_expansion_rom(&mut self, data: Vec<u8>) {
        self.exp1.set_rom(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::bios::Bios;

    fn system() -> System {
        System::new(Bios::from_bytes(vec![0; bios::SIZE]).unwrap())
    }

    #[test]
    fn ram_mirrors_and_segments_alias_one_cell() {
        let mut sys = system();
        sys.write::<u8>(0x00001000, 0xAB).unwrap();

        assert_eq!(sys.read::<u8>(0x80201000).unwrap().0, 0xAB);
        assert_eq!(sys.read::<u8>(0xA0401000).unwrap().0, 0xAB);
        assert_eq!(sys.read::<u8>(0x00601000).unwrap().0, 0xAB);
    }

    #[test]
    fn ram_round_trips_all_widths() {
        let mut sys = system();

        sys.write::<u32>(0x100, 0xDEAD_BEEF).unwrap();
        assert_eq!(sys.read::<u32>(0x100).unwrap().0, 0xDEAD_BEEF);
        assert_eq!(sys.read::<u16>(0x102).unwrap().0, 0xDEAD);
        assert_eq!(sys.read::<u8>(0x101).unwrap().0, 0xBE);

        sys.write::<u16>(0x200, 0x1234).unwrap();
        assert_eq!(sys.read::<u16>(0x200).unwrap().0, 0x1234);
    }

    #[test]
    fn scratchpad_round_trips() {
        let mut sys = system();
        sys.write::<u32>(0x1F800010, 0xCAFE_BABE).unwrap();
        assert_eq!(sys.read::<u32>(0x9F800010).unwrap().0, 0xCAFE_BABE);
    }

    #[test]
    fn misaligned_accesses_fault_before_side_effects() {
        let mut sys = system();
        assert_eq!(
            sys.read::<u32>(0x0000_0002),
            Err(Exception::LoadAddressError(2))
        );
        assert_eq!(
            sys.write::<u16>(0x0000_0001, 0),
            Err(Exception::StoreAddressError(1))
        );
    }

    #[test]
    fn unmapped_addresses_read_all_ones_for_one_tick() {
        let mut sys = system();

        let (value, ticks) = sys.read::<u32>(0x1F801024).unwrap();
        assert_eq!(value, 0xFFFF_FFFF);
        assert_eq!(ticks, 1);

        let (value, _) = sys.read::<u8>(0x1FC90000).unwrap();
        assert_eq!(value, 0xFF);

        // dropped, but costed
        assert_eq!(sys.write::<u32>(0x1F801024, 0).unwrap(), 1);
    }

    #[test]
    fn access_costs_follow_the_region() {
        let mut sys = system();

        assert_eq!(sys.read::<u32>(0x0).unwrap().1, 4);
        assert_eq!(sys.read::<u32>(0x1F800000).unwrap().1, 1);
        assert_eq!(sys.read::<u32>(0x1F801070).unwrap().1, 2);

        // power-on BIOS timings: byte 7, halfword 13, word 25
        assert_eq!(sys.read::<u8>(0xBFC00000).unwrap().1, 7);
        assert_eq!(sys.read::<u16>(0xBFC00000).unwrap().1, 13);
        assert_eq!(sys.read::<u32>(0xBFC00000).unwrap().1, 25);
    }

    #[test]
    fn bios_writes_are_dropped() {
        let mut sys = system();
        let (before, _) = sys.read::<u32>(0xBFC00010).unwrap();
        sys.write::<u32>(0xBFC00010, !before).unwrap();
        assert_eq!(sys.read::<u32>(0xBFC00010).unwrap().0, before);
    }

    #[test]
    fn memctrl_round_trips_through_its_write_mask() {
        let mut sys = system();

        let old = sys.read::<u32>(0x1F801010).unwrap().0;
        sys.write::<u32>(0x1F801010, 0xFFFF_FFFF).unwrap();

        let mask = memctrl::MemDelay::WRITE_MASK;
        assert_eq!(
            sys.read::<u32>(0x1F801010).unwrap().0,
            (old & !mask) | (0xFFFF_FFFF & mask)
        );
    }

    #[test]
    fn memctrl_writes_retune_bios_access_cost() {
        let mut sys = system();

        // drop the BIOS access_time field to zero
        let old = sys.read::<u32>(0x1F801010).unwrap().0;
        sys.write::<u32>(0x1F801010, old & !0xF0).unwrap();

        assert_eq!(sys.read::<u8>(0xBFC00000).unwrap().1, 6);
    }

    #[test]
    fn ramsize_register_round_trips() {
        let mut sys = system();
        assert_eq!(sys.read::<u32>(0x1F801060).unwrap().0, 0x0000_0B88);

        sys.write::<u32>(0x1F801060, 0x1234_5678).unwrap();
        assert_eq!(sys.read::<u32>(0x1F801060).unwrap().0, 0x1234_5678);
    }

    #[test]
    fn patch_bios_merges_under_mask() {
        let mut sys = system();
        sys.patch_bios(0xBFC00100, 0x0000_BEEF, 0x0000_FFFF);
        sys.patch_bios(0xBFC00100, 0x1100_0000, 0xFF00_0000);

        assert_eq!(sys.read::<u32>(0x1FC00100).unwrap().0, 0x1100_BEEF);
    }

    #[test]
    fn expansion_rom_reads_through_the_bus() {
        let mut sys = system();

        // absent: open bus
        assert_eq!(sys.read::<u32>(0x1F000000).unwrap().0, 0xFFFF_FFFF);

        sys.set_expansion_rom(vec![0x11, 0x22, 0x33, 0x44]);
        assert_eq!(sys.read::<u32>(0x9F000000).unwrap().0, 0x4433_2211);
        assert_eq!(sys.read::<u8>(0x1F020018).unwrap().0, 1);
    }

    #[test]
    fn tty_port_collects_a_line_until_newline() {
        let mut sys = system();

        for byte in [b'H', b'i', b'!'] {
            sys.write::<u8>(0x1F802023, byte).unwrap();
        }
        assert_eq!(sys.tty_line(), "Hi!");

        // carriage return is dropped, newline flushes
        sys.write::<u8>(0x1F802023, b'\r').unwrap();
        assert_eq!(sys.tty_line(), "Hi!");
        sys.write::<u8>(0x1F802023, b'\n').unwrap();
        assert_eq!(sys.tty_line(), "");
    }

    #[test]
    fn exp2_status_port_reports_tty_ready() {
        let mut sys = system();
        assert_eq!(sys.read::<u8>(0x1F802021).unwrap().0, 0x0C);
        assert_eq!(sys.read::<u8>(0x1F802022).unwrap().0, 0xFF);
    }

    #[test]
    fn sio_stub_reports_ready_status() {
        let mut sys = system();
        assert_eq!(sys.read::<u32>(0x1F801054).unwrap().0, 0x5);
        assert_eq!(sys.read::<u32>(0x1F801050).unwrap().0, 0);
    }
}
