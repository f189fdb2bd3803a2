use crate::System;
use crate::memory::utils::{ByteAddressable, fixup_w32_read, fixup_w32_write};
use crate::timers::Timers;
use tracing::error;

impl System {
    pub(crate) fn memctrl_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        let value = self.memctrl.read_reg(offset & !3);
        T::from_u32(fixup_w32_read(offset, value))
    }

    pub(crate) fn memctrl_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        let (offset, value) = fixup_w32_write(offset, value.to_u32());
        self.memctrl.write_reg(offset, value);
    }

    pub(crate) fn memctrl2_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        if offset == 0 {
            return T::from_u32(self.memctrl.ram_size);
        }

        error!("unknown ramsize read {offset:02X}");
        T::from_u32(0xFFFF_FFFF)
    }

    pub(crate) fn memctrl2_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        if offset == 0 {
            self.memctrl.ram_size = value.to_u32();
            return;
        }

        error!("unknown ramsize write {offset:02X} <- {value:08x}");
    }

    pub(crate) fn intc_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        let value = self.intc.read_reg(offset & !3);
        T::from_u32(fixup_w32_read(offset, value))
    }

    pub(crate) fn intc_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        let (offset, value) = fixup_w32_write(offset, value.to_u32());
        self.intc.write_reg(offset, value);
    }

    pub(crate) fn timers_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        let value = Timers::read_register(self, offset & !3);
        T::from_u32(fixup_w32_read(offset, value))
    }

    pub(crate) fn timers_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        let (offset, value) = fixup_w32_write(offset, value.to_u32());
        Timers::write_register(self, offset, value);
    }

    pub(crate) fn pad_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        T::from_u32(self.pad.read_register(offset))
    }

    pub(crate) fn pad_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        self.pad.write_register(offset, value.to_u32());
    }

    pub(crate) fn sio_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        error!("SIO read {offset:08X}");
        T::from_u32(if offset == 0x04 { 0x5 } else { 0 })
    }

    pub(crate) fn sio_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        error!("SIO write {offset:08X} <- {value:08x}");
    }

    pub(crate) fn dma_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        let value = self.dma.read_register(offset & !3);
        T::from_u32(fixup_w32_read(offset, value))
    }

    pub(crate) fn dma_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        let mut offset = offset;
        let mut value = value.to_u32();

        if T::LEN < 4 {
            if (offset & 0xF0) < 7 && (offset & 0x0F) == 0x04 {
                // narrow writes to a channel length register are
                // zero-extended rather than lane-shifted
            } else {
                (offset, value) = fixup_w32_write(offset, value);
            }
        }

        self.dma.write_register(offset, value);
    }

    pub(crate) fn gpu_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        debug_assert_eq!(T::LEN, 4, "gpu registers are word-wide");
        T::from_u32(self.gpu.read_register(offset))
    }

    pub(crate) fn gpu_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        debug_assert_eq!(T::LEN, 4, "gpu registers are word-wide");
        self.gpu.write_register(offset, value.to_u32());
    }

    pub(crate) fn mdec_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        debug_assert_eq!(T::LEN, 4, "mdec registers are word-wide");
        T::from_u32(self.mdec.read_register(offset))
    }

    pub(crate) fn mdec_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        debug_assert_eq!(T::LEN, 4, "mdec registers are word-wide");
        self.mdec.write_register(offset, value.to_u32());
    }

    pub(crate) fn spu_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        // word reads are split into two halfword reads
        if T::LEN == 4 {
            let lsb = self.spu.read_register(offset);
            let msb = self.spu.read_register(offset + 2);
            T::from_u32(u32::from(lsb) | (u32::from(msb) << 16))
        } else {
            T::from_u32(u32::from(self.spu.read_register(offset)))
        }
    }

    pub(crate) fn spu_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        debug_assert_eq!(offset & 1, 0, "spu registers are halfword-aligned");
        let value = value.to_u32();

        if T::LEN == 4 {
            self.spu.write_register(offset, value as u16);
            self.spu.write_register(offset + 2, (value >> 16) as u16);
        } else {
            self.spu.write_register(offset, value as u16);
        }
    }

    pub(crate) fn cdrom_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        debug_assert_eq!(T::LEN, 1, "cdrom registers are byte-wide");
        T::from_u32(u32::from(self.cdrom.read_register(offset)))
    }

    pub(crate) fn cdrom_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        debug_assert_eq!(T::LEN, 1, "cdrom registers are byte-wide");
        self.cdrom.write_register(offset, value.to_u32() as u8);
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::bios::{self, Bios};
    use crate::ports::{HalfwordPort, WordPort};
    use crate::System;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn system() -> System {
        System::new(Bios::from_bytes(vec![0; bios::SIZE]).unwrap())
    }

    /// Records every register access it sees and answers reads from a
    /// fixed word.
    struct RecordingPort {
        log: Rc<RefCell<Vec<(u32, u32)>>>,
        read_value: u32,
    }

    impl WordPort for RecordingPort {
        fn read_register(&mut self, _offset: u32) -> u32 {
            self.read_value
        }

        fn write_register(&mut self, offset: u32, value: u32) {
            self.log.borrow_mut().push((offset, value));
        }
    }

    impl HalfwordPort for RecordingPort {
        fn read_register(&mut self, offset: u32) -> u16 {
            (self.read_value >> ((offset & 2) * 8)) as u16
        }

        fn write_register(&mut self, offset: u32, value: u16) {
            self.log.borrow_mut().push((offset, u32::from(value)));
        }
    }

    fn recording(read_value: u32) -> (Rc<RefCell<Vec<(u32, u32)>>>, Box<RecordingPort>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let port = Box::new(RecordingPort {
            log: Rc::clone(&log),
            read_value,
        });
        (log, port)
    }

    #[test]
    fn narrow_dma_reads_pull_down_the_addressed_lane() {
        let mut sys = system();
        let (_, port) = recording(0xAABB_CCDD);
        sys.dma = port;

        let (value, _) = sys.read::<u8>(0x1F801083).unwrap();
        assert_eq!(value, 0xAA);
        let (value, _) = sys.read::<u16>(0x1F801082).unwrap();
        assert_eq!(value, 0xAABB);
    }

    #[test]
    fn narrow_dma_length_writes_are_zero_extended() {
        let mut sys = system();
        let (log, port) = recording(0);
        sys.dma = port;

        // channel 0 length register: no lane shift
        sys.write::<u16>(0x1F801084, 0xBEEF).unwrap();
        assert_eq!(log.borrow().last(), Some(&(0x04, 0xBEEF)));

        // any other register keeps the lane-shift rule
        sys.write::<u16>(0x1F80108A, 0xBEEF).unwrap();
        assert_eq!(log.borrow().last(), Some(&(0x08, 0xBEEF_0000)));
    }

    #[test]
    fn spu_word_accesses_split_into_halfwords() {
        let mut sys = system();
        let (log, port) = recording(0x1234_5678);
        sys.spu = port;

        let (value, _) = sys.read::<u32>(0x1F801C00).unwrap();
        assert_eq!(value, 0x1234_5678);

        sys.write::<u32>(0x1F801C04, 0xCAFE_BABE).unwrap();
        assert_eq!(log.borrow().as_slice(), &[(0x04, 0xBABE), (0x06, 0xCAFE)]);
    }

    #[test]
    fn intc_halfword_write_lands_in_the_addressed_lane() {
        let mut sys = system();

        // set the mask through its upper halfword: lane shift makes this
        // a no-op on the low 11 mask bits
        sys.write::<u16>(0x1F801076, 0xFFFF).unwrap();
        assert_eq!(sys.intc.read_reg(4), 0);

        sys.write::<u16>(0x1F801074, 0x0005).unwrap();
        assert_eq!(sys.intc.read_reg(4), 0x0005);
    }
}
