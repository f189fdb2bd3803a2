use tracing::warn;

/// Register file of a word-wide collaborator (GPU, MDEC, DMA, pad).
pub trait WordPort {
    fn read_register(&mut self, offset: u32) -> u32;
    fn write_register(&mut self, offset: u32, value: u32);
}

/// Register file of a halfword-wide collaborator (SPU).
pub trait HalfwordPort {
    fn read_register(&mut self, offset: u32) -> u16;
    fn write_register(&mut self, offset: u32, value: u16);
}

/// Register file of a byte-wide collaborator (CDROM).
pub trait BytePort {
    fn read_register(&mut self, offset: u32) -> u8;
    fn write_register(&mut self, offset: u32, value: u8);
}

/// Stand-in for a collaborator that has not been attached. Reads as zero,
/// writes are dropped, both logged.
pub struct NullPort(pub &'static str);

impl WordPort for NullPort {
    fn read_register(&mut self, offset: u32) -> u32 {
        warn!("unattached {} read {:02X}", self.0, offset);
        0
    }

    fn write_register(&mut self, offset: u32, value: u32) {
        warn!("unattached {} write {:02X} <- {:08X}", self.0, offset, value);
    }
}

impl HalfwordPort for NullPort {
    fn read_register(&mut self, offset: u32) -> u16 {
        warn!("unattached {} read {:02X}", self.0, offset);
        0
    }

    fn write_register(&mut self, offset: u32, value: u16) {
        warn!("unattached {} write {:02X} <- {:04X}", self.0, offset, value);
    }
}

impl BytePort for NullPort {
    fn read_register(&mut self, offset: u32) -> u8 {
        warn!("unattached {} read {:02X}", self.0, offset);
        0
    }

    fn write_register(&mut self, offset: u32, value: u8) {
        warn!("unattached {} write {:02X} <- {:02X}", self.0, offset, value);
    }
}
