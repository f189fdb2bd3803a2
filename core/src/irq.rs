use tracing::error;

pub const PADDR_START: u32 = 0x1F801070;
pub const PADDR_END: u32 = 0x1F801077;

const REGISTER_WRITE_MASK: u32 = 0x7FF;

/// Hardware interrupt sources, in I_STAT bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    Gpu = 1,
    CdRom = 2,
    Dma = 3,
    Timer0 = 4,
    Timer1 = 5,
    Timer2 = 6,
    Pad = 7,
    Sio = 8,
    Spu = 9,
    Lightpen = 10,
}

#[derive(Default)]
pub struct InterruptController {
    stat: u32,
    mask: u32,
}

impl InterruptController {
    /// Latches an interrupt for the CPU to observe at its next poll.
    pub fn interrupt_request(&mut self, irq: Interrupt) {
        self.stat |= 1 << irq as u32;
    }

    pub fn read_reg(&self, offset: u32) -> u32 {
        match offset {
            0 => self.stat,
            4 => self.mask,
            _ => {
                error!("unknown irqctl read {offset:02X}");
                0xFFFF_FFFF
            }
        }
    }

    pub fn write_reg(&mut self, offset: u32, val: u32) {
        match offset {
            // Writing 0 bits acknowledges pending interrupts
            0 => self.stat &= val,
            4 => self.mask = val & REGISTER_WRITE_MASK,
            _ => error!("unknown irqctl write {offset:02X} <- {val:08X}"),
        }
    }

    pub fn pending(&self) -> bool {
        self.stat & self.mask != 0
    }

    pub fn requested(&self, irq: Interrupt) -> bool {
        self.stat & (1 << irq as u32) != 0
    }
}
