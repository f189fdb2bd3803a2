use crate::System;
use crate::memory::utils::ByteAddressable;
use tracing::{info, warn};

pub mod exp1 {
    pub const PADDR_START: u32 = 0x1F000000;
    pub const PADDR_END: u32 = 0x1F7FFFFF;

    // Bit 0 reads as 1 when an Action Replay style cartridge is present
    pub const ACTION_REPLAY_SENTINEL: u32 = 0x20018;
}

pub mod exp2 {
    pub const PADDR_START: u32 = 0x1F802000;
    pub const PADDR_END: u32 = 0x1F803FFF;

    pub const TTY_STATUS: u32 = 0x21;
    pub const TTY_DATA: u32 = 0x23;
    pub const POST_STATUS: u32 = 0x41;
}

/// Optional parallel-port ROM. Without a cartridge the region reads as
/// open bus (all ones).
#[derive(Default)]
pub struct Expansion1 {
    rom: Vec<u8>,
}

impl Expansion1 {
    pub fn set_rom(&mut self, data: Vec<u8>) {
        self.rom = data;
    }

    pub fn read<T: ByteAddressable>(&self, offset: u32) -> T {
        if self.rom.is_empty() {
            return T::from_u32(0xFFFF_FFFF);
        }

        if offset == exp1::ACTION_REPLAY_SENTINEL {
            return T::from_u32(1);
        }

        let offset = offset as usize;
        if offset + T::LEN > self.rom.len() {
            return T::from_u32(0);
        }

        T::from_le_bytes(self.rom[offset..offset + T::LEN].try_into().unwrap())
    }
}

impl System {
    pub(crate) fn exp1_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        warn!(
            "EXP1 write: {:08X} <- {:08x}",
            exp1::PADDR_START | offset,
            value
        );
    }

    pub(crate) fn exp2_read<T: ByteAddressable>(&mut self, offset: u32) -> T {
        // rx/tx buffer empty
        if offset == exp2::TTY_STATUS {
            return T::from_u32(0x04 | 0x08);
        }

        warn!("EXP2 read: {:08X}", exp2::PADDR_START | offset);
        T::from_u32(0xFFFF_FFFF)
    }

    pub(crate) fn exp2_write<T: ByteAddressable>(&mut self, offset: u32, value: T) {
        let value = value.to_u32();
        match offset {
            exp2::TTY_DATA => {
                if value == u32::from(b'\r') {
                    return;
                }

                if value == u32::from(b'\n') {
                    if !self.tty.is_empty() {
                        info!("TTY: {}", self.tty);
                    }
                    self.tty.clear();
                } else {
                    self.tty.push(value as u8 as char);
                }
            }
            exp2::POST_STATUS => warn!("BIOS POST status: {:02X}", value & 0x0F),
            _ => warn!(
                "EXP2 write: {:08X} <- {:08X}",
                exp2::PADDR_START | offset,
                value
            ),
        }
    }
}
