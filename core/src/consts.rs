/// Master clock of the R3000A, in Hz.
pub const SYSCLK_FREQUENCY: u32 = 33_868_800;

/// BIOS image offsets patched after load to turn on TTY output.
pub const BIOS_TTY_PATCH_A: (u32, u32) = (0x6F0C, 0x24010001);
pub const BIOS_TTY_PATCH_B: (u32, u32) = (0x6F14, 0xAF81A9C0);
