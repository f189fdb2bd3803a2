use crate::memory::utils::ByteAddressable;
use std::error::Error;
use std::path::Path;

pub mod bios {
    use super::*;
    pub const PADDR_START: u32 = 0x1FC00000;
    pub const PADDR_END: u32 = 0x1FC7FFFF;
    pub const SIZE: usize = 512 * 1024;

    pub struct Bios {
        bytes: Box<[u8; SIZE]>,
    }

    impl Bios {
        pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
            Self::from_bytes(std::fs::read(path)?)
        }

        pub fn from_bytes(data: Vec<u8>) -> Result<Self, Box<dyn Error>> {
            let bytes: Box<[u8; SIZE]> = match data.into_boxed_slice().try_into() {
                Ok(data) => data,
                Err(data) => {
                    return Err(
                        format!("bios image must be {SIZE} bytes, got {}", data.len()).into(),
                    );
                }
            };

            Ok(Bios { bytes })
        }

        pub fn read<T: ByteAddressable>(&self, addr: u32) -> T {
            let addr = (addr - PADDR_START) as usize;
            T::from_le_bytes(self.bytes[addr..addr + T::LEN].try_into().unwrap())
        }

        pub fn word(&self, offset: u32) -> u32 {
            let offset = offset as usize;
            u32::from_le_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
        }

        pub fn set_word(&mut self, offset: u32, value: u32) {
            let offset = offset as usize;
            self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        pub fn bytes_mut(&mut self) -> &mut [u8] {
            self.bytes.as_mut_slice()
        }
    }
}

pub mod ram {
    use super::*;
    pub const PADDR_START: u32 = 0x00000000;
    // 2 MiB mirrored four times into an 8 MiB window
    pub const PADDR_END: u32 = 0x007FFFFF;
    pub const OFFSET_MASK: u32 = 0x001FFFFF;

    pub struct Ram {
        bytes: Box<[u8; 0x200000]>,
    }

    impl Default for Ram {
        fn default() -> Self {
            let bytes: Box<[u8; 0x200000]> = vec![0u8; 0x200000]
                .into_boxed_slice()
                .try_into()
                .unwrap();
            Self { bytes }
        }
    }

    impl Ram {
        pub fn read<T: ByteAddressable>(&self, addr: u32) -> T {
            let addr = (addr & OFFSET_MASK) as usize;
            T::from_le_bytes(self.bytes[addr..addr + T::LEN].try_into().unwrap())
        }

        pub fn write<T: ByteAddressable>(&mut self, addr: u32, val: T) {
            let addr = (addr & OFFSET_MASK) as usize;
            self.bytes[addr..addr + T::LEN].copy_from_slice(val.to_le_bytes().as_ref());
        }

        pub fn fill(&mut self, val: u8) {
            self.bytes.fill(val);
        }

        pub fn bytes_mut(&mut self) -> &mut [u8] {
            self.bytes.as_mut_slice()
        }
    }
}

pub mod scratch {
    use super::*;
    pub const PADDR_START: u32 = 0x1F800000;
    pub const PADDR_END: u32 = 0x1F8003FF;

    pub struct Scratch {
        bytes: Box<[u8; 0x400]>,
    }

    impl Default for Scratch {
        fn default() -> Self {
            Self {
                bytes: Box::new([0; 0x400]),
            }
        }
    }

    impl Scratch {
        pub fn read<T: ByteAddressable>(&self, addr: u32) -> T {
            let addr = (addr - PADDR_START) as usize;
            T::from_le_bytes(self.bytes[addr..addr + T::LEN].try_into().unwrap())
        }

        pub fn write<T: ByteAddressable>(&mut self, addr: u32, val: T) {
            let addr = (addr - PADDR_START) as usize;
            self.bytes[addr..addr + T::LEN].copy_from_slice(val.to_le_bytes().as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bios::Bios;
    use super::ram::Ram;

    #[test]
    fn ram_mirrors_alias_the_same_cell() {
        let mut ram = Ram::default();
        ram.write::<u8>(0x1000, 0xAB);

        assert_eq!(ram.read::<u8>(0x1000), 0xAB);
        assert_eq!(ram.read::<u8>(0x201000), 0xAB);
        assert_eq!(ram.read::<u8>(0x401000), 0xAB);
        assert_eq!(ram.read::<u8>(0x601000), 0xAB);
    }

    #[test]
    fn bios_rejects_wrong_image_size() {
        assert!(Bios::from_bytes(vec![0; 1024]).is_err());
        assert!(Bios::from_bytes(vec![0; super::bios::SIZE]).is_ok());
    }

    #[test]
    fn bios_word_patching_round_trips() {
        let mut bios = Bios::from_bytes(vec![0; super::bios::SIZE]).unwrap();
        bios.set_word(0x6F0C, 0x2401_0001);
        assert_eq!(bios.word(0x6F0C), 0x2401_0001);
        assert_eq!(
            bios.read::<u32>(super::bios::PADDR_START + 0x6F0C),
            0x2401_0001
        );
    }
}
