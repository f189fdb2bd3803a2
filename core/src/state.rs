use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("save state ended early")]
    UnexpectedEof,
    #[error("save state holds a string that is not utf-8")]
    InvalidString,
}

enum Mode {
    Save,
    Load,
}

/// Bidirectional save-state visitor: the same `do_*` call sequence either
/// appends to the buffer or consumes it, so state order is fixed by
/// construction. Everything is little-endian.
pub struct StateWrapper {
    mode: Mode,
    data: Vec<u8>,
    pos: usize,
}

macro_rules! do_primitive {
    ($name:ident, $int:ty) => {
        pub fn $name(&mut self, value: &mut $int) -> Result<(), StateError> {
            match self.mode {
                Mode::Save => {
                    self.data.extend_from_slice(&value.to_le_bytes());
                }
                Mode::Load => {
                    let bytes = self.take(size_of::<$int>())?;
                    *value = <$int>::from_le_bytes(bytes.try_into().unwrap());
                }
            }
            Ok(())
        }
    };
}

impl StateWrapper {
    pub fn for_save() -> Self {
        Self {
            mode: Mode::Save,
            data: Vec::new(),
            pos: 0,
        }
    }

    pub fn for_load(data: Vec<u8>) -> Self {
        Self {
            mode: Mode::Load,
            data,
            pos: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.mode, Mode::Load)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn take(&mut self, len: usize) -> Result<&[u8], StateError> {
        if self.data.len() - self.pos < len {
            return Err(StateError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    do_primitive!(do_u8, u8);
    do_primitive!(do_u16, u16);
    do_primitive!(do_u32, u32);
    do_primitive!(do_u64, u64);
    do_primitive!(do_i32, i32);

    pub fn do_bool(&mut self, value: &mut bool) -> Result<(), StateError> {
        let mut byte = *value as u8;
        self.do_u8(&mut byte)?;
        *value = byte != 0;
        Ok(())
    }

    pub fn do_bytes(&mut self, bytes: &mut [u8]) -> Result<(), StateError> {
        match self.mode {
            Mode::Save => {
                self.data.extend_from_slice(bytes);
            }
            Mode::Load => {
                let len = bytes.len();
                bytes.copy_from_slice(self.take(len)?);
            }
        }
        Ok(())
    }

    pub fn do_i32_array<const N: usize>(
        &mut self,
        values: &mut [i32; N],
    ) -> Result<(), StateError> {
        for value in values {
            self.do_i32(value)?;
        }
        Ok(())
    }

    /// Strings are a u32 byte length followed by the bytes.
    pub fn do_string(&mut self, value: &mut String) -> Result<(), StateError> {
        match self.mode {
            Mode::Save => {
                let mut len = value.len() as u32;
                self.do_u32(&mut len)?;
                self.data.extend_from_slice(value.as_bytes());
            }
            Mode::Load => {
                let mut len = 0u32;
                self.do_u32(&mut len)?;
                let bytes = self.take(len as usize)?;
                *value =
                    String::from_utf8(bytes.to_vec()).map_err(|_| StateError::InvalidString)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_buffer_is_an_eof_error() {
        let mut sw = StateWrapper::for_load(vec![0xAB, 0xCD]);
        let mut word = 0u32;
        assert_eq!(sw.do_u32(&mut word), Err(StateError::UnexpectedEof));
    }

    proptest! {
        #[test]
        fn primitives_round_trip(a: u8, b: u16, c: u32, d: i32, e: bool, s in "\\PC*") {
            let mut sw = StateWrapper::for_save();
            let (mut wa, mut wb, mut wc, mut wd, mut we) = (a, b, c, d, e);
            let mut string = s.clone();
            sw.do_u8(&mut wa).unwrap();
            sw.do_u16(&mut wb).unwrap();
            sw.do_u32(&mut wc).unwrap();
            sw.do_i32(&mut wd).unwrap();
            sw.do_bool(&mut we).unwrap();
            sw.do_string(&mut string).unwrap();

            let mut sw = StateWrapper::for_load(sw.into_bytes());
            let (mut ra, mut rb, mut rc, mut rd, mut re) = (0u8, 0u16, 0u32, 0i32, false);
            let mut rs = String::new();
            sw.do_u8(&mut ra).unwrap();
            sw.do_u16(&mut rb).unwrap();
            sw.do_u32(&mut rc).unwrap();
            sw.do_i32(&mut rd).unwrap();
            sw.do_bool(&mut re).unwrap();
            sw.do_string(&mut rs).unwrap();

            prop_assert_eq!((ra, rb, rc, rd, re), (a, b, c, d, e));
            prop_assert_eq!(rs, s);
        }
    }
}
