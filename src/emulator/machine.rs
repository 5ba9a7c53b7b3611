use super::basics::{Address, Register, REGISTER_COUNT};
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("image of {len} bytes at offset {offset:#x} exceeds memory of {capacity:#x} bytes")]
    OutOfBounds {
        len: usize,
        offset: usize,
        capacity: usize,
    },
}

/// Processor state of the emulated machine: program counter, register file
/// and main memory.
#[derive(Debug)]
pub struct MachineState {
    pub(crate) program_counter: Address,
    registers: [u32; REGISTER_COUNT],
    memory: Box<[u8]>,
    load_offset: usize,
}

impl MachineState {
    pub fn new(memory_size: usize, load_offset: usize, reset_pc: u32) -> MachineState {
        MachineState {
            program_counter: Address(reset_pc),
            registers: [0; REGISTER_COUNT],
            memory: vec![0; memory_size].into_boxed_slice(),
            load_offset,
        }
    }

    pub fn program_counter(&self) -> Address {
        self.program_counter
    }

    /// Mutable access to one general-purpose register, for execution units.
    pub fn register_mut(&mut self, reg: Register) -> Option<&mut u32> {
        self.registers.get_mut(reg.0 as usize)
    }

    pub fn registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.registers
    }

    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    pub fn load_offset(&self) -> usize {
        self.load_offset
    }

    /// Returns a copy of the given memory range, or `None` if it reaches
    /// past the end of memory.
    pub fn read_memory(&self, range: Range<usize>) -> Option<Vec<u8>> {
        self.memory.get(range).map(|bytes| bytes.to_vec())
    }

    /// Copies an image to the load offset. Memory is left untouched when the
    /// image does not fit.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let out_of_bounds = LoadError::OutOfBounds {
            len: image.len(),
            offset: self.load_offset,
            capacity: self.memory.len(),
        };
        let end = match self.load_offset.checked_add(image.len()) {
            Some(end) if end <= self.memory.len() => end,
            _ => return Err(out_of_bounds),
        };
        self.memory[self.load_offset..end].copy_from_slice(image);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_machine() -> MachineState {
        MachineState::new(64, 16, 0x8030_0000)
    }

    #[test]
    fn test_machine_new() {
        let m = small_machine();
        assert_eq!(m.program_counter(), Address(0x8030_0000));
        assert!(m.registers().iter().all(|r| *r == 0));
        assert_eq!(m.memory_size(), 64);
        assert_eq!(m.read_memory(0..64), Some(vec![0; 64]));
    }

    #[test]
    fn test_load_image() {
        let mut m = small_machine();
        m.load_image(&[1, 2, 3, 4]).unwrap();
        assert_eq!(m.read_memory(16..20), Some(vec![1, 2, 3, 4]));
        assert_eq!(m.read_memory(12..16), Some(vec![0; 4]));
        assert_eq!(m.read_memory(20..24), Some(vec![0; 4]));
    }

    #[test]
    fn test_load_image_exact_fit() {
        let mut m = small_machine();
        m.load_image(&[0xAB; 48]).unwrap();
        assert_eq!(m.read_memory(16..64), Some(vec![0xAB; 48]));
    }

    #[test]
    fn test_load_image_out_of_bounds() {
        let mut m = small_machine();
        let result = m.load_image(&[0xAB; 49]);
        match result {
            Err(LoadError::OutOfBounds {
                len,
                offset,
                capacity,
            }) => {
                assert_eq!(len, 49);
                assert_eq!(offset, 16);
                assert_eq!(capacity, 64);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(m.read_memory(0..64), Some(vec![0; 64]));
    }

    #[test]
    fn test_reload_overwrites() {
        let mut m = small_machine();
        m.load_image(&[1, 1, 1, 1]).unwrap();
        m.load_image(&[2, 2]).unwrap();
        assert_eq!(m.read_memory(16..20), Some(vec![2, 2, 1, 1]));
    }

    #[test]
    fn test_read_memory_past_end() {
        let m = small_machine();
        assert_eq!(m.read_memory(60..65), None);
    }

    #[test]
    fn test_register() {
        let mut m = small_machine();
        *m.register_mut(Register(31)).unwrap() = 42;
        assert_eq!(m.registers()[31], 42);
    }

    #[test]
    fn test_register_out_of_range() {
        let mut m = small_machine();
        assert_eq!(m.register_mut(Register(32)), None);
    }
}
