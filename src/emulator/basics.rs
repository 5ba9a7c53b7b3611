pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 240;
pub const MEMORY_SIZE: usize = 0x80_0000;
pub const LOAD_OFFSET: usize = 0x10_0000;
pub const RESET_VECTOR: u32 = 0x8030_0000;
pub const REGISTER_COUNT: usize = 32;
pub const INSTRUCTION_WIDTH: u32 = 4;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Address(pub u32);

impl Address {
    /// Moves to the next instruction word, wrapping at the top of the
    /// address space.
    pub fn incr(&mut self) {
        self.0 = self.0.wrapping_add(INSTRUCTION_WIDTH);
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Register(pub u8);

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_address_incr() {
        let mut addr = Address(0x100);
        addr.incr();
        assert_eq!(addr, Address(0x104));
    }

    #[test]
    fn test_address_incr_wraps() {
        let mut addr = Address(u32::MAX - 1);
        addr.incr();
        assert_eq!(addr, Address(2));
    }
}
