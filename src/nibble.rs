use std::fmt;
use std::ops::{Index, IndexMut};

/// A 4-bit unsigned integer (nibble).
///
/// Register indices and keypad keys are both nibbles, so indexing a
/// 16-element array with a `u4` can never go out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub struct u4(u8);

impl u4 {
    /// The flag register VF.
    pub const FLAG: u4 = u4(0xF);

    /// Creates a new `u4` from a `u8`.
    ///
    /// Panics if the value is greater than 0x0F.
    pub const fn new(value: u8) -> Self {
        assert!(value <= 0x0F, "u4 value must be in range 0x0-0xF");
        Self(value)
    }

    /// Keeps only the low four bits of `value`.
    pub const fn low(value: u8) -> Self {
        Self(value & 0x0F)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for u4 {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= 0x0F { Ok(Self(value)) } else { Err(value) }
    }
}

impl From<u4> for usize {
    fn from(v: u4) -> usize {
        v.0 as usize
    }
}

impl From<u4> for u8 {
    fn from(v: u4) -> u8 {
        v.0
    }
}

impl fmt::Display for u4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl<T> Index<u4> for [T; 16] {
    type Output = T;

    fn index(&self, index: u4) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<u4> for [T; 16] {
    fn index_mut(&mut self, index: u4) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_masks_high_bits() {
        assert_eq!(u4::low(0xAB).get(), 0xB);
        assert_eq!(u4::low(0x0F), u4::FLAG);
    }

    #[test]
    fn try_from_rejects_wide_values() {
        assert_eq!(u4::try_from(0x0Cu8), Ok(u4::new(0xC)));
        assert_eq!(u4::try_from(0x10u8), Err(0x10));
    }

    #[test]
    #[should_panic]
    fn new_panics_on_wide_value() {
        let _ = u4::new(0x10);
    }

    #[test]
    fn indexes_sixteen_element_arrays() {
        let mut regs = [0u8; 16];
        regs[u4::new(3)] = 7;
        assert_eq!(regs[3], 7);
        assert_eq!(regs[u4::new(3)], 7);
        assert_eq!(format!("V{}", u4::new(0xA)), "VA");
    }
}
