//! The eight general purpose registers and the index type that names them.

use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

use crate::bytecode::Word;

pub const NUM_REGISTERS: usize = 8;

/**
  Names one of the eight registers. A `Register` is always a valid index into a `RegisterFile`:
  the only way to build one from an arbitrary number is `Register::new`, which panics on an out
  of range index. Instruction decoding cannot produce such an index, since register fields are
  three bits wide, so a panic here is a bug in the caller rather than bad program data.
*/
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Register(u8);

impl Register {
  pub fn new(idx: usize) -> Register {
    assert!(idx < NUM_REGISTERS, "register index {} is out of range", idx);
    Register(idx as u8)
  }

  /// Converts the register to an index into the register file.
  pub fn idx(&self) -> usize {
    self.0 as usize
  }

  pub fn all() -> impl Iterator<Item = Register> {
    (0..NUM_REGISTERS).map(Register::new)
  }
}

impl Display for Register {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "r{}", self.0)
  }
}


/// All registers start at zero.
#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct RegisterFile {
  registers: [Word; NUM_REGISTERS]
}

impl RegisterFile {
  pub fn new() -> RegisterFile {
    RegisterFile::default()
  }

  pub fn get(&self, register: Register) -> Word {
    self.registers[register.idx()]
  }

  pub fn set(&mut self, register: Register, value: Word) {
    self.registers[register.idx()] = value;
  }

  pub fn iter(&self) -> impl Iterator<Item = (Register, Word)> + '_ {
    Register::all().zip(self.registers.iter().copied())
  }
}

impl Index<Register> for RegisterFile {
  type Output = Word;

  fn index(&self, register: Register) -> &Word {
    &self.registers[register.idx()]
  }
}

impl IndexMut<Register> for RegisterFile {
  fn index_mut(&mut self, register: Register) -> &mut Word {
    &mut self.registers[register.idx()]
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_zeroed(){
    let registers = RegisterFile::new();
    assert!(registers.iter().all(|(_, value)| value == 0));
    assert_eq!(registers.iter().count(), NUM_REGISTERS);
  }

  #[test]
  fn set_then_get(){
    let mut registers = RegisterFile::new();
    registers.set(Register::new(7), 0xFFFF_FFFF);
    registers[Register::new(3)] = 12;
    assert_eq!(registers.get(Register::new(7)), 0xFFFF_FFFF);
    assert_eq!(registers[Register::new(3)], 12);
    assert_eq!(registers.get(Register::new(0)), 0);
  }

  #[test]
  fn display(){
    assert_eq!(format!("{}", Register::new(5)), "r5");
  }

  #[test]
  #[should_panic]
  fn index_out_of_range(){
    Register::new(8);
  }
}
