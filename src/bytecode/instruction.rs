use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::bytecode::Word;
use crate::register::Register;

/**
  Opcodes of the virtual machine. The discriminant of each variant is its opcode, the value of
  the top four bits of an instruction word, so the order the variants are listed in is
  significant. The strum serializations are the assembly mnemonics.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[repr(u8)]
pub enum Operation {
  #[strum(serialize = "cmov")]    ConditionalMove, // if C != 0 { A := B }
  #[strum(serialize = "sload")]   SegmentLoad,     // A := m[B][C]
  #[strum(serialize = "sstore")]  SegmentStore,    // m[A][B] := C
  #[strum(serialize = "add")]     Add,             // A := B + C
  #[strum(serialize = "mul")]     Multiply,        // A := B * C
  #[strum(serialize = "div")]     Divide,          // A := B / C
  #[strum(serialize = "nand")]    Nand,            // A := !(B & C)
  #[strum(serialize = "halt")]    Halt,
  #[strum(serialize = "map")]     MapSegment,      // B := new segment of C words
  #[strum(serialize = "unmap")]   UnmapSegment,    // unmap segment C
  #[strum(serialize = "out")]     Output,          // write C
  #[strum(serialize = "in")]      Input,           // read into C
  #[strum(serialize = "loadp")]   LoadProgram,     // m[0] := copy of m[B]; pc := C
  #[strum(serialize = "loadval")] LoadValue,       // A := value
}

/// Which operand fields an operation reads. The assembler only asks for, and the disassembler
/// only prints, the fields in an operation's shape.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Shape {
  /// `op rA, rB, rC`
  Abc,
  /// `op rB, rC`
  Bc,
  /// `op rC`
  C,
  /// `op`
  Nullary,
  /// `op rA, value`
  Immediate,
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn mnemonic(&self) -> &'static str {
    self.into()
  }

  pub fn shape(&self) -> Shape {
    match self {
      | Operation::ConditionalMove
      | Operation::SegmentLoad
      | Operation::SegmentStore
      | Operation::Add
      | Operation::Multiply
      | Operation::Divide
      | Operation::Nand          => Shape::Abc,

      | Operation::MapSegment
      | Operation::LoadProgram   => Shape::Bc,

      | Operation::UnmapSegment
      | Operation::Output
      | Operation::Input         => Shape::C,

      Operation::Halt            => Shape::Nullary,
      Operation::LoadValue       => Shape::Immediate,
    }
  }
}


/// Holds the unencoded components of an instruction. The two variants are the two instruction
/// formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// [OpCode:4][Unused:19][A:3][B:3][C:3]
  ThreeRegister {
    opcode : Operation,
    a      : Register,
    b      : Register,
    c      : Register
  },
  /// [OpCode:4][A:3][Value:25]
  LoadValue {
    a     : Register,
    value : Word
  },
}

impl Instruction {
  /// Panics if `opcode` is `LoadValue`, which has its own format.
  pub fn three_register(opcode: Operation, a: Register, b: Register, c: Register) -> Instruction {
    assert!(opcode != Operation::LoadValue, "loadval is not a three register instruction");
    Instruction::ThreeRegister { opcode, a, b, c }
  }

  pub fn load_value(a: Register, value: Word) -> Instruction {
    Instruction::LoadValue { a, value }
  }

  pub fn halt() -> Instruction {
    let r0 = Register::new(0);
    Instruction::three_register(Operation::Halt, r0, r0, r0)
  }

  pub fn opcode(&self) -> Operation {
    match self {
      Instruction::ThreeRegister { opcode, .. } => *opcode,
      Instruction::LoadValue { .. }             => Operation::LoadValue,
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::LoadValue { a, value } => {
        write!(f, "{} {}, {}", Operation::LoadValue, a, value)
      }

      Instruction::ThreeRegister { opcode, a, b, c } => {
        match opcode.shape() {
          Shape::Abc       => write!(f, "{} {}, {}, {}", opcode, a, b, c),
          Shape::Bc        => write!(f, "{} {}, {}", opcode, b, c),
          Shape::C         => write!(f, "{} {}", opcode, c),
          | Shape::Nullary
          | Shape::Immediate => write!(f, "{}", opcode),
        }
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn opcodes_are_positions(){
    assert_eq!(Operation::ConditionalMove.code(), 0);
    assert_eq!(Operation::Halt.code(), 7);
    assert_eq!(Operation::LoadProgram.code(), 12);
    assert_eq!(Operation::LoadValue.code(), 13);
    assert_eq!(Operation::iter().count(), 14);
  }

  #[test]
  fn from_number(){
    assert_eq!(Operation::try_from(6u8).unwrap(), Operation::Nand);
    assert!(Operation::try_from(14u8).is_err());
    assert!(Operation::try_from(15u8).is_err());
  }

  #[test]
  fn mnemonics_round_trip(){
    for operation in Operation::iter() {
      assert_eq!(Operation::from_str(operation.mnemonic()).unwrap(), operation);
    }
    assert!(Operation::from_str("jump").is_err());
  }

  #[test]
  #[should_panic(expected = "not a three register instruction")]
  fn load_value_has_its_own_format(){
    let r1 = Register::new(1);
    Instruction::three_register(Operation::LoadValue, r1, r1, r1);
  }

  #[test]
  fn display(){
    let (r1, r2, r3) = (Register::new(1), Register::new(2), Register::new(3));
    assert_eq!(
      format!("{}", Instruction::three_register(Operation::Add, r3, r1, r2)),
      "add r3, r1, r2"
    );
    assert_eq!(
      format!("{}", Instruction::three_register(Operation::MapSegment, r3, r1, r2)),
      "map r1, r2"
    );
    assert_eq!(
      format!("{}", Instruction::three_register(Operation::Output, r3, r1, r2)),
      "out r2"
    );
    assert_eq!(format!("{}", Instruction::halt()), "halt");
    assert_eq!(format!("{}", Instruction::load_value(r1, 97)), "loadval r1, 97");
  }
}
