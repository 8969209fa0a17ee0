/*!
  This module is responsible for the encoding and decoding of binary instructions, and for
  converting whole programs to and from their on-disk byte form.
*/

use super::{Operation, Instruction, Word};
use crate::bitpack;
use crate::error::UmError;
use crate::register::Register;

// If you change these you must also change the format descriptions in `bytecode`.
const WORD_BITS      : u32 = Word::BITS;
const OPCODE_WIDTH   : u32 = 4;
const OPCODE_LSB     : u32 = WORD_BITS - OPCODE_WIDTH;
const REGISTER_WIDTH : u32 = 3;
const A_LSB          : u32 = 6;
const B_LSB          : u32 = 3;
const C_LSB          : u32 = 0;
const VALUE_A_LSB    : u32 = OPCODE_LSB - REGISTER_WIDTH;
pub const VALUE_WIDTH: u32 = 25;

pub const BYTES_PER_WORD: usize = (WORD_BITS / 8) as usize;

fn register_at(word: Word, lsb: u32) -> Register {
  Register::new(bitpack::getu(word, REGISTER_WIDTH, lsb) as usize)
}

/// Decodes one instruction word. Fails only if the opcode is not one of the fourteen defined.
pub fn try_decode_instruction(word: Word) -> Result<Instruction, UmError> {
  let code   = bitpack::getu(word, OPCODE_WIDTH, OPCODE_LSB);
  let opcode = match Operation::try_from(code as u8) {
    Ok(opcode) => opcode,
    Err(_e)    => return Err(UmError::InvalidOpcode { word, opcode: code })
  };

  let instruction =
    match opcode {
      Operation::LoadValue => {
        // [OpCode:4][A:3][Value:25]
        Instruction::LoadValue {
          a     : register_at(word, VALUE_A_LSB),
          value : bitpack::getu(word, VALUE_WIDTH, 0)
        }
      }
      _ => {
        // [OpCode:4][Unused:19][A:3][B:3][C:3]
        Instruction::ThreeRegister {
          opcode,
          a : register_at(word, A_LSB),
          b : register_at(word, B_LSB),
          c : register_at(word, C_LSB)
        }
      }
    };

  Ok(instruction)
}

/**
  Encodes the instruction into a word. Unused bits are zero.

  Panics if a `LoadValue` carries a value wider than 25 bits. The assembler range checks
  immediates before building instructions.
*/
pub fn encode_instruction(instruction: Instruction) -> Word {
  match instruction {

    Instruction::LoadValue { a, value } => {
      let word = bitpack::newu(0, OPCODE_WIDTH, OPCODE_LSB, Operation::LoadValue.code() as Word);
      let word = bitpack::newu(word, REGISTER_WIDTH, VALUE_A_LSB, a.idx() as Word);
      bitpack::newu(word, VALUE_WIDTH, 0, value)
    }

    Instruction::ThreeRegister { opcode, a, b, c } => {
      let word = bitpack::newu(0, OPCODE_WIDTH, OPCODE_LSB, opcode.code() as Word);
      let word = bitpack::newu(word, REGISTER_WIDTH, A_LSB, a.idx() as Word);
      let word = bitpack::newu(word, REGISTER_WIDTH, B_LSB, b.idx() as Word);
      bitpack::newu(word, REGISTER_WIDTH, C_LSB, c.idx() as Word)
    }

  }
}

/// Does `value` fit in the immediate field of a `LoadValue`?
pub fn fits_immediate(value: Word) -> bool {
  bitpack::fitsu(VALUE_WIDTH, value)
}

/// Splits a program file into big-endian words, first byte most significant.
pub fn read_program(bytes: &[u8]) -> Result<Vec<Word>, UmError> {
  if bytes.len() % BYTES_PER_WORD != 0 {
    return Err(UmError::TruncatedProgram { len: bytes.len() });
  }
  let words =
    bytes.chunks_exact(BYTES_PER_WORD)
         .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
         .collect();
  Ok(words)
}

/// The inverse of `read_program`.
pub fn write_program(words: &[Word]) -> Vec<u8> {
  words.iter()
       .flat_map(|word| word.to_be_bytes())
       .collect()
}


#[cfg(test)]
mod tests {
  use super::*;

  fn r(idx: usize) -> Register {
    Register::new(idx)
  }

  #[test]
  fn decode_three_register(){
    // add r3, r1, r2
    let word = 0x3000_0000 | (3 << 6) | (1 << 3) | 2;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::three_register(Operation::Add, r(3), r(1), r(2))
    );
  }

  #[test]
  fn decode_ignores_unused_bits(){
    let word = 0x3000_0000 | 0x0FFF_FE00 | (3 << 6) | (1 << 3) | 2;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::three_register(Operation::Add, r(3), r(1), r(2))
    );
  }

  #[test]
  fn decode_load_value(){
    // loadval r7, 2^25 - 1
    let word = 0xD000_0000 | (7 << 25) | 0x01FF_FFFF;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::load_value(r(7), 0x01FF_FFFF)
    );
  }

  #[test]
  fn decode_halt(){
    assert_eq!(try_decode_instruction(0x7000_0000).unwrap().opcode(), Operation::Halt);
    assert_eq!(try_decode_instruction(0x7FFF_FFFF).unwrap().opcode(), Operation::Halt);
  }

  #[test]
  fn decode_invalid_opcodes(){
    for code in 14..16u32 {
      let word = code << 28 | 0x1234;
      match try_decode_instruction(word) {
        Err(UmError::InvalidOpcode { word: w, opcode }) => {
          assert_eq!(w, word);
          assert_eq!(opcode, code);
        }
        other => panic!("expected an invalid opcode, got {:?}", other)
      }
    }
  }

  #[test]
  fn encode_layout(){
    assert_eq!(encode_instruction(Instruction::halt()), 0x7000_0000);
    assert_eq!(
      encode_instruction(Instruction::load_value(r(1), 97)),
      0xD000_0000 | (1 << 25) | 97
    );
    assert_eq!(
      encode_instruction(Instruction::three_register(Operation::SegmentStore, r(1), r(2), r(3))),
      0x2000_0000 | (1 << 6) | (2 << 3) | 3
    );
  }

  #[test]
  #[should_panic]
  fn encode_wide_immediate(){
    encode_instruction(Instruction::load_value(r(0), 1 << 25));
  }

  #[test]
  fn immediates(){
    assert!(fits_immediate(33_554_431));
    assert!(!fits_immediate(33_554_432));
  }

  #[test]
  fn program_bytes_are_big_endian(){
    let words = read_program(&[0xD2, 0x00, 0x00, 0x61, 0x70, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(words, vec![0xD200_0061, 0x7000_0000]);
    assert_eq!(write_program(&words), vec![0xD2, 0x00, 0x00, 0x61, 0x70, 0x00, 0x00, 0x00]);
  }

  #[test]
  fn empty_program(){
    assert!(read_program(&[]).unwrap().is_empty());
  }

  #[test]
  fn truncated_program(){
    assert!(matches!(
      read_program(&[0x70, 0x00, 0x00]),
      Err(UmError::TruncatedProgram { len: 3 })
    ));
  }
}
