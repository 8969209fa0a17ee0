//! Every condition that stops the machine. None of them are recoverable: the run aborts at the
//! first one, leaving the machine as it was when the fault occurred.

use thiserror::Error;

use crate::bytecode::Word;

#[derive(Error, Debug)]
pub enum UmError {
  /// The top four bits of an instruction word name no operation.
  #[error("invalid opcode {opcode} in instruction word {word:#010x}")]
  InvalidOpcode { word: Word, opcode: Word },

  #[error("program counter {pc} is outside segment 0 ({len} words)")]
  ProgramCounterOutOfBounds { pc: Word, len: usize },

  #[error("offset {offset} is outside segment {id} ({len} words)")]
  OffsetOutOfBounds { id: Word, offset: Word, len: usize },

  /// The identifier names no live segment: never mapped, or already unmapped.
  #[error("segment {id} is not mapped")]
  UnmappedSegment { id: Word },

  #[error("cannot allocate a segment of {len} words")]
  OutOfMemory { len: usize },

  /// Segment 0 holds the running program and is only ever replaced.
  #[error("segment 0 cannot be unmapped")]
  UnmapProgramSegment,

  #[error("division by zero at instruction {pc}")]
  DivisionByZero { pc: Word },

  #[error("cannot output {value}: only values 0 through 255 are characters")]
  OutputOutOfRange { value: Word },

  /// A program file is a whole number of 32 bit words.
  #[error("program is {len} bytes, which is not a whole number of words")]
  TruncatedProgram { len: usize },

  #[error("assembly error on line {line}: {message}")]
  Assembly { line: u32, message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}
