//! Structures and functions for the Universal Virtual Machine: eight registers, a segmented
//! memory whose segment 0 is the running program, and a byte stream in each direction.

use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Read, Write};

use prettytable::{format as TableFormat, Table};

use crate::bytecode::*;
use crate::error::UmError;
use crate::register::{Register, RegisterFile};
use crate::segment::{SegmentStore, PROGRAM_SEGMENT};

/// The value an input instruction stores once the input stream is exhausted.
pub const END_OF_INPUT: Word = Word::MAX;

/// The largest value an output instruction will write.
pub const MAX_OUTPUT: Word = u8::MAX as Word;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Status {
  Running,
  Halted,
}

pub struct UVM<R: Read, W: Write> {

  // Flags
  status  : Status,
  ncycles : u64,    // Instructions executed so far

  // Memory Store
  segments : SegmentStore,

  // Registers //
  pc        : Word,         // Program counter, an index into segment 0
  registers : RegisterFile,

  // Streams //
  input  : R,
  output : W,

}

impl<R: Read, W: Write> UVM<R, W> {

  // region Display methods

  fn make_table<I>(titles: (&str, &str), rows: I) -> Table
    where I: Iterator<Item = (String, String)>
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->titles.0, ubl->titles.1]);

    for (name, contents) in rows {
      table.add_row(row![r->format!("{} =", name), contents]);
    }
    table
  }

  fn register_table(&self) -> Table {
    UVM::<R, W>::make_table(
      ("Register", "Contents"),
      self.registers
          .iter()
          .map(|(register, value)| (register.to_string(), format!("{:#010x} {:>10}", value, value)))
    )
  }

  fn segment_table(&self) -> Table {
    UVM::<R, W>::make_table(
      ("Segment", "Contents"),
      self.segments
          .iter()
          .map(|(id, segment)| (format!("m[{}]", id), segment.to_string()))
    )
  }

  /// The instruction at the program counter, if there is one.
  fn next_instruction_text(&self) -> String {
    match self.segments.program().get(self.pc) {
      None       => "<out of bounds>".to_string(),
      Some(word) => match try_decode_instruction(word) {
        Ok(instruction) => instruction.to_string(),
        Err(e)          => e.to_string()
      }
    }
  }

  // endregion

  // region Low-level utility methods

  /// A machine whose segment 0 holds `program`, with every register zero and the program
  /// counter at the first word.
  pub fn new(program: Vec<Word>, input: R, output: W) -> UVM<R, W> {
    UVM {
      status    : Status::Running,
      ncycles   : 0,
      segments  : SegmentStore::new(program),
      pc        : 0,
      registers : RegisterFile::new(),
      input,
      output,
    }
  }

  pub fn status(&self) -> Status {
    self.status
  }

  pub fn pc(&self) -> Word {
    self.pc
  }

  pub fn ncycles(&self) -> u64 {
    self.ncycles
  }

  pub fn registers(&self) -> &RegisterFile {
    &self.registers
  }

  pub fn segments(&self) -> &SegmentStore {
    &self.segments
  }

  pub fn output(&self) -> &W {
    &self.output
  }

  fn reg(&self, register: Register) -> Word {
    self.registers.get(register)
  }

  fn set_reg(&mut self, register: Register, value: Word) {
    self.registers.set(register, value);
  }

  fn fetch(&self) -> Result<Word, UmError> {
    let program = self.segments.program();
    program.get(self.pc)
           .ok_or(UmError::ProgramCounterOutOfBounds { pc: self.pc, len: program.len() })
  }

  /// Reads one byte, or `END_OF_INPUT` if there are none left.
  fn read_byte(&mut self) -> Result<Word, UmError> {
    let mut buffer = [0u8; 1];
    loop {
      match self.input.read(&mut buffer) {
        Ok(0)                                       => return Ok(END_OF_INPUT),
        Ok(_)                                       => return Ok(buffer[0] as Word),
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e)                                      => return Err(e.into()),
      }
    }
  }

  // endregion

  // region Execution

  /// Runs until a halt instruction executes or a fault occurs. The output stream is flushed
  /// either way.
  pub fn run(&mut self) -> Result<(), UmError> {
    let mut result = Ok(());
    while self.status == Status::Running {
      if let Err(e) = self.step() {
        result = Err(e);
        break;
      }
    }
    self.output.flush()?;
    result
  }

  /**
    Fetches, decodes, and executes the instruction at the program counter. Every instruction
    but halt and load program leaves the program counter at the next word; load program sets it
    to the target, and halt leaves it where it is.

    Stepping a halted machine does nothing.
  */
  pub fn step(&mut self) -> Result<Status, UmError> {
    if self.status == Status::Halted {
      return Ok(Status::Halted);
    }

    let word        = self.fetch()?;
    let instruction = try_decode_instruction(word)?;

    #[cfg(feature = "trace_computation")] eprintln!("{:>8}: {}", self.pc, instruction);

    self.ncycles += 1;
    match instruction {

      Instruction::LoadValue { a, value } => {
        self.set_reg(a, value);
      }

      Instruction::ThreeRegister { opcode, a, b, c } => {
        match opcode {

          Operation::ConditionalMove => {
            if self.reg(c) != 0 {
              self.set_reg(a, self.reg(b));
            }
          }

          Operation::SegmentLoad => {
            let value = self.segments.read_word(self.reg(b), self.reg(c))?;
            self.set_reg(a, value);
          }

          Operation::SegmentStore => {
            let (id, offset, value) = (self.reg(a), self.reg(b), self.reg(c));
            self.segments.write_word(id, offset, value)?;
          }

          Operation::Add => {
            self.set_reg(a, self.reg(b).wrapping_add(self.reg(c)));
          }

          Operation::Multiply => {
            self.set_reg(a, self.reg(b).wrapping_mul(self.reg(c)));
          }

          Operation::Divide => {
            let quotient = self.reg(b)
                               .checked_div(self.reg(c))
                               .ok_or(UmError::DivisionByZero { pc: self.pc })?;
            self.set_reg(a, quotient);
          }

          Operation::Nand => {
            self.set_reg(a, !(self.reg(b) & self.reg(c)));
          }

          Operation::Halt => {
            self.status = Status::Halted;
            return Ok(self.status);
          }

          Operation::MapSegment => {
            let len = self.reg(c);
            let id  = self.segments.allocate(len)?;
            self.set_reg(b, id);
          }

          Operation::UnmapSegment => {
            let id = self.reg(c);
            self.segments.deallocate(id)?;
          }

          Operation::Output => {
            let value = self.reg(c);
            if value > MAX_OUTPUT {
              return Err(UmError::OutputOutOfRange { value });
            }
            self.output.write_all(&[value as u8])?;
          }

          Operation::Input => {
            // Anything already written should be visible before we wait on input.
            self.output.flush()?;
            let value = self.read_byte()?;
            self.set_reg(c, value);
          }

          Operation::LoadProgram => {
            let id = self.reg(b);
            if id != PROGRAM_SEGMENT {
              self.segments.replace_program(id)?;
            }
            self.pc = self.reg(c);
            return Ok(self.status);
          }

          Operation::LoadValue => {
            unreachable!("load value always decodes to `Instruction::LoadValue`")
          }

        } // end match opcode
      }

    } // end match instruction

    self.pc = self.pc.wrapping_add(1);
    Ok(self.status)
  }

  // endregion

}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<R: Read, W: Write> Display for UVM<R, W> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let r_table = self.register_table();
    let m_table = self.segment_table();

    let mut combined_table = table!([r_table, m_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Segments"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(
      f,
      "Status: {}\tpc: {}\tnext: {}\tcycles: {}\tfree ids: {}\n{}",
      self.status,
      self.pc,
      self.next_instruction_text(),
      self.ncycles,
      self.segments.free_count(),
      combined_table
    )
  }
}

impl Display for Status {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Status::Running => {
        write!(f, "Running")
      },
      Status::Halted => {
        write!(f, "Halted")
      }
    }
  }
}
