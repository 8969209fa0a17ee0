/*!

  The VM uses a 32 bit word. Every instruction is exactly one word, and a program is a sequence
  of words stored big-endian: the first byte of each group of four is the most significant.
  Bits are numbered from 0, the least significant, to 31. There are two instruction formats,
  told apart by the opcode in the top four bits.

  Three register instructions (every opcode but 13):

    Bits 31-28: Opcode
    Bits 27-9:  Unused
    Bits 8-6:   Register A
    Bits 5-3:   Register B
    Bits 2-0:   Register C

  Load value (opcode 13):

    Bits 31-28: Opcode
    Bits 27-25: Register A
    Bits 24-0:  Unsigned value

  Opcodes 14 and 15 are not instructions, and decoding a word carrying one fails.

  The `Operation` enum names the opcode alone, while `Instruction` carries the decoded operands
  as one variant per format. Halt decodes as a three register instruction whose operands are
  never read.

*/

mod binary;
mod instruction;
mod assembly;

pub type Word = u32;

pub use binary::{encode_instruction, try_decode_instruction, fits_immediate, read_program,
                 write_program, VALUE_WIDTH};
pub use instruction::{Instruction, Operation, Shape};
pub use assembly::{assemble, assemble_with_symbols, disassemble, disassemble_with_symbols};
