/*!
  The human readable textual form of bytecode is called assembly. This module leverages the
  `strum` derives of `Operation` to parse mnemonics, and the `Display` of `Instruction` to print
  them, so the two directions always agree.

  One statement per line, each optionally preceded by a label and followed by a comment:

    ```text
    start:  loadval r1, 'a'    % r1 := 97
            out r1
    end:    halt
            .word 0xDEADBEEF   % raw data
    ```

  The operands an instruction takes are the fields its `Shape` names. A `loadval` value may be
  a decimal or `0x` hexadecimal number, a character literal, or a label, and must fit in 25
  bits. A label is the index of the word it precedes.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::{
    alpha1,
    alphanumeric1,
    anychar,
    char as one_char,
    digit1,
    hex_digit1,
    none_of,
    one_of,
    space0,
    space1
  },
  combinator::{eof, map, map_opt, map_res, opt, recognize, rest},
  multi::{many0, separated_list1},
  sequence::{delimited, pair, preceded, terminated, tuple},
  IResult
};

use super::{encode_instruction, fits_immediate, try_decode_instruction, Instruction, Operation,
            Shape, Word};
use crate::error::UmError;
use crate::register::{Register, NUM_REGISTERS};
use crate::symboltable::SymbolTable;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Operand<'a> {
  /// The number after the `r`, not yet range checked.
  Register(usize),
  Number(Word),
  Label(&'a str),
}

impl<'a> Display for Operand<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Register(idx) => write!(f, "r{}", idx),
      Operand::Number(value) => write!(f, "{}", value),
      Operand::Label(name)   => write!(f, "{}", name),
    }
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Statement<'a> {
  Word(Operand<'a>),
  Operation {
    name     : &'a str,
    operands : Vec<Operand<'a>>
  },
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct ParsedLine<'a> {
  label     : Option<&'a str>,
  statement : Option<Statement<'a>>,
}

// region Parsers

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(
    pair(
      alt((alpha1, tag("_"))),
      many0(alt((alphanumeric1, tag("_"))))
    )
  )(input)
}

fn hexadecimal(input: &str) -> IResult<&str, Word> {
  map_res(
    preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
    |digits: &str| Word::from_str_radix(digits, 16)
  )(input)
}

fn decimal(input: &str) -> IResult<&str, Word> {
  map_res(digit1, |digits: &str| digits.parse::<Word>())(input)
}

fn escape(c: char) -> Option<char> {
  match c {
    'n'  => Some('\n'),
    't'  => Some('\t'),
    'r'  => Some('\r'),
    '0'  => Some('\0'),
    '\\' => Some('\\'),
    '\'' => Some('\''),
    _    => None
  }
}

fn character(input: &str) -> IResult<&str, Word> {
  map(
    delimited(
      one_char('\''),
      alt((
        preceded(one_char('\\'), map_opt(anychar, escape)),
        none_of("\\'")
      )),
      one_char('\'')
    ),
    |c: char| c as Word
  )(input)
}

/// `r` followed only by digits is a register, anything else is a label.
fn classify(name: &str) -> Operand<'_> {
  match name.strip_prefix('r') {
    Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
      Operand::Register(digits.parse::<usize>().unwrap_or(usize::MAX))
    }
    _ => Operand::Label(name)
  }
}

fn operand(input: &str) -> IResult<&str, Operand<'_>> {
  alt((
    map(hexadecimal, Operand::Number),
    map(decimal,     Operand::Number),
    map(character,   Operand::Number),
    map(identifier,  classify)
  ))(input)
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
  alt((
    map(preceded(pair(tag(".word"), space1), operand), Statement::Word),
    map(
      pair(
        identifier,
        opt(preceded(space1, separated_list1(delimited(space0, one_char(','), space0), operand)))
      ),
      |(name, operands)| Statement::Operation { name, operands: operands.unwrap_or_default() }
    )
  ))(input)
}

fn line(input: &str) -> IResult<&str, ParsedLine<'_>> {
  map(
    tuple((
      space0,
      opt(terminated(identifier, preceded(space0, one_char(':')))),
      space0,
      opt(statement),
      space0,
      opt(pair(one_of("%#"), rest)),
      eof
    )),
    |(_, label, _, statement, _, _, _)| ParsedLine { label, statement }
  )(input)
}

// endregion

fn assembly_error(line: u32, message: String) -> UmError {
  UmError::Assembly { line, message }
}

fn expect_register(line: u32, operand: Operand) -> Result<Register, UmError> {
  match operand {
    Operand::Register(idx) if idx < NUM_REGISTERS => Ok(Register::new(idx)),
    Operand::Register(_) => {
      Err(assembly_error(line, format!("there is no register {}", operand)))
    }
    _ => Err(assembly_error(line, format!("expected a register but found `{}`", operand)))
  }
}

fn expect_value(line: u32, operand: Operand, symbols: &SymbolTable) -> Result<Word, UmError> {
  match operand {
    Operand::Number(value) => Ok(value),
    Operand::Label(name) => {
      symbols.get_address(name)
             .ok_or_else(|| assembly_error(line, format!("undefined label `{}`", name)))
    }
    Operand::Register(_) => {
      Err(assembly_error(line, format!("expected a value but found register `{}`", operand)))
    }
  }
}

fn encode_statement(line: u32, statement: &Statement, symbols: &SymbolTable)
  -> Result<Word, UmError>
{
  let (name, operands) = match statement {
    Statement::Word(operand)                  => return expect_value(line, *operand, symbols),
    Statement::Operation { name, operands }   => (*name, operands)
  };

  let operation = Operation::from_str(name).map_err(
    |_e| assembly_error(line, format!("`{}` is not an operation", name))
  )?;
  let wanted = match operation.shape() {
    Shape::Abc       => 3,
    Shape::Bc        => 2,
    Shape::C         => 1,
    Shape::Nullary   => 0,
    Shape::Immediate => 2,
  };
  if operands.len() != wanted {
    return Err(assembly_error(
      line,
      format!(
        "{} requires {} operands but was given {}: ({})",
        operation,
        wanted,
        operands.len(),
        operands.iter()
                .map(Operand::to_string)
                .collect::<Vec<String>>()
                .join(", ")
      )
    ));
  }

  let r0 = Register::new(0);
  let instruction =
    match operation.shape() {

      Shape::Immediate => {
        let a     = expect_register(line, operands[0])?;
        let value = expect_value(line, operands[1], symbols)?;
        if !fits_immediate(value) {
          return Err(assembly_error(line, format!("{} does not fit in 25 bits", value)));
        }
        Instruction::load_value(a, value)
      }

      Shape::Abc => {
        Instruction::three_register(
          operation,
          expect_register(line, operands[0])?,
          expect_register(line, operands[1])?,
          expect_register(line, operands[2])?
        )
      }

      Shape::Bc => {
        Instruction::three_register(
          operation,
          r0,
          expect_register(line, operands[0])?,
          expect_register(line, operands[1])?
        )
      }

      Shape::C => {
        Instruction::three_register(operation, r0, r0, expect_register(line, operands[0])?)
      }

      Shape::Nullary => Instruction::three_register(operation, r0, r0, r0),

    };

  Ok(encode_instruction(instruction))
}

/**
  Assembles program text into instruction words. Labels are resolved in a second pass, so an
  instruction may refer to a label defined after it.
*/
pub fn assemble(text: &str) -> Result<Vec<Word>, UmError> {
  assemble_with_symbols(text).map(|(words, _symbols)| words)
}

/// Like `assemble`, but also returns the labels the text defined.
pub fn assemble_with_symbols(text: &str) -> Result<(Vec<Word>, SymbolTable), UmError> {
  let mut symbols    = SymbolTable::new();
  let mut statements : Vec<(u32, Statement)> = vec![];

  for (idx, text_line) in text.lines().enumerate() {
    let line_number = (idx + 1) as u32;
    let parsed = match line(text_line) {
      Ok((_rest, parsed)) => parsed,
      Err(_e) => {
        return Err(assembly_error(line_number, format!("cannot parse `{}`", text_line.trim())));
      }
    };

    let address = statements.len() as Word;
    if let Some(label) = parsed.label {
      if symbols.insert(label, address).is_err() {
        return Err(assembly_error(line_number, format!("label `{}` is already defined", label)));
      }
    }
    if let Some(statement) = parsed.statement {
      statements.push((line_number, statement));
    }
  }

  let words =
    statements.iter()
              .map(|(line_number, statement)| encode_statement(*line_number, statement, &symbols))
              .collect::<Result<Vec<Word>, UmError>>()?;
  Ok((words, symbols))
}

/// One line of assembly per word. Words that do not decode become `.word` directives.
pub fn disassemble(words: &[Word]) -> Vec<String> {
  disassemble_with_symbols(words, &SymbolTable::new())
}

/// Like `disassemble`, but a word with a label in `symbols` is prefixed with `label: `.
pub fn disassemble_with_symbols(words: &[Word], symbols: &SymbolTable) -> Vec<String> {
  words.iter()
       .enumerate()
       .map(|(address, word)| {
         let text = match try_decode_instruction(*word) {
           Ok(instruction) => format!("{}", instruction),
           Err(_e)         => format!(".word {:#010x}", word)
         };
         match symbols.get_symbol(address as Word) {
           Some(label) => format!("{}: {}", label, text),
           None        => text
         }
       })
       .collect()
}


#[cfg(test)]
mod tests {
  use super::*;

  fn r(idx: usize) -> Register {
    Register::new(idx)
  }

  #[test]
  fn parse_line_parts(){
    let (_, parsed) = line("  loop: add r1, r2,r3   % comment").unwrap();
    assert_eq!(parsed.label, Some("loop"));
    assert_eq!(
      parsed.statement,
      Some(Statement::Operation {
        name: "add",
        operands: vec![Operand::Register(1), Operand::Register(2), Operand::Register(3)]
      })
    );
  }

  #[test]
  fn parse_blank_and_comment_lines(){
    assert_eq!(line("").unwrap().1, ParsedLine { label: None, statement: None });
    assert_eq!(line("   # nothing").unwrap().1, ParsedLine { label: None, statement: None });
    assert_eq!(line("end:").unwrap().1, ParsedLine { label: Some("end"), statement: None });
  }

  #[test]
  fn parse_operands(){
    assert_eq!(operand("0x1F").unwrap().1, Operand::Number(31));
    assert_eq!(operand("97").unwrap().1, Operand::Number(97));
    assert_eq!(operand("'a'").unwrap().1, Operand::Number(97));
    assert_eq!(operand("'\\n'").unwrap().1, Operand::Number(10));
    assert_eq!(operand("r7").unwrap().1, Operand::Register(7));
    assert_eq!(operand("r12").unwrap().1, Operand::Register(12));
    assert_eq!(operand("read").unwrap().1, Operand::Label("read"));
  }

  #[test]
  fn assemble_hello(){
    let words = assemble("loadval r1, 'a'\nout r1\nhalt\n").unwrap();
    assert_eq!(
      words,
      vec![
        encode_instruction(Instruction::load_value(r(1), 97)),
        encode_instruction(Instruction::three_register(Operation::Output, r(0), r(0), r(1))),
        encode_instruction(Instruction::halt())
      ]
    );
  }

  #[test]
  fn short_forms_fill_the_right_fields(){
    let words = assemble("map r2, r3\nloadp r4, r5\nunmap r6\nin r7").unwrap();
    assert_eq!(words[0], 0x8000_0000 | (2 << 3) | 3);
    assert_eq!(words[1], 0xC000_0000 | (4 << 3) | 5);
    assert_eq!(words[2], 0x9000_0000 | 6);
    assert_eq!(words[3], 0xB000_0000 | 7);
  }

  #[test]
  fn labels_resolve_forward_and_back(){
    let text = "
      start:
        loadval r1, end
        loadval r2, start
      end:
        halt
    ";
    let words = assemble(text).unwrap();
    assert_eq!(words[0], encode_instruction(Instruction::load_value(r(1), 2)));
    assert_eq!(words[1], encode_instruction(Instruction::load_value(r(2), 0)));
  }

  #[test]
  fn raw_words(){
    let words = assemble(".word 0xDEADBEEF\n.word here\nhere: halt").unwrap();
    assert_eq!(&words[..2], &[0xDEAD_BEEF, 2]);
  }

  fn error_line(text: &str) -> (u32, String) {
    match assemble(text) {
      Err(UmError::Assembly { line, message }) => (line, message),
      other => panic!("expected an assembly error, got {:?}", other)
    }
  }

  #[test]
  fn errors(){
    assert_eq!(error_line("halt\njump r1").0, 2);
    assert!(error_line("jump r1").1.contains("not an operation"));
    assert!(error_line("add r1, r2").1.contains("requires 3 operands"));
    assert!(error_line("out r8").1.contains("no register"));
    assert!(error_line("out 5").1.contains("expected a register"));
    assert!(error_line("loadval r1, r2").1.contains("expected a value"));
    assert!(error_line("loadval r1, nowhere").1.contains("undefined label"));
    assert!(error_line("loadval r1, 33554432").1.contains("25 bits"));
    assert!(error_line("a: halt\na: halt").1.contains("already defined"));
    assert!(error_line("add r1 r2 r3").1.contains("cannot parse"));
    assert!(error_line("halt r1").1.contains("requires 0 operands"));
  }

  #[test]
  fn disassembly_round_trips(){
    let text = "cmov r1, r2, r3\nsload r0, r1, r2\nmap r1, r2\nout r3\nhalt\nloadval r6, 1234";
    let words = assemble(text).unwrap();
    let listing = disassemble(&words);
    assert_eq!(listing.join("\n"), text);
    assert_eq!(assemble(&listing.join("\n")).unwrap(), words);
  }

  #[test]
  fn labelled_disassembly(){
    let text = "top: loadval r1, done\nalso: out r1\nloadp r0, r1\ndone: halt";
    let (words, symbols) = assemble_with_symbols(text).unwrap();
    let listing = disassemble_with_symbols(&words, &symbols);
    assert_eq!(
      listing,
      vec!["top: loadval r1, 3", "also: out r1", "loadp r0, r1", "done: halt"]
    );
    assert_eq!(assemble(&listing.join("\n")).unwrap(), words);
  }

  #[test]
  fn disassemble_invalid_word(){
    assert_eq!(disassemble(&[0xE000_0001]), vec![".word 0xe0000001".to_string()]);
  }
}
