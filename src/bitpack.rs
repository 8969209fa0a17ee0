//! Unsigned bit fields within a 32 bit word. Fields are named by their width and the position
//! of their least significant bit, with bit 0 the least significant bit of the word.

use crate::bytecode::Word;

const WORD_BITS: u32 = Word::BITS;

/// A mask of `width` low bits. Widths of 0 and 32 are both legal.
fn mask(width: u32) -> Word {
  match width >= WORD_BITS {
    true  => Word::MAX,
    false => (1 << width) - 1
  }
}

/// Does `value` fit in an unsigned field `width` bits wide?
pub fn fitsu(width: u32, value: Word) -> bool {
  value & !mask(width) == 0
}

/// Extracts the unsigned field `width` bits wide whose least significant bit is `lsb`.
pub fn getu(word: Word, width: u32, lsb: u32) -> Word {
  assert!(width + lsb <= WORD_BITS, "field {}@{} does not fit in a word", width, lsb);
  match width {
    0 => 0,
    _ => (word >> lsb) & mask(width)
  }
}

/**
  Returns a copy of `word` with the field `width` bits wide at `lsb` replaced by `value`.

  Panics if `value` does not fit in the field. The callers are the encoder and the assembler,
  both of which range check their operands first.
*/
pub fn newu(word: Word, width: u32, lsb: u32, value: Word) -> Word {
  assert!(width + lsb <= WORD_BITS, "field {}@{} does not fit in a word", width, lsb);
  assert!(fitsu(width, value), "{} does not fit in {} bits", value, width);
  match width {
    0 => word,
    _ => {
      let field = mask(width) << lsb;
      (word & !field) | (value << lsb)
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_top_nibble(){
    assert_eq!(getu(0xD000_0000, 4, 28), 13);
    assert_eq!(getu(0x7FFF_FFFF, 4, 28), 7);
  }

  #[test]
  fn get_whole_word(){
    assert_eq!(getu(0xDEAD_BEEF, 32, 0), 0xDEAD_BEEF);
    assert_eq!(getu(0xDEAD_BEEF, 0, 0), 0);
  }

  #[test]
  fn new_replaces_only_the_field(){
    let word = newu(0xFFFF_FFFF, 3, 6, 0);
    assert_eq!(word, 0xFFFF_FE3F);
    assert_eq!(newu(word, 3, 6, 5), 0xFFFF_FF7F);
  }

  #[test]
  fn fits(){
    assert!(fitsu(25, (1 << 25) - 1));
    assert!(!fitsu(25, 1 << 25));
    assert!(fitsu(32, Word::MAX));
  }

  #[test]
  #[should_panic]
  fn new_rejects_wide_values(){
    newu(0, 3, 0, 8);
  }
}
