use std::collections::HashMap;

use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::bytecode::Word;

/**
  A symbol table for assembly is a mapping between label names and the index of the word in
  segment 0 that each labels. A symbol table is really just a convenience wrapper around a
  BiMap. Labels on consecutive lines name the same word, so the first label bound to a word
  goes into the BiMap and any later ones are kept aside as aliases, found by name but never
  by address.
*/
pub struct SymbolTable {
  table   : BiMap<DefaultAtom, Word>,
  aliases : HashMap<DefaultAtom, Word>,
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable{
      table   : BiMap::new(),
      aliases : HashMap::new(),
    }
  }

  pub fn get_symbol(&self, address: Word) -> Option<DefaultAtom> {
    self.table.get_by_right(&address).cloned()
  }

  pub fn get_address(&self, label: &str) -> Option<Word> {
    let label = DefaultAtom::from(label);
    self.table
        .get_by_left(&label)
        .or_else(|| self.aliases.get(&label))
        .copied()
  }

  /// Binds `label` to `address`. Fails, returning the pair, if the label is already bound.
  pub fn insert(&mut self, label: &str, address: Word) -> Result<(), (DefaultAtom, Word)> {
    let label = DefaultAtom::from(label);
    if self.table.contains_left(&label) || self.aliases.contains_key(&label) {
      return Err((label, address));
    }
    match self.table.contains_right(&address) {
      true  => {
        self.aliases.insert(label, address);
        Ok(())
      }
      false => self.table.insert_no_overwrite(label, address)
    }
  }
}
