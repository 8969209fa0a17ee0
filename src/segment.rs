/*!
  Segmented memory. A segment is a fixed length array of words named by an identifier. The
  store is an arena of slots indexed by identifier, each holding either a live segment or a
  tombstone, together with a stack of the identifiers of tombstoned slots. Allocation takes an
  identifier from the top of that stack before growing the arena, so the most recently unmapped
  identifier is always the first to be reused.

  Slot 0 holds the running program. It is mapped when the store is created, can never be
  unmapped, and is only ever replaced wholesale by `replace_program`.
*/

use std::fmt::{Display, Formatter};

use crate::bytecode::Word;
use crate::error::UmError;

pub type SegmentId = Word;

pub const PROGRAM_SEGMENT: SegmentId = 0;


/// An owned block of words whose length is fixed when it is created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
  words: Box<[Word]>
}

impl Segment {
  /// A segment of `len` zeroed words. Fails, rather than aborting, if the words cannot be
  /// allocated.
  pub fn new(len: usize) -> Result<Segment, UmError> {
    let mut words: Vec<Word> = Vec::new();
    if words.try_reserve_exact(len).is_err() {
      return Err(UmError::OutOfMemory { len });
    }
    words.resize(len, 0);
    Ok(Segment{ words: words.into_boxed_slice() })
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn get(&self, offset: Word) -> Option<Word> {
    self.words.get(offset as usize).copied()
  }

  pub fn get_mut(&mut self, offset: Word) -> Option<&mut Word> {
    self.words.get_mut(offset as usize)
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }
}

impl From<Vec<Word>> for Segment {
  fn from(words: Vec<Word>) -> Segment {
    Segment{ words: words.into_boxed_slice() }
  }
}


pub struct SegmentStore {
  /// `None` is a tombstone left by `deallocate`.
  mapped   : Vec<Option<Segment>>,
  /// Identifiers of tombstones, most recently freed last.
  unmapped : Vec<SegmentId>,
}

impl SegmentStore {

  /// Creates a store whose segment 0 holds `program`.
  pub fn new(program: Vec<Word>) -> SegmentStore {
    SegmentStore {
      mapped   : vec![Some(Segment::from(program))],
      unmapped : vec![],
    }
  }

  // region Mapping

  /// Maps a new segment of `len` zeroed words and returns its identifier.
  pub fn allocate(&mut self, len: Word) -> Result<SegmentId, UmError> {
    let segment = Segment::new(len as usize)?;
    match self.unmapped.pop() {

      Some(id) => {
        debug_assert!(self.mapped[id as usize].is_none());
        self.mapped[id as usize] = Some(segment);
        Ok(id)
      }

      None => {
        self.mapped.push(Some(segment));
        Ok((self.mapped.len() - 1) as SegmentId)
      }

    }
  }

  /// Unmaps the segment `id`, releasing its words and making `id` available for reuse.
  pub fn deallocate(&mut self, id: SegmentId) -> Result<(), UmError> {
    if id == PROGRAM_SEGMENT {
      return Err(UmError::UnmapProgramSegment);
    }
    match self.mapped.get_mut(id as usize) {

      Some(slot) if slot.is_some() => {
        *slot = None;
        self.unmapped.push(id);
        Ok(())
      }

      _ => Err(UmError::UnmappedSegment { id })

    }
  }

  /**
    Installs a copy of segment `id` as segment 0, dropping the old program. Later writes to
    segment `id` do not reach the copy. Replacing segment 0 with itself is a no-op.
  */
  pub fn replace_program(&mut self, id: SegmentId) -> Result<(), UmError> {
    if id == PROGRAM_SEGMENT {
      return Ok(());
    }
    let copy = self.segment(id)?.clone();
    self.mapped[PROGRAM_SEGMENT as usize] = Some(copy);
    Ok(())
  }

  // endregion

  // region Access

  pub fn segment(&self, id: SegmentId) -> Result<&Segment, UmError> {
    match self.mapped.get(id as usize) {
      Some(Some(segment)) => Ok(segment),
      _ => Err(UmError::UnmappedSegment { id })
    }
  }

  fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, UmError> {
    match self.mapped.get_mut(id as usize) {
      Some(Some(segment)) => Ok(segment),
      _ => Err(UmError::UnmappedSegment { id })
    }
  }

  pub fn read_word(&self, id: SegmentId, offset: Word) -> Result<Word, UmError> {
    let segment = self.segment(id)?;
    segment.get(offset).ok_or(UmError::OffsetOutOfBounds { id, offset, len: segment.len() })
  }

  pub fn write_word(&mut self, id: SegmentId, offset: Word, value: Word) -> Result<(), UmError> {
    let segment = self.segment_mut(id)?;
    let len = segment.len();
    match segment.get_mut(offset) {

      Some(word) => {
        *word = value;
        Ok(())
      }

      None => Err(UmError::OffsetOutOfBounds { id, offset, len })

    }
  }

  /// The running program.
  pub fn program(&self) -> &Segment {
    match &self.mapped[PROGRAM_SEGMENT as usize] {
      Some(segment) => segment,
      None => unreachable!("segment 0 is never unmapped")
    }
  }

  // endregion

  // region Bookkeeping

  pub fn is_mapped(&self, id: SegmentId) -> bool {
    matches!(self.mapped.get(id as usize), Some(Some(_)))
  }

  /// Number of live segments, including segment 0.
  pub fn mapped_count(&self) -> usize {
    self.mapped.len() - self.unmapped.len()
  }

  /// Number of identifiers waiting to be reused.
  pub fn free_count(&self) -> usize {
    self.unmapped.len()
  }

  /// Live segments in identifier order.
  pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
    self.mapped
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| slot.as_ref().map(|segment| (id as SegmentId, segment)))
  }

  // endregion
}

impl Display for Segment {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    const SHOWN: usize = 8;
    let shown = self.words
                    .iter()
                    .take(SHOWN)
                    .map(|w| format!("{:08x}", w))
                    .collect::<Vec<String>>()
                    .join(" ");
    match self.len() > SHOWN {
      true  => write!(f, "[{}] {} …", self.len(), shown),
      false => write!(f, "[{}] {}", self.len(), shown)
    }
  }
}
