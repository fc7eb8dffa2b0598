use smallvec::SmallVec;

/// Id-keyed storage for live entries.
///
/// Entries refer back to their owner by id instead of by pointer, so an
/// entry can be removed from inside a callback without walking an ownership
/// cycle: removal just drops the id from this table.
pub struct Registry<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Registry<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> Registry<U> {
  pub fn new() -> Self { Self::default() }

  /// Stores `item` and returns its id. Ids are never reused.
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    let pos = self.items.iter().position(|(i, _)| *i == id)?;
    Some(self.items.remove(pos).1)
  }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Removes every entry, in insertion order.
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ { self.items.drain(..).map(|(_, u)| u) }

  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, u)| u) }
}

impl<U: Clone> Registry<U> {
  /// Copies the live entries so callers can iterate without holding the
  /// owner's lock.
  pub fn snapshot(&self) -> SmallVec<[U; 4]> { self.iter().cloned().collect() }
}
