use std::{
  iter::{Repeat, Take},
  ops::Range,
};

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits every item of `iter` synchronously, then completes.
///
/// The observer is polled with `is_closed` before each item, so a downstream
/// `take` stops the iteration early; infinite iterators are fine in that case.
pub fn from_iter<I: IntoIterator>(iter: I) -> FromIter<I> { FromIter(iter) }

/// `count` consecutive integers starting at `start`.
pub fn range(start: i64, count: usize) -> FromIter<Range<i64>> {
  let end = start.saturating_add(i64::try_from(count).unwrap_or(i64::MAX));
  from_iter(start..end)
}

/// `value`, `count` times.
pub fn repeat<Item: Clone>(value: Item, count: usize) -> FromIter<Take<Repeat<Item>>> {
  from_iter(std::iter::repeat(value).take(count))
}

#[derive(Clone)]
pub struct FromIter<I>(pub I);

impl<I: IntoIterator> ObservableType for FromIter<I> {
  type Item = I::Item;
  type Err = RxError;
}

impl<I, O> CoreObservable<O> for FromIter<I>
where
  I: IntoIterator,
  O: Observer<I::Item, RxError>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for value in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(value);
    }
    if !observer.is_closed() {
      observer.complete();
    }
  }
}
