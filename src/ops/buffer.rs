//! BufferCount operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits the values in `Vec`s of `count` elements.
///
/// On completion a partial, non-empty buffer is flushed before completing.
/// On error the partial buffer is dropped.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxcore::prelude::*;
///
/// let out = Arc::new(Mutex::new(Vec::new()));
/// let c_out = out.clone();
/// observable::range(1, 5)
///   .buffer_count(2)
///   .subscribe(move |v| c_out.lock().unwrap().push(v));
/// assert_eq!(*out.lock().unwrap(), vec![vec![1, 2], vec![3, 4], vec![5]]);
/// ```
#[derive(Clone)]
pub struct BufferCount<S> {
  pub source: S,
  pub count: usize,
}

impl<S: ObservableType> ObservableType for BufferCount<S> {
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

pub struct BufferCountObserver<O, Item> {
  observer: O,
  buffer: Vec<Item>,
  count: usize,
}

impl<O, Item, Err> Observer<Item, Err> for BufferCountObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    self.buffer.push(value);
    if self.buffer.len() >= self.count {
      let full = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.count));
      self.observer.next(full);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if !self.buffer.is_empty() {
      self.observer.next(self.buffer);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for BufferCount<S>
where
  S: CoreObservable<BufferCountObserver<O, <S as ObservableType>::Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let BufferCount { source, count } = self;
    let observer = BufferCountObserver { observer, buffer: Vec::with_capacity(count), count };
    source.actual_subscribe(observer)
  }
}
