//! Reduce (aggregate) operators
//!
//! `reduce` seeds the accumulator with the first value without calling the
//! function for it, and fails with [`RxError::SequenceEmpty`] on an empty
//! source. `reduce_initial` calls the function for every value and emits the
//! seed when the source is empty. A partial accumulator is dropped on error.

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

// ==================== Reduce ====================

#[derive(Clone)]
pub struct Reduce<S, F> {
  pub source: S,
  pub func: F,
}

impl<S: ObservableType, F> ObservableType for Reduce<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct ReduceObserver<O, F, Item> {
  observer: O,
  func: F,
  acc: Option<Item>,
}

impl<O, F, Item, Err> Observer<Item, Err> for ReduceObserver<O, F, Item>
where
  O: Observer<Item, Err>,
  F: FnMut(Item, Item) -> Item,
  Err: From<RxError>,
{
  fn next(&mut self, value: Item) {
    let acc = match self.acc.take() {
      Some(acc) => (self.func)(acc, value),
      None => value,
    };
    self.acc = Some(acc);
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    match self.acc {
      Some(acc) => {
        self.observer.next(acc);
        self.observer.complete();
      }
      None => self.observer.error(RxError::SequenceEmpty.into()),
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, O> CoreObservable<O> for Reduce<S, F>
where
  S: CoreObservable<ReduceObserver<O, F, <S as ObservableType>::Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Reduce { source, func } = self;
    source.actual_subscribe(ReduceObserver { observer, func, acc: None })
  }
}

// ==================== ReduceInitial ====================

#[derive(Clone)]
pub struct ReduceInitial<S, Acc, F> {
  pub source: S,
  pub initial: Acc,
  pub func: F,
}

impl<S: ObservableType, Acc, F> ObservableType for ReduceInitial<S, Acc, F> {
  type Item = Acc;
  type Err = S::Err;
}

pub struct ReduceInitialObserver<O, Acc, F> {
  observer: O,
  // `None` only while `func` runs
  acc: Option<Acc>,
  func: F,
}

impl<O, Acc, F, Item, Err> Observer<Item, Err> for ReduceInitialObserver<O, Acc, F>
where
  O: Observer<Acc, Err>,
  F: FnMut(Acc, Item) -> Acc,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      self.acc = Some((self.func)(acc, value));
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(acc) = self.acc {
      self.observer.next(acc);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, Acc, F, O> CoreObservable<O> for ReduceInitial<S, Acc, F>
where
  S: CoreObservable<ReduceInitialObserver<O, Acc, F>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ReduceInitial { source, initial, func } = self;
    source.actual_subscribe(ReduceInitialObserver { observer, acc: Some(initial), func })
  }
}
