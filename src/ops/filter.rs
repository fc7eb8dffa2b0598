//! Filter operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Forwards only the values for which `filter` returns `true`.
#[derive(Clone)]
pub struct Filter<S, F> {
  pub source: S,
  pub filter: F,
}

impl<S: ObservableType, F> ObservableType for Filter<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct FilterObserver<O, F> {
  observer: O,
  filter: F,
}

impl<O, F, Item, Err> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.filter)(&value) {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, O> CoreObservable<O> for Filter<S, F>
where
  S: CoreObservable<FilterObserver<O, F>>,
  F: FnMut(&S::Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Filter { source, filter } = self;
    source.actual_subscribe(FilterObserver { observer, filter })
  }
}
