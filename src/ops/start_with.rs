//! StartWith operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits `values` before anything from the source.
pub struct StartWith<S: ObservableType> {
  pub source: S,
  pub values: Vec<S::Item>,
}

impl<S> Clone for StartWith<S>
where
  S: ObservableType + Clone,
  S::Item: Clone,
{
  fn clone(&self) -> Self { StartWith { source: self.source.clone(), values: self.values.clone() } }
}

impl<S: ObservableType> ObservableType for StartWith<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, O> CoreObservable<O> for StartWith<S>
where
  S: CoreObservable<O>,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let StartWith { source, values } = self;
    for value in values {
      if observer.is_closed() {
        break;
      }
      observer.next(value);
    }
    source.actual_subscribe(observer)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn prepends_values() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::range(3, 2)
      .start_with([1, 2])
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3, 4]);
  }
}
