//! Cast and OfType operators
//!
//! Both convert values with `TryInto`. `cast` fails the stream with
//! [`RxError::Cast`] on the first value that does not convert; `of_type`
//! drops such values silently.

use std::{any::type_name, marker::PhantomData};

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

// ==================== Cast ====================

pub struct Cast<S, T> {
  pub source: S,
  _target: PhantomData<fn() -> T>,
}

impl<S, T> Cast<S, T> {
  pub fn new(source: S) -> Self { Self { source, _target: PhantomData } }
}

impl<S: Clone, T> Clone for Cast<S, T> {
  fn clone(&self) -> Self { Self::new(self.source.clone()) }
}

impl<S: ObservableType, T> ObservableType for Cast<S, T> {
  type Item = T;
  type Err = S::Err;
}

pub struct CastObserver<O, T> {
  observer: Option<O>,
  _target: PhantomData<fn() -> T>,
}

impl<O, T, Item, Err> Observer<Item, Err> for CastObserver<O, T>
where
  O: Observer<T, Err>,
  Item: TryInto<T>,
  Err: From<RxError>,
{
  fn next(&mut self, value: Item) {
    if let Ok(value) = value.try_into() {
      Observer::<T, Err>::next(&mut self.observer, value);
    } else if let Some(observer) = self.observer.take() {
      observer.error(RxError::Cast { target: type_name::<T>() }.into());
    }
  }

  fn error(self, err: Err) { Observer::<T, Err>::error(self.observer, err) }

  fn complete(self) { Observer::<T, Err>::complete(self.observer) }

  fn is_closed(&self) -> bool { Observer::<T, Err>::is_closed(&self.observer) }
}

impl<S, T, O> CoreObservable<O> for Cast<S, T>
where
  S: CoreObservable<CastObserver<O, T>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(CastObserver { observer: Some(observer), _target: PhantomData })
  }
}

// ==================== OfType ====================

pub struct OfType<S, T> {
  pub source: S,
  _target: PhantomData<fn() -> T>,
}

impl<S, T> OfType<S, T> {
  pub fn new(source: S) -> Self { Self { source, _target: PhantomData } }
}

impl<S: Clone, T> Clone for OfType<S, T> {
  fn clone(&self) -> Self { Self::new(self.source.clone()) }
}

impl<S: ObservableType, T> ObservableType for OfType<S, T> {
  type Item = T;
  type Err = S::Err;
}

pub struct OfTypeObserver<O, T> {
  observer: O,
  _target: PhantomData<fn() -> T>,
}

impl<O, T, Item, Err> Observer<Item, Err> for OfTypeObserver<O, T>
where
  O: Observer<T, Err>,
  Item: TryInto<T>,
{
  fn next(&mut self, value: Item) {
    if let Ok(value) = value.try_into() {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, T, O> CoreObservable<O> for OfType<S, T>
where
  S: CoreObservable<OfTypeObserver<O, T>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(OfTypeObserver { observer, _target: PhantomData })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn cast_fails_on_first_bad_value() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let err = Arc::new(Mutex::new(None));
    let (c_out, c_err) = (out.clone(), err.clone());
    observable::from_iter([1_i32, 200, 300, 2])
      .cast::<u8>()
      .subscribe_err(move |v| c_out.lock().unwrap().push(v), move |e| *c_err.lock().unwrap() = Some(e));
    assert_eq!(*out.lock().unwrap(), vec![1_u8, 200]);
    assert!(matches!(*err.lock().unwrap(), Some(RxError::Cast { target: "u8" })));
  }

  #[rxcore_macro::test]
  fn of_type_drops_bad_values() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter([1_i32, -5, 300, 2])
      .of_type::<u8>()
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1_u8, 2]);
  }
}
