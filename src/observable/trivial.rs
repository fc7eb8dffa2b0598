use std::marker::PhantomData;

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Completes immediately without emitting.
pub fn empty<Item>() -> Empty<Item> { Empty(PhantomData) }

/// Never emits and never terminates.
pub fn never<Item>() -> Never<Item> { Never(PhantomData) }

/// Errors immediately with `err`.
pub fn throw<Item, Err>(err: Err) -> Throw<Item, Err> { Throw { err, _item: PhantomData } }

pub struct Empty<Item>(PhantomData<fn() -> Item>);

pub struct Never<Item>(PhantomData<fn() -> Item>);

pub struct Throw<Item, Err> {
  err: Err,
  _item: PhantomData<fn() -> Item>,
}

impl<Item> Clone for Empty<Item> {
  fn clone(&self) -> Self { empty() }
}

impl<Item> Clone for Never<Item> {
  fn clone(&self) -> Self { never() }
}

impl<Item, Err: Clone> Clone for Throw<Item, Err> {
  fn clone(&self) -> Self { throw(self.err.clone()) }
}

impl<Item> ObservableType for Empty<Item> {
  type Item = Item;
  type Err = RxError;
}

impl<Item> ObservableType for Never<Item> {
  type Item = Item;
  type Err = RxError;
}

impl<Item, Err> ObservableType for Throw<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, O: Observer<Item, RxError>> CoreObservable<O> for Empty<Item> {
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.complete() }
}

impl<Item, O> CoreObservable<O> for Never<Item> {
  type Unsub = ();

  fn actual_subscribe(self, _observer: O) -> Self::Unsub {}
}

impl<Item, Err, O: Observer<Item, Err>> CoreObservable<O> for Throw<Item, Err> {
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.error(self.err) }
}
