//! Type-erased observables.
//!
//! Operator chains have deeply nested types. Boxing hides them behind
//! `BoxedObservable<Item, Err>`, which is what you store in a struct field or
//! return from a function that picks between pipelines at runtime.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer, boxed},
  subscription::{BoxedSubscription, Subscription},
};

// ============================================================================
// Object-safe traits
// ============================================================================

/// Object-safe subscribe: a boxed observer in, a boxed subscription out.
pub trait DynObservable<Item, Err> {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

/// [`DynObservable`] that can also clone itself into a new box.
pub trait DynObservableClone<Item, Err>: DynObservable<Item, Err> {
  fn clone_box(&self) -> Box<dyn DynObservableClone<Item, Err> + Send>;
}

impl<S, Item, Err> DynObservable<Item, Err> for S
where
  S: CoreObservable<BoxedObserver<Item, Err>>,
  S::Unsub: Send + 'static,
{
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    (*self).actual_subscribe(observer).into_boxed()
  }
}

impl<S, Item, Err> DynObservableClone<Item, Err> for S
where
  S: DynObservable<Item, Err> + Clone + Send + 'static,
{
  fn clone_box(&self) -> Box<dyn DynObservableClone<Item, Err> + Send> { Box::new(self.clone()) }
}

// ============================================================================
// Boxed observables
// ============================================================================

pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err> + Send>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: DynObservable<Item, Err> + Send + 'static,
  {
    Self(Box::new(source))
  }
}

/// Like [`BoxedObservable`], for pipelines that are `Clone`.
pub struct BoxedObservableClone<Item, Err>(Box<dyn DynObservableClone<Item, Err> + Send>);

impl<Item, Err> BoxedObservableClone<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: DynObservableClone<Item, Err> + Send + 'static,
  {
    Self(Box::new(source))
  }
}

impl<Item, Err> Clone for BoxedObservableClone<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone_box()) }
}

impl<Item, Err> ObservableType for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err> ObservableType for BoxedObservableClone<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, O> CoreObservable<O> for BoxedObservable<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.dyn_subscribe(boxed(observer)) }
}

impl<Item, Err, O> CoreObservable<O> for BoxedObservableClone<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.dyn_subscribe(boxed(observer)) }
}
