//! Observer trait and implementations
//!
//! An observer receives `next` values followed by at most one terminal event
//! (`error` or `complete`). Terminal methods take `self` by value, so an owned
//! observer cannot be notified twice; observers living in shared state are
//! kept as `Option<O>` and taken out on termination.

use crate::rc::MutArc;

// ============================================================================
// Observer Trait
// ============================================================================

/// The consumer side of a stream.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  /// Terminal: no further calls are made after this.
  fn error(self, err: Err);

  /// Terminal: no further calls are made after this.
  fn complete(self);

  /// Returns `true` once the observer will ignore further values.
  ///
  /// Synchronous sources poll this between items to stop early (e.g. below a
  /// `take`).
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// `&mut self` facade over an observer, handed to `create` closures.
///
/// Calls made after a terminal event are ignored.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver - object-safe observer
// ============================================================================

/// Object-safe mirror of [`Observer`] used to box observers.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err); }
  fn box_complete(self: Box<Self>) { (*self).complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased, sendable observer.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

/// Boxes any sendable observer.
pub fn boxed<Item, Err, O>(observer: O) -> BoxedObserver<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
{
  Box::new(observer)
}

// ============================================================================
// Closure observers
// ============================================================================

/// Observer built from a single `next` closure. Errors and completion are
/// dropped silently.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item, Err> Observer<Item, Err> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.0)(value) }

  fn error(self, _err: Err) {}

  fn complete(self) {}

  fn is_closed(&self) -> bool { false }
}

/// Observer with one slot per notification kind.
///
/// The partial `subscribe_*` helpers fill unused slots with no-op function
/// pointers.
#[derive(Clone)]
pub struct CallbackObserver<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<N, E, C> CallbackObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { Self { next, error, complete } }
}

impl<N, Err> CallbackObserver<N, fn(Err), fn()> {
  /// Only `next` is handled.
  pub fn next_only(next: N) -> Self { Self { next, error: noop_error::<Err>, complete: noop } }
}

impl<N, E> CallbackObserver<N, E, fn()> {
  /// `next` and `error` are handled.
  pub fn with_error(next: N, error: E) -> Self { Self { next, error, complete: noop } }
}

impl<N, Err, C> CallbackObserver<N, fn(Err), C> {
  /// `next` and `complete` are handled.
  pub fn with_complete(next: N, complete: C) -> Self {
    Self { next, error: noop_error::<Err>, complete }
  }
}

fn noop() {}

fn noop_error<Err>(_: Err) {}

impl<N, E, C, Item, Err> Observer<Item, Err> for CallbackObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(self, err: Err) { (self.error)(err) }

  fn complete(self) { (self.complete)() }

  fn is_closed(&self) -> bool { false }
}

// ============================================================================
// Notification
// ============================================================================

/// A notification captured as a value, for operators that queue them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Next(_)) }

  /// Delivers to the observer in `slot`, taking it out on a terminal event.
  pub fn deliver<O: Observer<Item, Err>>(self, slot: &mut Option<O>) {
    match self {
      Self::Next(value) => {
        if let Some(observer) = slot.as_mut() {
          observer.next(value);
        }
      }
      Self::Error(err) => {
        if let Some(observer) = slot.take() {
          observer.error(err);
        }
      }
      Self::Complete => {
        if let Some(observer) = slot.take() {
          observer.complete();
        }
      }
    }
  }
}

// ============================================================================
// Observer implementations for wrappers
// ============================================================================

impl<Item, Err, O> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self {
      observer.error(err);
    }
  }

  fn complete(self) {
    if let Some(observer) = self {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(O::is_closed) }
}

/// Shared observer slot. Terminal events take the observer out, so every
/// clone sees the slot closed afterwards.
impl<Item, Err, O> Observer<Item, Err> for MutArc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref_mut().as_ref().is_none_or(O::is_closed) }
}
