//! Observables built from a closure that drives an emitter by hand.

use std::{
  marker::PhantomData,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Emitter, Observer, boxed},
  rc::MutArc,
  subscription::Subscription,
};

/// Runs `subscribe` for every subscriber, handing it an emitter.
///
/// The closure returns the teardown to run on unsubscribe (`()` when there
/// is nothing to release). The emitter is `Clone + Send`, so it can be moved
/// into threads or callbacks that keep producing after `subscribe` returned.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxcore::prelude::*;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let c_seen = seen.clone();
/// observable::create::<i32, RxError, _, _>(|emitter| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// })
/// .map(|v| v + 1)
/// .subscribe(move |v| c_seen.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub fn create<Item, Err, F, U>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(CreateEmitter<Item, Err>) -> U,
  U: Subscription,
{
  Create { subscribe, _marker: PhantomData }
}

pub struct Create<F, Item, Err> {
  subscribe: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { subscribe: self.subscribe.clone(), _marker: PhantomData } }
}

impl<F, Item, Err> ObservableType for Create<F, Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<F, Item, Err, U, O> CoreObservable<O> for Create<F, Item, Err>
where
  F: FnOnce(CreateEmitter<Item, Err>) -> U,
  U: Subscription,
  O: Observer<Item, Err> + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CreateSubscription<U>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let emitter = CreateEmitter {
      observer: MutArc::own(Some(boxed(observer))),
      closed: Arc::new(AtomicBool::new(false)),
    };
    let closed = emitter.closed.clone();
    let teardown = (self.subscribe)(emitter);
    CreateSubscription { closed, teardown }
  }
}

// ==== CreateEmitter ====

/// Producer handle passed to a [`create`] closure.
///
/// Everything sent after a terminal event, or after the subscription was
/// released, is ignored.
pub struct CreateEmitter<Item, Err> {
  observer: MutArc<Option<BoxedObserver<Item, Err>>>,
  closed: Arc<AtomicBool>,
}

impl<Item, Err> Clone for CreateEmitter<Item, Err> {
  fn clone(&self) -> Self {
    CreateEmitter { observer: self.observer.clone(), closed: self.closed.clone() }
  }
}

impl<Item, Err> CreateEmitter<Item, Err> {
  pub fn next(&self, value: Item) {
    if self.closed.load(Ordering::Acquire) {
      return;
    }
    if let Some(observer) = self.observer.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  pub fn error(&self, err: Err) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let observer = self.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  pub fn complete(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let observer = self.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  /// `true` once the stream terminated, was unsubscribed, or the downstream
  /// stopped listening.
  pub fn is_closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
      || self
        .observer
        .rc_deref_mut()
        .as_ref()
        .is_none_or(|o| o.is_closed())
  }
}

impl<Item, Err> Emitter<Item, Err> for CreateEmitter<Item, Err> {
  fn next(&mut self, value: Item) { CreateEmitter::next(self, value) }

  fn error(&mut self, err: Err) { CreateEmitter::error(self, err) }

  fn complete(&mut self) { CreateEmitter::complete(self) }

  fn is_closed(&self) -> bool { CreateEmitter::is_closed(self) }
}

// ==== CreateSubscription ====

/// Stops the emitter, then runs the teardown returned by the closure.
pub struct CreateSubscription<U> {
  closed: Arc<AtomicBool>,
  teardown: U,
}

impl<U: Subscription> Subscription for CreateSubscription<U> {
  fn unsubscribe(self) {
    self.closed.store(true, Ordering::Release);
    self.teardown.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  };

  use crate::{prelude::*, subscription::ClosureSubscription};

  #[rxcore_macro::test]
  fn ignores_calls_after_terminal() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    let sub = observable::create(|emitter| {
      emitter.next(1);
      emitter.complete();
      emitter.next(2);
      emitter.error(RxError::msg("late"));
    })
    .subscribe_all(
      move |v| n.lock().unwrap().push(format!("next {v}")),
      |_| panic!("error after complete"),
      move || c.lock().unwrap().push("complete".to_string()),
    );
    assert_eq!(*log.lock().unwrap(), vec!["next 1", "complete"]);
    assert!(sub.is_closed());
  }

  #[rxcore_macro::test]
  fn unsubscribe_stops_emitter_and_runs_teardown() {
    let torn_down = Arc::new(AtomicBool::new(false));
    let c_torn_down = torn_down.clone();
    let stash = Arc::new(Mutex::new(None));
    let c_stash = stash.clone();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();

    let sub = observable::create::<i32, RxError, _, _>(move |emitter| {
      emitter.next(1);
      *c_stash.lock().unwrap() = Some(emitter);
      ClosureSubscription(move || c_torn_down.store(true, Ordering::SeqCst))
    })
    .subscribe(move |v| c_out.lock().unwrap().push(v));

    sub.unsubscribe();
    assert!(torn_down.load(Ordering::SeqCst));

    let emitter = stash.lock().unwrap().take().unwrap();
    assert!(emitter.is_closed());
    emitter.next(2);
    assert_eq!(*out.lock().unwrap(), vec![1]);
  }

  #[rxcore_macro::test]
  fn emitter_crosses_threads() {
    let (tx, rx) = std::sync::mpsc::channel();
    observable::create::<i32, RxError, _, _>(|emitter| {
      std::thread::spawn(move || {
        for v in 0..3 {
          emitter.next(v);
        }
        emitter.complete();
      });
    })
    .subscribe(move |v| {
      let _ = tx.send(v);
    });
    let got: Vec<i32> = rx.iter().collect();
    assert_eq!(got, vec![0, 1, 2]);
  }
}
