//! Catch operator implementation
//!
//! On error, the handler turns the error into a fallback observable and the
//! downstream observer is handed over to it. The original error is not
//! forwarded. The fallback may use a different error type.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{CompositeSubscription, Subscription},
};

#[derive(Clone)]
pub struct Catch<S, F> {
  pub source: S,
  pub handler: F,
}

impl<S, F, R> ObservableType for Catch<S, F>
where
  S: ObservableType,
  F: FnOnce(S::Err) -> R,
  R: ObservableType<Item = S::Item>,
{
  type Item = S::Item;
  type Err = R::Err;
}

pub struct CatchObserver<O, F> {
  observer: O,
  handler: F,
  subs: CompositeSubscription,
}

impl<O, F, R, Item, Err> Observer<Item, Err> for CatchObserver<O, F>
where
  F: FnOnce(Err) -> R,
  R: CoreObservable<O, Item = Item>,
  R::Unsub: Send + 'static,
  O: Observer<Item, R::Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    let fallback = (self.handler)(err);
    self.subs.add(fallback.actual_subscribe(self.observer));
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() || self.subs.is_closed() }
}

impl<S, F, R, O> CoreObservable<O> for Catch<S, F>
where
  S: CoreObservable<CatchObserver<O, F>>,
  S::Unsub: Send + 'static,
  F: FnOnce(<S as ObservableType>::Err) -> R,
  R: ObservableType<Item = <S as ObservableType>::Item>,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Catch { source, handler } = self;
    let subs = CompositeSubscription::new();
    let observer = CatchObserver { observer, handler, subs: subs.clone() };
    subs.add(source.actual_subscribe(observer));
    subs
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn switches_to_fallback() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    observable::range(1, 2)
      .concat(observable::throw::<i64, _>(RxError::msg("broken")))
      .catch(|err| {
        assert_eq!(err.to_string(), "broken");
        observable::of(-1_i64)
      })
      .subscribe_all(
        move |v| n.lock().unwrap().push(v.to_string()),
        move |err: RxError| e.lock().unwrap().push(err.to_string()),
        move || c.lock().unwrap().push("done".to_string()),
      );
    assert_eq!(*log.lock().unwrap(), vec!["1", "2", "-1", "done"]);
  }

  #[rxcore_macro::test]
  fn fallback_subscription_is_released() {
    let fallback: Subject<i32> = Subject::new();
    let c_fallback = fallback.clone();
    let sub = observable::throw::<i32, _>(RxError::SequenceEmpty)
      .catch(move |_| c_fallback)
      .subscribe(|_| {});
    assert_eq!(fallback.subscriber_count(), 1);
    sub.unsubscribe();
    assert_eq!(fallback.subscriber_count(), 0);
  }
}
