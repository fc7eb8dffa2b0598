//! First, Last and Single, with their `_or` / `_or_default` variants.
//!
//! `first` answers as soon as a value arrives; `last` and `single` answer on
//! completion. With no value and no fallback the result is
//! [`RxError::SequenceEmpty`]; a second value under `single` is
//! [`RxError::MultipleElements`] right away, fallback or not. Answering
//! before the source ends releases the upstream subscription.

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::SerialSubscription,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
  First,
  Last,
  Single,
}

#[derive(Clone)]
pub struct Element<S, T> {
  pub source: S,
  pub rule: Rule,
  pub fallback: Option<T>,
}

impl<S, T> Element<S, T> {
  pub fn new(source: S, rule: Rule, fallback: Option<T>) -> Self { Self { source, rule, fallback } }
}

impl<S, T> ObservableType for Element<S, T>
where
  S: ObservableType<Item = T>,
{
  type Item = T;
  type Err = S::Err;
}

pub struct ElementObserver<O, T> {
  observer: Option<O>,
  rule: Rule,
  fallback: Option<T>,
  found: Option<T>,
  upstream: SerialSubscription,
}

impl<O, T, Err> Observer<T, Err> for ElementObserver<O, T>
where
  O: Observer<T, Err>,
  Err: From<RxError>,
{
  fn next(&mut self, value: T) {
    match self.rule {
      Rule::First => {
        if let Some(mut observer) = self.observer.take() {
          observer.next(value);
          observer.complete();
          self.upstream.dispose();
        }
      }
      Rule::Last => self.found = Some(value),
      Rule::Single if self.found.is_some() => {
        if let Some(observer) = self.observer.take() {
          observer.error(RxError::MultipleElements.into());
          self.upstream.dispose();
        }
      }
      Rule::Single => self.found = Some(value),
    }
  }

  fn error(self, err: Err) { Observer::<T, Err>::error(self.observer, err) }

  fn complete(self) {
    let Some(mut observer) = self.observer else { return };
    match self.found.or(self.fallback) {
      Some(value) => {
        observer.next(value);
        observer.complete();
      }
      None => observer.error(RxError::SequenceEmpty.into()),
    }
  }

  fn is_closed(&self) -> bool { Observer::<T, Err>::is_closed(&self.observer) }
}

impl<S, T, O> CoreObservable<O> for Element<S, T>
where
  S: CoreObservable<ElementObserver<O, T>, Item = T>,
  S::Unsub: Send + 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Element { source, rule, fallback } = self;
    let upstream = SerialSubscription::new();
    let element = ElementObserver {
      observer: Some(observer),
      rule,
      fallback,
      found: None,
      upstream: upstream.clone(),
    };
    upstream.set(source.actual_subscribe(element));
    upstream
  }
}
