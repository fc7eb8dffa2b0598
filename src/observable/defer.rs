use crate::observable::{CoreObservable, ObservableType};

/// Builds a fresh observable with `factory` on every subscription.
pub fn defer<F, R>(factory: F) -> Defer<F>
where
  F: FnOnce() -> R,
  R: ObservableType,
{
  Defer(factory)
}

#[derive(Clone)]
pub struct Defer<F>(pub F);

impl<F, R> ObservableType for Defer<F>
where
  F: FnOnce() -> R,
  R: ObservableType,
{
  type Item = R::Item;
  type Err = R::Err;
}

impl<F, R, O> CoreObservable<O> for Defer<F>
where
  F: FnOnce() -> R,
  R: CoreObservable<O>,
{
  type Unsub = R::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { (self.0)().actual_subscribe(observer) }
}
