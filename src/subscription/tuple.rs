use super::Subscription;

/// Two subscriptions released together.
///
/// The statically typed counterpart of a two-child composite, for operators
/// with exactly two upstreams.
pub struct TupleSubscription<U1, U2> {
  first: U1,
  second: U2,
}

impl<U1, U2> TupleSubscription<U1, U2> {
  #[inline]
  pub fn new(first: U1, second: U2) -> Self { Self { first, second } }
}

impl<U1: Subscription, U2: Subscription> Subscription for TupleSubscription<U1, U2> {
  fn unsubscribe(self) {
    self.first.unsubscribe();
    self.second.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.first.is_closed() && self.second.is_closed() }
}
