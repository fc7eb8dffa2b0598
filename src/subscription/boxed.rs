use super::Subscription;

/// Object-safe mirror of [`Subscription`].
pub trait DynSubscription {
  fn box_unsubscribe(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T: Subscription> DynSubscription for T {
  #[inline]
  fn box_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased, sendable subscription.
///
/// Lets operators keep subscriptions of different concrete types side by
/// side (composites, serial slots, subjects).
pub struct BoxedSubscription(Box<dyn DynSubscription + Send>);

impl BoxedSubscription {
  pub fn new<S: Subscription + Send + 'static>(sub: S) -> Self { Self(Box::new(sub)) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.box_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.box_is_closed() }

  fn into_boxed(self) -> BoxedSubscription { self }
}
