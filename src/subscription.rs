//! Disposal handles.
//!
//! Every `subscribe` call returns a [`Subscription`]. Unsubscribing releases
//! whatever the subscription owns (upstream subscriptions, scheduled tasks,
//! registry entries) and is a no-op when already released.

mod boxed;
mod composite;
mod registry;
mod serial;
mod source_with_handle;
mod tuple;

pub use boxed::BoxedSubscription;
pub use composite::CompositeSubscription;
pub use registry::Registry;
pub use serial::SerialSubscription;
pub use source_with_handle::SourceWithHandle;
pub use tuple::TupleSubscription;

/// A handle that can release the resources of a running stream.
pub trait Subscription {
  /// Releases everything this handle owns.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Unsubscribes when the returned guard is dropped.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }

  fn into_boxed(self) -> BoxedSubscription
  where
    Self: Sized + Send + 'static,
  {
    BoxedSubscription::new(self)
  }
}

/// Nothing to release.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  fn unsubscribe(self) {
    if let Some(sub) = self {
      sub.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(S::is_closed) }
}

/// Runs a closure on unsubscribe.
pub struct ClosureSubscription<F>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  fn unsubscribe(self) { (self.0)() }

  fn is_closed(&self) -> bool { false }
}

/// RAII wrapper returned by [`Subscription::unsubscribe_when_dropped`].
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Gives the subscription back without unsubscribing.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  fn drop(&mut self) {
    if let Some(sub) = self.0.take() {
      sub.unsubscribe();
    }
  }
}
