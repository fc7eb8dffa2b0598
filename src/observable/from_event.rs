use std::{
  marker::PhantomData,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::Subscription,
};

/// Callback handed to `conversion` in [`from_event`].
pub type EventHandler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Bridges a callback-registration API into an observable.
///
/// On subscribe, `conversion` turns an [`EventHandler`] into whatever handler
/// type the host expects, and `add_handler` registers it. Unsubscribing hands
/// the same handler to `remove_handler`. The stream never terminates on its
/// own.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxcore::{observable::EventHandler, prelude::*};
///
/// type Listener = Arc<dyn Fn(&str) + Send + Sync>;
/// let listeners: Arc<Mutex<Vec<Listener>>> = Arc::default();
///
/// let (add, remove) = (listeners.clone(), listeners.clone());
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let c_seen = seen.clone();
/// let sub = observable::from_event(
///   |handler: EventHandler<String>| -> Listener { Arc::new(move |s: &str| handler(s.to_owned())) },
///   move |l| add.lock().unwrap().push(l),
///   move |l| remove.lock().unwrap().retain(|x| !Arc::ptr_eq(x, &l)),
/// )
/// .subscribe(move |s| c_seen.lock().unwrap().push(s));
///
/// for l in listeners.lock().unwrap().iter() {
///   l("click");
/// }
/// sub.unsubscribe();
/// assert!(listeners.lock().unwrap().is_empty());
/// assert_eq!(*seen.lock().unwrap(), vec!["click".to_string()]);
/// ```
pub fn from_event<Item, H, C, A, R>(
  conversion: C, add_handler: A, remove_handler: R,
) -> FromEvent<C, A, R, Item>
where
  C: FnOnce(EventHandler<Item>) -> H,
  A: FnOnce(H),
  R: FnOnce(H),
  H: Clone,
{
  FromEvent { conversion, add_handler, remove_handler, _item: PhantomData }
}

pub struct FromEvent<C, A, R, Item> {
  conversion: C,
  add_handler: A,
  remove_handler: R,
  _item: PhantomData<fn() -> Item>,
}

impl<C: Clone, A: Clone, R: Clone, Item> Clone for FromEvent<C, A, R, Item> {
  fn clone(&self) -> Self {
    FromEvent {
      conversion: self.conversion.clone(),
      add_handler: self.add_handler.clone(),
      remove_handler: self.remove_handler.clone(),
      _item: PhantomData,
    }
  }
}

impl<C, A, R, Item> ObservableType for FromEvent<C, A, R, Item> {
  type Item = Item;
  type Err = RxError;
}

impl<C, A, R, Item, H, O> CoreObservable<O> for FromEvent<C, A, R, Item>
where
  C: FnOnce(EventHandler<Item>) -> H,
  A: FnOnce(H),
  R: FnOnce(H),
  H: Clone,
  O: Observer<Item, RxError> + Send + 'static,
  Item: 'static,
{
  type Unsub = FromEventSubscription<H, R>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let closed = Arc::new(AtomicBool::new(false));
    let observer = MutArc::own(observer);
    let c_closed = closed.clone();
    let handler: EventHandler<Item> = Arc::new(move |value| {
      if !c_closed.load(Ordering::Acquire) {
        observer.rc_deref_mut().next(value);
      }
    });
    let handler = (self.conversion)(handler);
    (self.add_handler)(handler.clone());
    FromEventSubscription { handler, remove_handler: self.remove_handler, closed }
  }
}

/// Unregisters the handler that was added on subscribe.
pub struct FromEventSubscription<H, R> {
  handler: H,
  remove_handler: R,
  closed: Arc<AtomicBool>,
}

impl<H, R: FnOnce(H)> Subscription for FromEventSubscription<H, R> {
  fn unsubscribe(self) {
    if !self.closed.swap(true, Ordering::AcqRel) {
      (self.remove_handler)(self.handler);
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
