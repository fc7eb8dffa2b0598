//! Multicasting a single upstream subscription.
//!
//! A [`ConnectableObservable`] pairs a source with a subject. Subscribing to
//! it (or to a [`fork`](ConnectableObservable::fork)) only subscribes the
//! subject; the source runs once [`connect`](ConnectableObservable::connect)
//! is called, and every subscriber sees the same notifications.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rxcore::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let shared = observable::range(1, 3).publish();
//! for tag in ["a", "b"] {
//!   let seen = seen.clone();
//!   shared.fork().subscribe(move |v| seen.lock().unwrap().push(format!("{tag}{v}")));
//! }
//! assert!(seen.lock().unwrap().is_empty());
//!
//! shared.connect();
//! assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "a2", "b2", "a3", "b3"]);
//! ```

use crate::{
  observable::{CoreObservable, ObservableType},
  rc::MutArc,
  subscription::{SerialSubscription, Subscription},
};

// ============================================================================
// Connection
// ============================================================================

/// The upstream subscription made by `connect`. Clones refer to the same
/// connection.
#[derive(Clone, Default)]
pub struct Connection(SerialSubscription);

impl Subscription for Connection {
  fn unsubscribe(self) {
    if !self.0.is_closed() {
      tracing::debug!("connectable disconnected");
    }
    self.0.dispose();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

// ============================================================================
// ConnectableObservable
// ============================================================================

pub struct ConnectableObservable<S, Sub> {
  source: S,
  subject: Sub,
  connection: MutArc<Option<Connection>>,
}

impl<S: Clone, Sub: Clone> Clone for ConnectableObservable<S, Sub> {
  fn clone(&self) -> Self {
    Self {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, Sub> ConnectableObservable<S, Sub> {
  pub fn new(source: S, subject: Sub) -> Self {
    Self { source, subject, connection: MutArc::own(None) }
  }

  /// The inner subject, as an observable to subscribe to.
  pub fn fork(&self) -> Sub
  where
    Sub: Clone,
  {
    self.subject.clone()
  }

  /// Subscribes the subject to the source.
  ///
  /// While a previous connection is still live it is returned as is.
  /// Once that connection was released, connecting again re-runs the
  /// source; whatever the subject retained is kept.
  pub fn connect(&self) -> Connection
  where
    S: CoreObservable<Sub> + Clone,
    S::Unsub: Send + 'static,
    Sub: Clone,
  {
    let connection = {
      let mut current = self.connection.rc_deref_mut();
      if let Some(live) = current.as_ref().filter(|c| !c.is_closed()) {
        return live.clone();
      }
      let connection = Connection::default();
      *current = Some(connection.clone());
      connection
    };
    tracing::debug!("connectable connecting");
    let upstream = self
      .source
      .clone()
      .actual_subscribe(self.subject.clone());
    connection.0.set(upstream);
    connection
  }

  /// Connects on the first subscriber and disconnects when the last one
  /// leaves.
  pub fn ref_count(self) -> RefCount<S, Sub> {
    RefCount { connectable: self, state: MutArc::own(RefCountState::default()) }
  }
}

impl<S: ObservableType, Sub> ObservableType for ConnectableObservable<S, Sub> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, Sub, O> CoreObservable<O> for ConnectableObservable<S, Sub>
where
  S: ObservableType,
  Sub: CoreObservable<O>,
{
  type Unsub = Sub::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

// ============================================================================
// RefCount
// ============================================================================

#[derive(Default)]
struct RefCountState {
  subscribers: usize,
  connection: Option<Connection>,
}

pub struct RefCount<S, Sub> {
  connectable: ConnectableObservable<S, Sub>,
  state: MutArc<RefCountState>,
}

impl<S: Clone, Sub: Clone> Clone for RefCount<S, Sub> {
  fn clone(&self) -> Self { Self { connectable: self.connectable.clone(), state: self.state.clone() } }
}

impl<S: ObservableType, Sub> ObservableType for RefCount<S, Sub> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, Sub, O> CoreObservable<O> for RefCount<S, Sub>
where
  S: CoreObservable<Sub> + Clone,
  S::Unsub: Send + 'static,
  Sub: CoreObservable<O> + Clone,
{
  type Unsub = RefCountSubscription<Sub::Unsub>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let inner = self.connectable.fork().actual_subscribe(observer);
    let first = {
      let mut state = self.state.rc_deref_mut();
      state.subscribers += 1;
      state.subscribers == 1
    };
    if first {
      tracing::trace!("ref_count 0 -> 1");
      let connection = self.connectable.connect();
      let orphan = {
        let mut state = self.state.rc_deref_mut();
        if state.subscribers == 0 {
          Some(connection)
        } else {
          state.connection = Some(connection);
          None
        }
      };
      // Everyone left while we were connecting.
      if let Some(connection) = orphan {
        connection.unsubscribe();
      }
    }
    RefCountSubscription { inner, state: self.state }
  }
}

pub struct RefCountSubscription<U> {
  inner: U,
  state: MutArc<RefCountState>,
}

impl<U: Subscription> Subscription for RefCountSubscription<U> {
  fn unsubscribe(self) {
    self.inner.unsubscribe();
    let connection = {
      let mut state = self.state.rc_deref_mut();
      state.subscribers = state.subscribers.saturating_sub(1);
      if state.subscribers == 0 { state.connection.take() } else { None }
    };
    if let Some(connection) = connection {
      tracing::trace!("ref_count 1 -> 0");
      connection.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.inner.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn source_runs_once_per_connect() {
    let runs = Arc::new(AtomicUsize::new(0));
    let c_runs = runs.clone();
    let shared = observable::defer(move || {
      c_runs.fetch_add(1, Ordering::SeqCst);
      observable::range(0, 3)
    })
    .publish();

    let out = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
      let out = out.clone();
      shared.fork().subscribe(move |v| out.lock().unwrap().push(v));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    shared.connect();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(*out.lock().unwrap(), vec![0, 0, 1, 1, 2, 2]);
  }

  #[rxcore_macro::test]
  fn reconnect_after_disconnect() {
    let mut upstream: Subject<i32> = Subject::new();
    let shared = upstream.clone().publish();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    shared.fork().subscribe(move |v| c_out.lock().unwrap().push(v));

    let first = shared.connect();
    let again = shared.connect();
    assert_eq!(upstream.subscriber_count(), 1);
    upstream.next(1);

    first.unsubscribe();
    assert!(again.is_closed());
    assert_eq!(upstream.subscriber_count(), 0);
    upstream.next(2);

    let _second = shared.connect();
    upstream.next(3);
    assert_eq!(*out.lock().unwrap(), vec![1, 3]);
  }

  #[rxcore_macro::test]
  fn replay_survives_reconnect() {
    let mut upstream: Subject<i32> = Subject::new();
    let shared = upstream.clone().replay();
    let conn = shared.connect();
    upstream.next(1);
    upstream.next(2);
    conn.unsubscribe();

    let _conn = shared.connect();
    upstream.next(3);
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    shared.fork().subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
  }

  #[rxcore_macro::test]
  fn ref_count_tracks_subscribers() {
    let mut upstream: Subject<i32> = Subject::new();
    let counted = upstream.clone().publish().ref_count();
    assert_eq!(upstream.subscriber_count(), 0);

    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    let a = counted.clone().subscribe(move |v| c_out.lock().unwrap().push(("a", v)));
    assert_eq!(upstream.subscriber_count(), 1);
    let c_out = out.clone();
    let b = counted.clone().subscribe(move |v| c_out.lock().unwrap().push(("b", v)));
    assert_eq!(upstream.subscriber_count(), 1);

    upstream.next(1);
    a.unsubscribe();
    assert_eq!(upstream.subscriber_count(), 1);
    upstream.next(2);
    b.unsubscribe();
    assert_eq!(upstream.subscriber_count(), 0);
    upstream.next(3);

    assert_eq!(*out.lock().unwrap(), vec![("a", 1), ("b", 1), ("b", 2)]);
  }
}
