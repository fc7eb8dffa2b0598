//! Observable core traits and factories.
//!
//! An observable is a value describing how to produce a sequence. Nothing
//! runs until it is subscribed: [`CoreObservable::actual_subscribe`] consumes
//! the observable together with an observer and returns a
//! [`Subscription`] that tears the running sequence down.
//!
//! Observables are cold by default. Subscribing to two clones of the same
//! pipeline runs the producer twice, independently. Subjects and connectable
//! observables are the hot primitives.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rxcore::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! observable::range(1, 5)
//!   .filter(|v| v % 2 == 1)
//!   .map(|v| v * 10)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![10, 30, 50]);
//! ```

mod boxed;
mod connectable;
mod create;
mod defer;
mod from_event;
mod from_iter;
mod interval;
mod of;
mod start;
mod timer;
mod trivial;

pub use boxed::{BoxedObservable, BoxedObservableClone, DynObservable, DynObservableClone};
pub use connectable::{ConnectableObservable, Connection, RefCount, RefCountSubscription};
pub use create::{Create, CreateEmitter, CreateSubscription, create};
pub use defer::{Defer, defer};
pub use from_event::{EventHandler, FromEvent, FromEventSubscription, from_event};
pub use from_iter::{FromIter, from_iter, range, repeat};
pub use interval::{interval, interval_on};
pub use of::{Of, of};
pub use start::{Start, start, start_on, to_async, to_async_on};
pub use timer::{Timer, timer, timer_on, timer_periodic, timer_periodic_on};
pub use trivial::{Empty, Never, Throw, empty, never, throw};

use crate::{
  error::RxError,
  observer::{CallbackObserver, FnMutObserver},
  ops::{
    amb::Amb,
    buffer::BufferCount,
    buffer_time::BufferTime,
    cast::{Cast, OfType},
    catch::Catch,
    collect::Collect,
    combine_latest::CombineLatest,
    concat::{Concat, ConcatAll},
    delay::Delay,
    distinct::{Distinct, DistinctBy, DistinctUntilChanged},
    element::{Element, Rule},
    filter::Filter,
    finalize::Finalize,
    flat_map::FlatMap,
    group_by::GroupBy,
    map::Map,
    merge::{Merge, MergeAll},
    observe_on::ObserveOn,
    reduce::{Reduce, ReduceInitial},
    retry::{Forever, Resubscribe, RetryPolicy, Trigger},
    sample::Sample,
    skip::{Skip, SkipUntil, SkipWhile},
    start_with::StartWith,
    subscribe_on::SubscribeOn,
    switch_map::SwitchMap,
    take::{Take, TakeLast, TakeUntil, TakeWhile},
    tap::Tap,
    throttle::Throttle,
    timestamp::{TimeInterval, Timestamp},
    timeout::Timeout,
    zip::Zip,
  },
  scheduler::{DefaultScheduler, Duration, Scheduler},
  subject::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject},
  subscription::Subscription,
};

// ============================================================================
// Core traits
// ============================================================================

/// Names the item and error types an observable produces.
pub trait ObservableType {
  type Item;
  type Err;
}

/// An observable that can be subscribed by an observer of type `O`.
///
/// Operators implement this once, generically over `O`, wrapping the
/// observer they receive and subscribing their source with the wrapper.
pub trait CoreObservable<O>: ObservableType {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

// ============================================================================
// Combinators over many sources
// ============================================================================

/// Subscribes to every source at once and forwards values in arrival order.
pub fn merge_all<S, I>(sources: I) -> MergeAll<S>
where
  I: IntoIterator<Item = S>,
  S: ObservableType,
{
  MergeAll { sources: sources.into_iter().collect() }
}

/// Subscribes to the sources one after another.
pub fn concat_all<S, I>(sources: I) -> ConcatAll<S>
where
  I: IntoIterator<Item = S>,
  S: ObservableType,
{
  ConcatAll { sources: sources.into_iter().collect() }
}

/// Mirrors whichever source notifies first.
pub fn amb_all<S, I>(sources: I) -> Amb<S>
where
  I: IntoIterator<Item = S>,
  S: ObservableType,
{
  Amb { sources: sources.into_iter().collect() }
}

fn identity<T>(value: T) -> T { value }

// ============================================================================
// Observable extension trait
// ============================================================================

/// Subscription helpers and the operator set, available on every
/// observable.
pub trait Observable: ObservableType + Sized {
  // ==================== Subscribing ====================

  /// Subscribes with a `next` handler only. Errors and completion are
  /// dropped.
  fn subscribe<N>(self, next: N) -> <Self as CoreObservable<FnMutObserver<N>>>::Unsub
  where
    N: FnMut(Self::Item),
    Self: CoreObservable<FnMutObserver<N>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  fn subscribe_err<N, E>(
    self, next: N, error: E,
  ) -> <Self as CoreObservable<CallbackObserver<N, E, fn()>>>::Unsub
  where
    N: FnMut(Self::Item),
    E: FnOnce(Self::Err),
    Self: CoreObservable<CallbackObserver<N, E, fn()>>,
  {
    self.actual_subscribe(CallbackObserver::with_error(next, error))
  }

  fn subscribe_complete<N, C>(
    self, next: N, complete: C,
  ) -> <Self as CoreObservable<CallbackObserver<N, fn(<Self as ObservableType>::Err), C>>>::Unsub
  where
    N: FnMut(Self::Item),
    C: FnOnce(),
    Self: CoreObservable<CallbackObserver<N, fn(<Self as ObservableType>::Err), C>>,
  {
    self.actual_subscribe(CallbackObserver::with_complete(next, complete))
  }

  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as CoreObservable<CallbackObserver<N, E, C>>>::Unsub
  where
    N: FnMut(Self::Item),
    E: FnOnce(Self::Err),
    C: FnOnce(),
    Self: CoreObservable<CallbackObserver<N, E, C>>,
  {
    self.actual_subscribe(CallbackObserver::new(next, error, complete))
  }

  /// Subscribes a hand-written observer.
  fn subscribe_with<O>(self, observer: O) -> <Self as CoreObservable<O>>::Unsub
  where
    Self: CoreObservable<O>,
  {
    self.actual_subscribe(observer)
  }

  // ==================== Projection & filtering ====================

  fn map<Out, F>(self, func: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> Out,
  {
    Map { source: self, func }
  }

  fn filter<F>(self, filter: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    Filter { source: self, filter }
  }

  /// Runs `f` for every value before passing it on.
  #[doc(alias = "do")]
  fn tap<F>(self, f: F) -> Tap<Self, F, fn(&Self::Err), fn()>
  where
    F: FnMut(&Self::Item),
  {
    Tap::next_only(self, f)
  }

  fn tap_all<N, E, C>(self, next: N, error: E, complete: C) -> Tap<Self, N, E, C>
  where
    N: FnMut(&Self::Item),
    E: FnOnce(&Self::Err),
    C: FnOnce(),
  {
    Tap { source: self, next, error, complete }
  }

  fn skip(self, count: usize) -> Skip<Self> { Skip { source: self, count } }

  fn skip_while<F>(self, predicate: F) -> SkipWhile<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    SkipWhile { source: self, predicate }
  }

  /// Drops values until `notifier` emits its first value.
  fn skip_until<N>(self, notifier: N) -> SkipUntil<Self, N>
  where
    N: ObservableType<Err = Self::Err>,
  {
    SkipUntil { source: self, notifier }
  }

  fn take(self, count: usize) -> Take<Self> { Take { source: self, count } }

  fn take_while<F>(self, predicate: F) -> TakeWhile<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    TakeWhile { source: self, predicate }
  }

  /// Completes as soon as `notifier` emits its first value.
  fn take_until<N>(self, notifier: N) -> TakeUntil<Self, N>
  where
    N: ObservableType<Err = Self::Err>,
  {
    TakeUntil { source: self, notifier }
  }

  /// Emits the last `count` values once the source completes.
  fn take_last(self, count: usize) -> TakeLast<Self> { TakeLast { source: self, count } }

  fn start_with<I>(self, values: I) -> StartWith<Self>
  where
    I: IntoIterator<Item = Self::Item>,
  {
    StartWith { source: self, values: values.into_iter().collect() }
  }

  // ==================== Combination ====================

  fn merge<B>(self, other: B) -> Merge<Self, B>
  where
    B: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    Merge { first: self, second: other }
  }

  /// Subscribes to `other` once `self` completed.
  fn concat<B>(self, other: B) -> Concat<Self, B>
  where
    B: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    Concat { first: self, second: other }
  }

  fn amb(self, other: Self) -> Amb<Self> { Amb { sources: vec![self, other] } }

  /// Pairs values by position: the n-th value of `self` with the n-th
  /// value of `other`.
  fn zip<B>(self, other: B) -> Zip<Self, B>
  where
    B: ObservableType<Err = Self::Err>,
  {
    Zip { first: self, second: other }
  }

  fn combine_latest<B, Out, F>(self, other: B, func: F) -> CombineLatest<Self, B, F>
  where
    B: ObservableType<Err = Self::Err>,
    F: FnMut(Self::Item, B::Item) -> Out,
  {
    CombineLatest { first: self, second: other, func }
  }

  /// Maps every value to an inner observable and merges all of them.
  #[doc(alias = "select_many")]
  fn flat_map<Inner, F>(self, func: F) -> FlatMap<Self, F>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: ObservableType<Err = Self::Err>,
  {
    FlatMap { source: self, func }
  }

  /// Maps every value to an inner observable and mirrors only the most
  /// recent one.
  fn switch_map<Inner, F>(self, func: F) -> SwitchMap<Self, F>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: ObservableType<Err = Self::Err>,
  {
    SwitchMap { source: self, func }
  }

  /// Flattens an observable of observables, mirroring only the most recent
  /// inner one.
  fn switch(self) -> SwitchMap<Self, fn(Self::Item) -> Self::Item>
  where
    Self::Item: ObservableType<Err = Self::Err>,
  {
    SwitchMap { source: self, func: identity::<Self::Item> }
  }

  // ==================== Aggregation ====================

  /// Folds the values, using the first one as the initial accumulator.
  #[doc(alias = "aggregate")]
  fn reduce<F>(self, func: F) -> Reduce<Self, F>
  where
    F: FnMut(Self::Item, Self::Item) -> Self::Item,
  {
    Reduce { source: self, func }
  }

  fn reduce_initial<Acc, F>(self, initial: Acc, func: F) -> ReduceInitial<Self, Acc, F>
  where
    F: FnMut(Acc, Self::Item) -> Acc,
  {
    ReduceInitial { source: self, initial, func }
  }

  /// Gathers every value into a collection emitted on completion.
  fn collect<C>(self) -> Collect<Self, C>
  where
    C: Default + Extend<Self::Item>,
  {
    Collect { source: self, collection: C::default() }
  }

  #[doc(alias = "to_array")]
  #[doc(alias = "to_list")]
  fn to_vec(self) -> Collect<Self, Vec<Self::Item>> { self.collect() }

  fn first(self) -> Element<Self, Self::Item> { Element::new(self, Rule::First, None) }

  fn first_or(self, default: Self::Item) -> Element<Self, Self::Item> {
    Element::new(self, Rule::First, Some(default))
  }

  fn first_or_default(self) -> Element<Self, Self::Item>
  where
    Self::Item: Default,
  {
    self.first_or(Self::Item::default())
  }

  fn last(self) -> Element<Self, Self::Item> { Element::new(self, Rule::Last, None) }

  fn last_or(self, default: Self::Item) -> Element<Self, Self::Item> {
    Element::new(self, Rule::Last, Some(default))
  }

  fn last_or_default(self) -> Element<Self, Self::Item>
  where
    Self::Item: Default,
  {
    self.last_or(Self::Item::default())
  }

  fn single(self) -> Element<Self, Self::Item> { Element::new(self, Rule::Single, None) }

  fn single_or(self, default: Self::Item) -> Element<Self, Self::Item> {
    Element::new(self, Rule::Single, Some(default))
  }

  fn single_or_default(self) -> Element<Self, Self::Item>
  where
    Self::Item: Default,
  {
    self.single_or(Self::Item::default())
  }

  // ==================== Deduplication & grouping ====================

  fn distinct(self) -> Distinct<Self> { Distinct { source: self } }

  fn distinct_by<K, F>(self, key: F) -> DistinctBy<Self, F>
  where
    F: FnMut(&Self::Item) -> K,
  {
    DistinctBy { source: self, key }
  }

  fn distinct_until_changed(self) -> DistinctUntilChanged<Self> {
    DistinctUntilChanged { source: self }
  }

  fn group_by<K, F>(self, key: F) -> GroupBy<Self, F>
  where
    F: FnMut(&Self::Item) -> K,
  {
    GroupBy { source: self, key }
  }

  // ==================== Buffering ====================

  /// Emits the values in chunks of `count`. A `count` of zero is treated as
  /// one.
  fn buffer_count(self, count: usize) -> BufferCount<Self> {
    BufferCount { source: self, count: count.max(1) }
  }

  fn buffer_time(self, span: Duration) -> BufferTime<Self, DefaultScheduler> {
    self.buffer_time_on(span, DefaultScheduler)
  }

  fn buffer_time_on<SD: Scheduler>(self, span: Duration, scheduler: SD) -> BufferTime<Self, SD> {
    BufferTime { source: self, span, shift: span, scheduler }
  }

  /// Opens a window every `shift` and closes each one `span` after it opened.
  fn buffer_time_shift(
    self, span: Duration, shift: Duration,
  ) -> BufferTime<Self, DefaultScheduler> {
    self.buffer_time_shift_on(span, shift, DefaultScheduler)
  }

  fn buffer_time_shift_on<SD: Scheduler>(
    self, span: Duration, shift: Duration, scheduler: SD,
  ) -> BufferTime<Self, SD> {
    BufferTime { source: self, span, shift, scheduler }
  }

  // ==================== Time ====================

  fn sample(self, period: Duration) -> Sample<Self, DefaultScheduler> {
    self.sample_on(period, DefaultScheduler)
  }

  fn sample_on<SD: Scheduler>(self, period: Duration, scheduler: SD) -> Sample<Self, SD> {
    Sample { source: self, period, scheduler }
  }

  /// Emits a value once `quiet` passed without a newer one.
  #[doc(alias = "debounce")]
  fn throttle(self, quiet: Duration) -> Throttle<Self, DefaultScheduler> {
    self.throttle_on(quiet, DefaultScheduler)
  }

  #[doc(alias = "debounce_on")]
  fn throttle_on<SD: Scheduler>(self, quiet: Duration, scheduler: SD) -> Throttle<Self, SD> {
    Throttle { source: self, quiet, scheduler }
  }

  fn delay(self, delay: Duration) -> Delay<Self, DefaultScheduler> {
    self.delay_on(delay, DefaultScheduler)
  }

  fn delay_on<SD: Scheduler>(self, delay: Duration, scheduler: SD) -> Delay<Self, SD> {
    Delay { source: self, delay, scheduler }
  }

  /// Errors with [`RxError::Timeout`] when no value arrives within `window`.
  fn timeout(self, window: Duration) -> Timeout<Self, DefaultScheduler>
  where
    Self::Err: From<RxError>,
  {
    self.timeout_on(window, DefaultScheduler)
  }

  fn timeout_on<SD: Scheduler>(self, window: Duration, scheduler: SD) -> Timeout<Self, SD>
  where
    Self::Err: From<RxError>,
  {
    Timeout { source: self, window, scheduler }
  }

  fn timestamp(self) -> Timestamp<Self, DefaultScheduler> { self.timestamp_on(DefaultScheduler) }

  fn timestamp_on<SD: Scheduler>(self, scheduler: SD) -> Timestamp<Self, SD> {
    Timestamp { source: self, scheduler }
  }

  fn time_interval(self) -> TimeInterval<Self, DefaultScheduler> {
    self.time_interval_on(DefaultScheduler)
  }

  fn time_interval_on<SD: Scheduler>(self, scheduler: SD) -> TimeInterval<Self, SD> {
    TimeInterval { source: self, scheduler }
  }

  // ==================== Errors & lifecycle ====================

  /// Replaces an error with the observable `handler` builds from it.
  fn catch<R, F>(self, handler: F) -> Catch<Self, F>
  where
    F: FnOnce(Self::Err) -> R,
    R: ObservableType<Item = Self::Item>,
  {
    Catch { source: self, handler }
  }

  /// Resubscribes on error, at most `count` times.
  fn retry(self, count: usize) -> Resubscribe<Self, usize> { self.retry_with(count) }

  fn retry_forever(self) -> Resubscribe<Self, Forever> { self.retry_with(Forever) }

  /// Resubscribes on error as long as `policy` allows it.
  fn retry_with<P>(self, policy: P) -> Resubscribe<Self, P>
  where
    P: RetryPolicy<Self::Err>,
  {
    Resubscribe { source: self, policy, trigger: Trigger::Error }
  }

  /// Runs the source `count` times in total, back to back. The source
  /// always runs at least once.
  fn repeat(self, count: usize) -> Resubscribe<Self, usize> {
    Resubscribe { source: self, policy: count.saturating_sub(1), trigger: Trigger::Complete }
  }

  fn repeat_forever(self) -> Resubscribe<Self, Forever> {
    Resubscribe { source: self, policy: Forever, trigger: Trigger::Complete }
  }

  /// Runs `func` once, after the terminal event or on unsubscribe,
  /// whichever happens first.
  #[doc(alias = "finally")]
  fn finalize<F>(self, func: F) -> Finalize<Self, F>
  where
    F: FnOnce(),
  {
    Finalize { source: self, func }
  }

  // ==================== Type narrowing ====================

  /// Converts every value with `TryInto`, erroring on the first failure.
  fn cast<T>(self) -> Cast<Self, T>
  where
    Self::Item: TryInto<T>,
    Self::Err: From<RxError>,
  {
    Cast::new(self)
  }

  /// Converts every value with `TryInto`, dropping the ones that fail.
  fn of_type<T>(self) -> OfType<Self, T>
  where
    Self::Item: TryInto<T>,
  {
    OfType::new(self)
  }

  // ==================== Context switching ====================

  /// Delivers notifications through `scheduler`, in order.
  fn observe_on<SD: Scheduler>(self, scheduler: SD) -> ObserveOn<Self, SD> {
    ObserveOn { source: self, scheduler }
  }

  /// Subscribes to the source from a task on `scheduler`.
  fn subscribe_on<SD: Scheduler>(self, scheduler: SD) -> SubscribeOn<Self, SD> {
    SubscribeOn { source: self, scheduler }
  }

  // ==================== Hot conversion ====================

  fn multicast<Sub>(self, subject: Sub) -> ConnectableObservable<Self, Sub> {
    ConnectableObservable::new(self, subject)
  }

  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>> {
    self.multicast(Subject::new())
  }

  fn publish_behavior(
    self, seed: Self::Item,
  ) -> ConnectableObservable<Self, BehaviorSubject<Self::Item, Self::Err>> {
    self.multicast(BehaviorSubject::new(seed))
  }

  fn publish_last(self) -> ConnectableObservable<Self, AsyncSubject<Self::Item, Self::Err>> {
    self.multicast(AsyncSubject::new())
  }

  fn replay(self) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    self.multicast(ReplaySubject::unbounded())
  }

  fn replay_count(
    self, count: usize,
  ) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    self.multicast(ReplaySubject::with_count(count))
  }

  // ==================== Type erasure ====================

  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: DynObservable<Self::Item, Self::Err> + Send + 'static,
  {
    BoxedObservable::new(self)
  }

  fn box_it_clone(self) -> BoxedObservableClone<Self::Item, Self::Err>
  where
    Self: DynObservableClone<Self::Item, Self::Err> + Send + 'static,
  {
    BoxedObservableClone::new(self)
  }
}

impl<T: ObservableType> Observable for T {}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn cold_observable_runs_per_subscription() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let source = observable::range(0, 3).map(|v| v * 2);
    for _ in 0..2 {
      let log = log.clone();
      source.clone().subscribe(move |v| log.lock().unwrap().push(v));
    }
    assert_eq!(*log.lock().unwrap(), vec![0, 2, 4, 0, 2, 4]);
  }

  #[rxcore_macro::test]
  fn subscribe_family_reports_terminals() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::of(1).subscribe_complete(
      move |v| n.lock().unwrap().push(format!("next {v}")),
      move || c.lock().unwrap().push("complete".to_string()),
    );

    let (n, e) = (log.clone(), log.clone());
    observable::throw::<i32, _>(RxError::msg("boom")).subscribe_err(
      move |v| n.lock().unwrap().push(format!("next {v}")),
      move |err| e.lock().unwrap().push(format!("error {err}")),
    );
    assert_eq!(*log.lock().unwrap(), vec!["next 1", "complete", "error boom"]);
  }

  #[rxcore_macro::test]
  fn many_source_combinators() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    observable::concat_all(vec![observable::range(0, 2), observable::range(5, 1)])
      .subscribe(move |v| c_log.lock().unwrap().push(v));
    let c_log = log.clone();
    observable::merge_all(vec![observable::of(7), observable::of(8)])
      .subscribe(move |v| c_log.lock().unwrap().push(v));
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 5, 7, 8]);
  }
}
