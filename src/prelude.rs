//! Everything needed to build and subscribe to pipelines.

pub use crate::{
  error::RxError,
  observable::{
    self, BoxedObservable, BoxedObservableClone, ConnectableObservable, Connection,
    CoreObservable, Observable, ObservableType,
  },
  observer::{BoxedObserver, CallbackObserver, Emitter, FnMutObserver, Notification, Observer},
  ops::{GroupedObservable, RetryConfig, RetryPolicy, TimeIntervalValue, Timestamped},
  scheduler::{
    CurrentThreadScheduler, DefaultScheduler, Duration, ImmediateScheduler, Instant, MainLoop,
    MainThreadScheduler, Scheduler, Task, TaskHandle, TaskState, TestScheduler,
  },
  subject::{AsyncSubject, BaseSubject, BehaviorSubject, ReplaySubject, Subject},
  subscription::{
    ClosureSubscription, CompositeSubscription, SerialSubscription, Subscription,
    SubscriptionGuard,
  },
};
#[cfg(feature = "thread-pool")]
pub use crate::scheduler::ThreadPoolScheduler;
