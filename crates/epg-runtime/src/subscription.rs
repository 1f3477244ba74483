#![forbid(unsafe_code)]

//! Timer subscriptions on background threads.
//!
//! A [`Subscription`] runs on its own thread and sends messages through an
//! `mpsc` channel until its [`StopSignal`] fires or the receiver goes away.
//! [`spawn`] starts one and returns a [`SubscriptionHandle`] that stops it.
//!
//! The "now" tick is an [`Every`] subscription on the data side.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// A subscription produces messages from an external event source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Send messages through `sender` until `stop` fires or the channel closes.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// Signal for stopping a background loop.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// Whether the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out. Spurious wakeups
    /// keep waiting for the remainder of `duration`.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

/// The owner side of a [`StopSignal`].
#[derive(Debug)]
pub struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    /// Signal the loop to stop.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }
}

/// A running subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    name: &'static str,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Stop the subscription and join its thread.
    pub fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::warn!(subscription = self.name, "subscription thread panicked");
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.trigger.stop();
        // No join here; dropping must not block.
    }
}

/// Start `sub` on a background thread.
pub fn spawn<M, S>(sub: S, sender: mpsc::Sender<M>) -> SubscriptionHandle
where
    M: Send + 'static,
    S: Subscription<M> + 'static,
{
    let name = sub.name();
    let (signal, trigger) = StopSignal::new();
    tracing::debug!(subscription = name, "starting subscription");
    let thread = thread::spawn(move || sub.run(sender, signal));
    SubscriptionHandle {
        name,
        trigger,
        thread: Some(thread),
    }
}

/// A subscription that fires at a fixed interval.
pub struct Every<M: Send + 'static> {
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// Create a tick subscription with the given interval and message factory.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        Self {
            interval,
            make_msg: Box::new(make_msg),
        }
    }

    /// Tick interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn name(&self) -> &'static str {
        "every"
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let mut tick_count: u64 = 0;
        loop {
            if stop.wait_timeout(self.interval) {
                break;
            }
            tick_count += 1;
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
        tracing::debug!(
            interval_ms = self.interval.as_millis() as u64,
            ticks = tick_count,
            "subscription stopped"
        );
    }
}
