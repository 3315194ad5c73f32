//! Local task spawning, timers and the last-payload-wins debouncer behind mirror scheduling.

use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    time::Duration,
};

use futures::{
    channel::oneshot,
    future::{abortable, AbortHandle, LocalBoxFuture},
    task::{LocalFutureObj, LocalSpawn, LocalSpawnExt, SpawnError},
};

/// Boxed `!Send` timer future.
pub type TimerFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Source of one-shot delays for debounced work.
pub trait MirrorTimer {
    /// Resolves once `delay` has elapsed.
    fn sleep(&self, delay: Duration) -> TimerFuture;
}

#[derive(Debug, Clone, Copy, Default)]
/// Spawner for hosts without a local executor; every spawn is rejected.
pub struct NoopSpawner;

impl LocalSpawn for NoopSpawner {
    fn spawn_local_obj(
        &self,
        _future: LocalFutureObj<'static, ()>,
    ) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}

#[derive(Debug, Clone, Default)]
/// Timer whose sleeps only resolve when the owner calls [`ManualTimer::fire`].
pub struct ManualTimer {
    waiters: Rc<RefCell<Vec<(Duration, oneshot::Sender<()>)>>>,
}

impl ManualTimer {
    /// Resolves every sleep still being awaited and returns how many were woken.
    pub fn fire(&self) -> usize {
        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        waiters
            .into_iter()
            .filter_map(|(_, waiter)| waiter.send(()).ok())
            .count()
    }

    /// Number of sleeps whose futures are still alive.
    pub fn armed(&self) -> usize {
        self.waiters
            .borrow()
            .iter()
            .filter(|(_, waiter)| !waiter.is_canceled())
            .count()
    }

    /// Sleeps registered since the last fire, including ones whose futures were dropped.
    pub fn registered(&self) -> usize {
        self.waiters.borrow().len()
    }

    /// Delays requested by live sleeps, oldest first.
    pub fn armed_delays(&self) -> Vec<Duration> {
        self.waiters
            .borrow()
            .iter()
            .filter(|(_, waiter)| !waiter.is_canceled())
            .map(|(delay, _)| *delay)
            .collect()
    }
}

impl MirrorTimer for ManualTimer {
    fn sleep(&self, delay: Duration) -> TimerFuture {
        let (sender, receiver) = oneshot::channel();
        self.waiters.borrow_mut().push((delay, sender));
        Box::pin(async move {
            let _ = receiver.await;
        })
    }
}

type DebouncedAction<T> = Rc<dyn Fn(T) -> LocalBoxFuture<'static, ()>>;

/// Runs an action once per quiet window with the most recently scheduled payload.
///
/// Rescheduling aborts the pending wait; an action that already started runs to completion.
pub struct Debouncer<T> {
    spawner: Rc<dyn LocalSpawn>,
    timer: Rc<dyn MirrorTimer>,
    action: DebouncedAction<T>,
    pending: RefCell<Option<AbortHandle>>,
}

impl<T: 'static> Debouncer<T> {
    /// Creates a debouncer that spawns its waits on `spawner`.
    pub fn new<F>(spawner: Rc<dyn LocalSpawn>, timer: Rc<dyn MirrorTimer>, action: F) -> Self
    where
        F: Fn(T) -> LocalBoxFuture<'static, ()> + 'static,
    {
        Self {
            spawner,
            timer,
            action: Rc::new(action),
            pending: RefCell::new(None),
        }
    }

    /// Replaces any pending payload with `payload` and rearms the wait.
    pub fn schedule(&self, payload: T, delay: Duration) {
        self.cancel();

        let timer = Rc::clone(&self.timer);
        let (wait, handle) = abortable(async move { timer.sleep(delay).await });
        let action = Rc::clone(&self.action);
        let task = async move {
            if wait.await.is_ok() {
                action(payload).await;
            }
        };

        match self.spawner.spawn_local(task) {
            Ok(()) => *self.pending.borrow_mut() = Some(handle),
            Err(err) => tracing::debug!(error = %err, "debounced task could not be spawned"),
        }
    }

    /// Drops the pending payload without running the action.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.borrow_mut().take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
