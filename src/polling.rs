//! Background sampling loop shared by all polling drivers.
use crate::error::LifecycleError;
use crossbeam_channel::{select, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// One sampling step of a polling driver.
pub(crate) trait Sample: Send + Sync + 'static {
    /// Take one sample and publish whatever events it produces.
    fn sample(&self);
}

struct Running {
    halt: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the polling thread of one driver: `Stopped -> Running -> Stopped`.
pub(crate) struct Poller {
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    /// Spawn the sampling thread.  Each iteration samples once, then waits for either the
    /// interval to elapse or a halt request, whichever comes first.
    pub fn start<S: Sample>(&self, name: &str, sampler: Arc<S>) -> Result<(), LifecycleError> {
        let mut running = self.lock();
        if running.is_some() {
            return Err(LifecycleError::AlreadyRunning);
        }

        let (halt, halted) = crossbeam_channel::bounded::<()>(1);
        let interval = self.interval;
        let handle = std::thread::Builder::new()
            .name(format!("poll-{name}"))
            .spawn(move || loop {
                sampler.sample();
                let halt_requested = select! {
                    recv(halted) -> _ => true,
                    default(interval) => false,
                };
                if halt_requested {
                    break;
                }
            })
            .map_err(|e| LifecycleError::Spawn(e.to_string()))?;

        tracing::debug!(name, ?interval, "polling started");
        *running = Some(Running { halt, handle });
        Ok(())
    }

    /// Ask the sampling thread to stop and wait until it has exited.
    ///
    /// When this returns no further events are published.
    pub fn halt(&self) -> Result<(), LifecycleError> {
        let Running { halt, handle } = self.lock().take().ok_or(LifecycleError::AlreadyStopped)?;
        // disconnecting wakes the loop just as well as a message would
        drop(halt);
        handle.join().map_err(|_| LifecycleError::Panicked)?;
        tracing::debug!("polling stopped");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        lock(&self.running)
    }
}

/// Lock `m`, recovering the data if another thread panicked while holding it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Poller {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.halt();
        }
    }
}
