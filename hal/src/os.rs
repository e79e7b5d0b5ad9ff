//! OS mutex seam and a spin-based reference implementation

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

/// How long `pend` may suspend the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Fail immediately if the mutex is held
    NoWait,
    /// Wait up to the given number of milliseconds
    Bounded(u32),
    /// Block until the mutex is released
    Forever,
}

impl From<u32> for WaitPolicy {
    /// OS-style wait argument: 0 returns immediately, `u32::MAX` waits forever.
    fn from(ms: u32) -> Self {
        match ms {
            0 => Self::NoWait,
            u32::MAX => Self::Forever,
            ms => Self::Bounded(ms),
        }
    }
}

/// OS mutex errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsError {
    /// Mutex not obtained within the wait policy
    Timeout,
    /// Release of a mutex that is not held
    NotOwner,
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "mutex wait timed out"),
            Self::NotOwner => write!(f, "mutex not held"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OsError {}

#[cfg(feature = "defmt")]
impl defmt::Format for OsError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::NotOwner => defmt::write!(fmt, "NotOwner"),
        }
    }
}

pub type OsResult<T> = Result<T, OsError>;

/// Host OS mutex guarding a device
pub trait OsMutex {
    /// Whether the scheduler is running. Before that, callers skip `pend`/`release`.
    fn scheduler_started(&self) -> bool {
        true
    }

    /// Whether the calling task already holds the mutex
    fn held_by_caller(&self) -> bool {
        false
    }

    /// Acquire the mutex under `wait`
    fn pend(&self, wait: WaitPolicy) -> OsResult<()>;

    /// Release a previously acquired mutex
    fn release(&self) -> OsResult<()>;
}

impl<T: OsMutex + ?Sized> OsMutex for &T {
    fn scheduler_started(&self) -> bool {
        (**self).scheduler_started()
    }

    fn held_by_caller(&self) -> bool {
        (**self).held_by_caller()
    }

    fn pend(&self, wait: WaitPolicy) -> OsResult<()> {
        (**self).pend(wait)
    }

    fn release(&self) -> OsResult<()> {
        (**self).release()
    }
}

/// Returns an identifier of the calling task. `u32::MAX` is reserved.
pub type TaskId = fn() -> u32;

const NO_OWNER: u32 = u32::MAX;

const fn single_context() -> u32 {
    0
}

/// Non-recursive mutex built on an atomic flag
///
/// Bounded waits retry once per millisecond using the supplied delay. The
/// owner is recorded through a [`TaskId`] hook; with [`new`](Self::new) every
/// caller counts as the same task.
pub struct SpinOsMutex<D> {
    locked: AtomicBool,
    owner: AtomicU32,
    started: AtomicBool,
    delay: spin::Mutex<D>,
    task_id: TaskId,
}

impl<D: DelayNs> SpinOsMutex<D> {
    /// Create an unlocked mutex with the scheduler marked as started.
    pub const fn new(delay: D) -> Self {
        Self::with_task_id(delay, single_context)
    }

    /// Create an unlocked mutex that tells tasks apart with `task_id`.
    pub const fn with_task_id(delay: D, task_id: TaskId) -> Self {
        Self {
            locked: AtomicBool::new(false),
            owner: AtomicU32::new(NO_OWNER),
            started: AtomicBool::new(true),
            delay: spin::Mutex::new(delay),
            task_id,
        }
    }

    pub fn set_scheduler_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> bool {
        let acquired = self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok();
        if acquired {
            self.owner.store((self.task_id)(), Ordering::Release);
        }
        acquired
    }

    fn pause_ms(&self) {
        self.delay.lock().delay_ms(1);
    }
}

impl<D: DelayNs> OsMutex for SpinOsMutex<D> {
    fn scheduler_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn held_by_caller(&self) -> bool {
        self.is_locked() && self.owner.load(Ordering::Acquire) == (self.task_id)()
    }

    fn pend(&self, wait: WaitPolicy) -> OsResult<()> {
        if self.try_acquire() {
            return Ok(());
        }
        match wait {
            WaitPolicy::NoWait => Err(OsError::Timeout),
            WaitPolicy::Bounded(ms) => {
                for _ in 0..ms {
                    self.pause_ms();
                    if self.try_acquire() {
                        return Ok(());
                    }
                }
                Err(OsError::Timeout)
            }
            WaitPolicy::Forever => {
                while !self.try_acquire() {
                    self.pause_ms();
                }
                Ok(())
            }
        }
    }

    /// Fails with `NotOwner` if the mutex is free or held by another task.
    fn release(&self) -> OsResult<()> {
        if !self.held_by_caller() {
            return Err(OsError::NotOwner);
        }
        self.owner.store(NO_OWNER, Ordering::Release);
        self.locked.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingDelay {
        calls: Arc<AtomicU32>,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, _ns: u32) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct SleepDelay;

    impl DelayNs for SleepDelay {
        fn delay_ns(&mut self, ns: u32) {
            thread::sleep(Duration::from_nanos(ns as u64));
        }
    }

    #[test]
    fn wait_policy_from_os_ticks() {
        assert_eq!(WaitPolicy::from(0), WaitPolicy::NoWait);
        assert_eq!(WaitPolicy::from(25), WaitPolicy::Bounded(25));
        assert_eq!(WaitPolicy::from(u32::MAX), WaitPolicy::Forever);
    }

    #[test]
    fn pend_and_release() {
        let mutex = SpinOsMutex::new(CountingDelay::default());
        assert!(mutex.pend(WaitPolicy::NoWait).is_ok());
        assert!(mutex.is_locked());
        assert!(mutex.release().is_ok());
        assert!(!mutex.is_locked());
    }

    #[test]
    fn no_wait_fails_without_delay_when_held() {
        let calls = Arc::new(AtomicU32::new(0));
        let mutex = SpinOsMutex::new(CountingDelay { calls: calls.clone() });
        mutex.pend(WaitPolicy::NoWait).unwrap();

        assert_eq!(mutex.pend(WaitPolicy::NoWait), Err(OsError::Timeout));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn bounded_wait_retries_once_per_millisecond() {
        let calls = Arc::new(AtomicU32::new(0));
        let mutex = SpinOsMutex::new(CountingDelay { calls: calls.clone() });
        mutex.pend(WaitPolicy::NoWait).unwrap();

        assert_eq!(mutex.pend(WaitPolicy::Bounded(5)), Err(OsError::Timeout));
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn release_without_pend_is_rejected() {
        let mutex = SpinOsMutex::new(CountingDelay::default());
        assert_eq!(mutex.release(), Err(OsError::NotOwner));
    }

    #[test]
    fn forever_waits_for_other_thread() {
        let mutex = Arc::new(SpinOsMutex::new(SleepDelay));
        mutex.pend(WaitPolicy::NoWait).unwrap();

        let holder = Arc::clone(&mutex);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            holder.release().unwrap();
        });

        assert!(mutex.pend(WaitPolicy::Forever).is_ok());
        handle.join().unwrap();
        assert!(mutex.is_locked());
    }

    fn thread_task_id() -> u32 {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        thread_local! {
            static ID: u32 = NEXT.fetch_add(1, Ordering::Relaxed);
        }
        ID.with(|id| *id)
    }

    #[test]
    fn holder_is_recognised() {
        let mutex = Arc::new(SpinOsMutex::with_task_id(SleepDelay, thread_task_id));
        assert!(!mutex.held_by_caller());
        mutex.pend(WaitPolicy::NoWait).unwrap();
        assert!(mutex.held_by_caller());

        let other = Arc::clone(&mutex);
        let seen = thread::spawn(move || (other.held_by_caller(), other.release()))
            .join()
            .unwrap();
        assert_eq!(seen, (false, Err(OsError::NotOwner)));

        mutex.release().unwrap();
        assert!(!mutex.held_by_caller());
    }

    #[test]
    fn single_context_mutex_treats_callers_alike() {
        let mutex = SpinOsMutex::new(CountingDelay::default());
        mutex.pend(WaitPolicy::NoWait).unwrap();
        assert!(mutex.held_by_caller());
    }

    #[test]
    fn scheduler_flag_is_adjustable() {
        let mutex = SpinOsMutex::new(CountingDelay::default());
        assert!(mutex.scheduler_started());
        mutex.set_scheduler_started(false);
        assert!(!mutex.scheduler_started());
    }
}
