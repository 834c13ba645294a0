//! # Single-Flight Guard
//!
//! Boolean overlap protection for periodic work. A slow tick must never be
//! joined by the next timer firing; the second caller observes the raised
//! flag and returns without doing anything.

use std::sync::atomic::{AtomicBool, Ordering};

/// RAII guard over an `AtomicBool` in-flight flag.
///
/// [`FlightGuard::acquire`] raises the flag and returns `None` if it was
/// already raised. Dropping the guard lowers the flag again on every exit
/// path, early returns and error paths included.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    /// Try to raise the flag. `None` means another flight is in progress.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
