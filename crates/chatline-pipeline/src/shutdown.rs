// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded waits for background threads.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Interval between liveness checks while waiting for a thread.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Waits up to `timeout` for `handle` to finish, checking every
/// [`POLL_INTERVAL`]. Returns whether the thread finished. A thread still
/// running at the deadline is left detached.
pub fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if handle.is_finished() {
            if handle.join().is_err() {
                warn!("background thread panicked");
            }
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            warn!(timeout = ?timeout, "background thread still running after timeout, continuing");
            return false;
        }
        debug!("waiting for background thread to exit");
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn finished_thread_joins_immediately() {
        let handle = thread::spawn(|| {});
        assert!(join_with_timeout(handle, Duration::from_secs(1)));
    }

    #[test]
    fn stuck_thread_times_out() {
        let release = Arc::new(AtomicBool::new(false));
        let flag = release.clone();
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
        });
        let started = Instant::now();
        assert!(!join_with_timeout(handle, Duration::from_millis(250)));
        assert!(started.elapsed() >= Duration::from_millis(250));
        release.store(true, Ordering::Relaxed);
    }
}
