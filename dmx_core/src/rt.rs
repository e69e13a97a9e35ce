//! Realtime scheduling helpers for the bridge threads.

/// Moves the calling thread into the `SCHED_FIFO` realtime class at
/// the given priority. A priority of 0 leaves the thread untouched.
///
/// Failure is logged and otherwise ignored; running without realtime
/// scheduling degrades timing but not correctness.
#[cfg(unix)]
pub fn promote_current_thread(priority: i32) {
    if priority == 0 {
        return;
    }

    let param = libc::sched_param {
        sched_priority: priority,
    };

    // SAFETY: pthread_self is always valid for the calling thread and
    // param outlives the call.
    let rc = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param) };
    if rc != 0 {
        log::warn!(
            "failed to set realtime priority {}: {}",
            priority,
            std::io::Error::from_raw_os_error(rc)
        );
    } else {
        log::debug!("thread promoted to SCHED_FIFO priority {}", priority);
    }
}

#[cfg(not(unix))]
pub fn promote_current_thread(priority: i32) {
    if priority != 0 {
        log::warn!("realtime thread priority is not supported on this platform");
    }
}
