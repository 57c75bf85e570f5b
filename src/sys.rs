//! Safe wrappers for platform-specific unsafe operations.
//!
//! Every `unsafe` block in the codebase lives here. Call sites use the safe
//! public API and never touch `unsafe` directly.

use std::sync::atomic::{AtomicBool, Ordering};

/// Run a closure with stderr temporarily redirected to `/dev/null`.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
pub fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Safe as long as no other thread is concurrently manipulating fd 2.
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Set an environment variable.
///
/// # Safety
/// Caller must ensure no other threads are reading environment variables
/// concurrently; call before spawning threads.
pub fn set_env(key: &str, value: &str) {
    // SAFETY: Caller must ensure no other threads are reading environment
    // variables concurrently.
    unsafe {
        std::env::set_var(key, value);
    }
}

static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn sigint_handler(_signal: libc::c_int) {
    // Only an atomic store: the handler must stay async-signal-safe.
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Install a SIGINT handler that sets a flag instead of killing the process.
///
/// # Safety
/// `libc::signal` with a handler that only stores to an atomic is
/// async-signal-safe.
pub fn install_sigint_handler() {
    // SAFETY: The handler only performs an atomic store.
    unsafe {
        libc::signal(libc::SIGINT, sigint_handler as libc::sighandler_t);
    }
}

/// Whether SIGINT has been received since the handler was installed.
pub fn sigint_received() -> bool {
    SIGINT_RECEIVED.load(Ordering::SeqCst)
}
