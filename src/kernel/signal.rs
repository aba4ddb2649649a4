//! Async-safe signal handling for the evaluation loop, plus signal naming
//! for fault reports

use log::info;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Global shutdown flag (async-safe atomic)
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Global signal received (async-safe atomic)
static SIGNAL_RECEIVED: AtomicU32 = AtomicU32::new(0);

/// Signal handler state
pub struct SignalHandler;

impl SignalHandler {
    /// Install handlers for SIGINT, SIGTERM, SIGHUP.
    /// Must be called early in main() before any threads are spawned.
    pub fn init() -> Result<Self, String> {
        let sig_action = SigAction::new(
            SigHandler::Handler(Self::signal_handler),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        unsafe {
            signal::sigaction(Signal::SIGINT, &sig_action)
                .map_err(|e| format!("Failed to install SIGINT handler: {}", e))?;

            signal::sigaction(Signal::SIGTERM, &sig_action)
                .map_err(|e| format!("Failed to install SIGTERM handler: {}", e))?;

            signal::sigaction(Signal::SIGHUP, &sig_action)
                .map_err(|e| format!("Failed to install SIGHUP handler: {}", e))?;
        }

        info!("Signal handlers installed (SIGINT, SIGTERM, SIGHUP)");
        Ok(Self)
    }

    /// Only atomic stores: no allocation, locks or I/O
    extern "C" fn signal_handler(signal: libc::c_int) {
        SIGNAL_RECEIVED.store(signal as u32, Ordering::SeqCst);
        SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_requested(&self) -> bool {
        SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
    }

    /// Signal that was received (0 if none)
    pub fn get_signal(&self) -> u32 {
        SIGNAL_RECEIVED.load(Ordering::SeqCst)
    }
}

/// Put SIGINT, SIGTERM and SIGHUP back to their default action.
/// Forked children call this so the harness can terminate them.
pub fn restore_default_handlers() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: installing SIG_DFL has no handler code to run
        let _ = unsafe { signal::sigaction(sig, &default) };
    }
}

/// Main loop helper: false once a shutdown signal arrived
pub fn should_continue() -> bool {
    !SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Symbolic name for a raw signal number (`SIGSEGV`, ...), numeric fallback
pub fn signal_name(signal: i32) -> String {
    match Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("SIG{}", signal),
    }
}

/// Signals the kernel raises when an rlimit is exceeded
pub fn is_resource_limit_signal(signal: i32) -> bool {
    signal == libc::SIGXCPU || signal == libc::SIGXFSZ
}
