//! Signal delivery boundary.
//!
//! Kill actions are synchronous, fire-and-forget kill(2) calls issued from
//! the foreground thread; success surfaces as a bool, failures are logged
//! and never retried automatically.

use log::warn;

use crate::domain::Pid;

pub const SIGTERM: i32 = libc::SIGTERM;
pub const SIGKILL: i32 = libc::SIGKILL;

pub trait SignalSender {
    /// True when the signal was delivered. Delivery says nothing about
    /// whether the process actually exits.
    fn send(&self, pid: Pid, signal: i32) -> bool;
}

/// kill(2) implementation.
pub struct LibcSignals;

impl SignalSender for LibcSignals {
    fn send(&self, pid: Pid, signal: i32) -> bool {
        // SAFETY: kill(2) takes two plain integers and has no memory effects
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid.0, signal) };
        if rc != 0 {
            warn!(
                "failed to send signal {signal} to pid {pid}: {}",
                std::io::Error::last_os_error()
            );
        }
        rc == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_zero_probes_own_process() {
        // Signal 0 performs the permission check without delivering anything
        #[allow(clippy::cast_possible_wrap)]
        let own = Pid(std::process::id() as i32);
        assert!(LibcSignals.send(own, 0));
    }

    #[test]
    fn test_send_to_missing_process_reports_failure() {
        assert!(!LibcSignals.send(Pid(9_999_999), 0));
    }
}
