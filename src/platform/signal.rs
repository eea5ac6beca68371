//! POSIX termination requests using SIGTERM/SIGKILL

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Sends SIGTERM (or SIGKILL when `force`) to `pid_raw` only, never to its
/// process group. Returns whether the signal was delivered.
pub fn request_termination(pid_raw: i32, force: bool) -> bool {
    if pid_raw <= 0 {
        return false;
    }
    let signal = if force {
        Signal::SIGKILL
    } else {
        Signal::SIGTERM
    };
    match kill(Pid::from_raw(pid_raw), signal) {
        Ok(()) => true,
        Err(Errno::ESRCH) => {
            log::debug!("PID {} already exited", pid_raw);
            false
        }
        Err(Errno::EPERM) => {
            log::warn!("Permission denied sending {:?} to PID {}", signal, pid_raw);
            false
        }
        Err(err) => {
            log::warn!("Failed to send {:?} to PID {}: {}", signal, pid_raw, err);
            false
        }
    }
}
