use crate::config::harness::IsolationConfig;
use crate::config::types::{HarnessError, Result};
use crate::exec::types::{Fault, IsolationOutcome, SlotIntegrity, SlotPayload};
use crate::kernel::{rlimit, signal};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, fork, pipe, setpgid, ForkResult, Pid};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::FromRawFd;
use std::os::unix::io::RawFd;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// Exit code of a child that could not write its result slot
const SLOT_WRITE_FAILED: i32 = 125;

const POLL_MIN: Duration = Duration::from_millis(1);
const POLL_MAX: Duration = Duration::from_millis(10);

fn to_process_error(prefix: &str, err: impl std::fmt::Display) -> HarnessError {
    HarnessError::Process(format!("{prefix}: {err}"))
}

fn write_json_to_fd<T: Serialize>(fd: RawFd, value: &T) -> std::io::Result<()> {
    let mut file = unsafe { File::from_raw_fd(fd) };
    let payload = serde_json::to_vec(value)?;
    file.write_all(&payload)?;
    file.flush()
}

fn read_fd_async(fd: RawFd, limit: usize) -> thread::JoinHandle<(Vec<u8>, SlotIntegrity)> {
    thread::spawn(move || {
        let mut file = unsafe { File::from_raw_fd(fd) };
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        let mut integrity = SlotIntegrity::Complete;

        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    // Keep draining past the limit so the writer never blocks
                    if integrity == SlotIntegrity::Overflowed || out.len() + n > limit {
                        integrity = SlotIntegrity::Overflowed;
                        continue;
                    }
                    out.extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    integrity = SlotIntegrity::ReadError;
                    break;
                }
            }
        }

        (out, integrity)
    })
}

/// SIGTERM the child's process group, wait `grace`, then SIGKILL it
fn terminate_child_group(child: Pid, grace: Duration) {
    if unsafe { libc::kill(-child.as_raw(), libc::SIGTERM) } != 0 {
        log::debug!(
            "group SIGTERM fallback for {}: {}",
            child,
            std::io::Error::last_os_error()
        );
        let _ = unsafe { libc::kill(child.as_raw(), libc::SIGTERM) };
    }

    thread::sleep(grace);

    if unsafe { libc::kill(-child.as_raw(), libc::SIGKILL) } != 0 {
        let _ = unsafe { libc::kill(child.as_raw(), libc::SIGKILL) };
    }
}

/// Body of the forked child; returns the code the child must `_exit` with
fn run_child<T, F>(slot: RawFd, config: &IsolationConfig, job: F) -> i32
where
    T: Serialize,
    F: FnOnce() -> Result<T>,
{
    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
    signal::restore_default_handlers();

    let payload: SlotPayload<T> = match rlimit::apply_child_limits(config) {
        Err(err) => SlotPayload::Failed(err.to_string()),
        Ok(()) => match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(value)) => SlotPayload::Value(value),
            Ok(Err(err)) => SlotPayload::Failed(err.to_string()),
            Err(_) => SlotPayload::Failed("job panicked inside isolated child".to_string()),
        },
    };

    match write_json_to_fd(slot, &payload) {
        Ok(()) => 0,
        Err(_) => SLOT_WRITE_FAILED,
    }
}

/// Runs jobs in forked children so a crash, hang, or runaway allocation in
/// player code is contained and reported as a [`Fault`].
///
/// The child inherits the parent's address space (loaded libraries, prepared
/// inputs) and reports its result through a bounded pipe, the result slot.
#[derive(Debug, Clone)]
pub struct IsolationRunner {
    config: IsolationConfig,
}

impl IsolationRunner {
    pub fn new(config: IsolationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IsolationConfig {
        &self.config
    }

    /// Budget for a single correctness invocation
    pub fn correctness_timeout(&self) -> Duration {
        Duration::from_millis(self.config.wall_timeout_ms)
    }

    /// Budget for a whole timing series
    pub fn timing_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timing_timeout_ms)
    }

    /// Run `job` in a fresh child and wait at most `timeout` for it.
    ///
    /// `Err` is reserved for failures of the harness itself: fork or pipe
    /// failure, or the job reporting an error. Anything the child does to
    /// itself comes back as [`IsolationOutcome::Faulted`].
    pub fn run<T, F>(&self, label: &str, timeout: Duration, job: F) -> Result<IsolationOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let (slot_read, slot_write) = pipe().map_err(|e| to_process_error("pipe(slot)", e))?;

        // The child allocates before `_exit`, so another thread holding a
        // lock (allocator, stderr) at fork time can wedge it. The binary
        // evaluates sequentially and the slot reader is spawned after fork,
        // so callers must fork from one thread at a time.
        let child = match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                let _ = close(slot_read);
                let code = run_child(slot_write, &self.config, job);
                unsafe { libc::_exit(code) }
            }
            Ok(ForkResult::Parent { child }) => child,
            Err(e) => {
                let _ = close(slot_read);
                let _ = close(slot_write);
                return Err(to_process_error("fork", e));
            }
        };

        // Also set from the parent so the group exists before any kill
        let _ = setpgid(child, child);
        let _ = close(slot_write);

        let reader = read_fd_async(slot_read, self.config.result_slot_bytes);
        let started = Instant::now();
        let mut poll = POLL_MIN;
        let mut timed_out = false;

        let status = loop {
            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {
                    if started.elapsed() > timeout {
                        timed_out = true;
                        terminate_child_group(child, Duration::from_millis(self.config.kill_grace_ms));
                        break self.reap(child)?;
                    }
                    thread::sleep(poll);
                    poll = (poll * 2).min(POLL_MAX);
                }
                Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => {
                    break status
                }
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(to_process_error("waitpid(child)", e)),
            }
        };
        let wall_time_ms = started.elapsed().as_millis() as u64;

        let (bytes, integrity) = reader
            .join()
            .unwrap_or_else(|_| (Vec::new(), SlotIntegrity::ReadError));

        let outcome = if timed_out {
            IsolationOutcome::Faulted(Fault::TimedOut {
                after_ms: timeout.as_millis() as u64,
            })
        } else {
            classify_exit(status, &bytes, integrity, wall_time_ms)?
        };

        match &outcome {
            IsolationOutcome::Completed { wall_time_ms, .. } => {
                log::debug!("[{}] child {} completed in {}ms", label, child, wall_time_ms)
            }
            IsolationOutcome::Faulted(fault) => {
                log::warn!("[{}] child {} faulted: {}", label, child, fault)
            }
        }

        Ok(outcome)
    }

    fn reap(&self, child: Pid) -> Result<WaitStatus> {
        loop {
            match waitpid(child, None) {
                Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => {
                    return Ok(status)
                }
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(to_process_error("waitpid(reap)", e)),
            }
        }
    }
}

fn resource_for_signal(signal: i32) -> &'static str {
    if signal == libc::SIGXCPU {
        "cpu_time"
    } else {
        "file_size"
    }
}

fn classify_exit<T: DeserializeOwned>(
    status: WaitStatus,
    bytes: &[u8],
    integrity: SlotIntegrity,
    wall_time_ms: u64,
) -> Result<IsolationOutcome<T>> {
    let fault = match status {
        WaitStatus::Signaled(_, sig, _) => {
            let raw = sig as i32;
            if signal::is_resource_limit_signal(raw) {
                Fault::ResourceExhausted {
                    resource: resource_for_signal(raw).to_string(),
                }
            } else {
                Fault::Signaled {
                    signal: raw,
                    name: signal::signal_name(raw),
                }
            }
        }
        WaitStatus::Exited(_, 0) => match integrity {
            SlotIntegrity::Overflowed => Fault::ResourceExhausted {
                resource: "result_slot".to_string(),
            },
            SlotIntegrity::ReadError => Fault::SlotCorrupted {
                detail: "failed to read result slot".to_string(),
            },
            SlotIntegrity::Complete if bytes.is_empty() => Fault::SlotCorrupted {
                detail: "child exited without writing a result".to_string(),
            },
            SlotIntegrity::Complete => {
                return match serde_json::from_slice::<SlotPayload<T>>(bytes) {
                    Ok(SlotPayload::Value(value)) => Ok(IsolationOutcome::Completed {
                        value,
                        wall_time_ms,
                    }),
                    Ok(SlotPayload::Failed(message)) => Err(HarnessError::Job(message)),
                    Err(e) => Ok(IsolationOutcome::Faulted(Fault::SlotCorrupted {
                        detail: e.to_string(),
                    })),
                };
            }
        },
        WaitStatus::Exited(_, code) => Fault::AbnormalExit { code },
        other => Fault::SlotCorrupted {
            detail: format!("unexpected wait status {:?}", other),
        },
    };

    Ok(IsolationOutcome::Faulted(fault))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    static FORK_LOCK: Mutex<()> = Mutex::new(());

    /// Tests fork from the parallel test runner; one at a time
    fn serial() -> MutexGuard<'static, ()> {
        FORK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn runner() -> IsolationRunner {
        IsolationRunner::new(IsolationConfig {
            wall_timeout_ms: 2_000,
            timing_timeout_ms: 2_000,
            kill_grace_ms: 20,
            address_space_limit: None,
            cpu_time_limit_secs: None,
            result_slot_bytes: 1024,
        })
    }

    #[test]
    fn completed_job_returns_value() {
        let _serial = serial();
        let outcome = runner()
            .run("sum", Duration::from_secs(2), || Ok((1..=10).sum::<i64>()))
            .unwrap();
        assert_eq!(outcome.into_value(), Some(55));
    }

    #[test]
    fn job_error_is_a_harness_error() {
        let _serial = serial();
        let err = runner()
            .run::<i32, _>("err", Duration::from_secs(2), || {
                Err(HarnessError::InvalidTestCase("bad interval".to_string()))
            })
            .unwrap_err();
        match err {
            HarnessError::Job(message) => assert!(message.contains("bad interval")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn oversized_result_exhausts_slot() {
        let _serial = serial();
        let outcome = runner()
            .run("big", Duration::from_secs(2), || Ok(vec![7u8; 64 * 1024]))
            .unwrap();
        assert_eq!(
            outcome.fault(),
            Some(&Fault::ResourceExhausted {
                resource: "result_slot".to_string()
            })
        );
    }

    #[test]
    fn classify_maps_resource_signals() {
        let status = WaitStatus::Signaled(Pid::from_raw(1), nix::sys::signal::Signal::SIGXCPU, false);
        let outcome: IsolationOutcome<i32> =
            classify_exit(status, &[], SlotIntegrity::Complete, 0).unwrap();
        assert_eq!(
            outcome.fault(),
            Some(&Fault::ResourceExhausted {
                resource: "cpu_time".to_string()
            })
        );
    }

    #[test]
    fn classify_reports_garbage_slot() {
        let status = WaitStatus::Exited(Pid::from_raw(1), 0);
        let outcome: IsolationOutcome<i32> =
            classify_exit(status, b"{not json", SlotIntegrity::Complete, 0).unwrap();
        assert!(matches!(outcome.fault(), Some(Fault::SlotCorrupted { .. })));
    }
}
