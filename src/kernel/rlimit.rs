//! Resource limits applied inside isolated children before the job runs

use crate::config::harness::IsolationConfig;
use crate::config::types::{HarnessError, Result};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
type Resource = libc::__rlimit_resource_t;
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
type Resource = libc::c_int;

/// Lower one rlimit. The requested values are clamped to the current hard
/// limit so an unprivileged harness never asks the kernel to raise it.
fn apply_rlimit_value(name: &str, resource: Resource, soft: u64, hard: u64) -> Result<()> {
    let mut current = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    if unsafe { libc::getrlimit(resource, &mut current) } != 0 {
        return Err(HarnessError::Process(format!(
            "Failed to read {}: {}",
            name,
            std::io::Error::last_os_error()
        )));
    }

    let ceiling = current.rlim_max as u64;
    let limit = libc::rlimit {
        rlim_cur: soft.min(ceiling) as libc::rlim_t,
        rlim_max: hard.min(ceiling) as libc::rlim_t,
    };

    let rc = unsafe { libc::setrlimit(resource, &limit) };
    if rc == 0 {
        return Ok(());
    }

    Err(HarnessError::Process(format!(
        "Failed to apply {}={} (hard={}): {}",
        name,
        soft,
        hard,
        std::io::Error::last_os_error()
    )))
}

/// Virtual memory already mapped by this process
fn mapped_bytes() -> u64 {
    let pages = std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|statm| statm.split_whitespace().next()?.parse::<u64>().ok())
        .unwrap_or(0);
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    pages.saturating_mul(page_size.max(0) as u64)
}

/// Apply the child envelope: address space, CPU seconds, no core dumps.
///
/// The address-space budget is counted on top of what the child inherited
/// from the parent at fork time. CPU gets one second of headroom between soft and hard limit so the child
/// receives SIGXCPU (classified as resource exhaustion) before SIGKILL.
pub fn apply_child_limits(config: &IsolationConfig) -> Result<()> {
    if let Some(bytes) = config.address_space_limit {
        let limit = mapped_bytes().saturating_add(bytes);
        apply_rlimit_value("RLIMIT_AS", libc::RLIMIT_AS, limit, limit)?;
    }

    if let Some(secs) = config.cpu_time_limit_secs {
        apply_rlimit_value("RLIMIT_CPU", libc::RLIMIT_CPU, secs, secs.saturating_add(1))?;
    }

    apply_rlimit_value("RLIMIT_CORE", libc::RLIMIT_CORE, 0, 0)?;

    Ok(())
}
