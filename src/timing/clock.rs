use crate::config::types::{HarnessError, Result, TimingClock};
use nix::time::{clock_gettime, ClockId};
use std::time::{Duration, Instant};

fn process_cpu_time() -> Result<Duration> {
    let ts = clock_gettime(ClockId::CLOCK_PROCESS_CPUTIME_ID)
        .map_err(|e| HarnessError::Process(format!("clock_gettime(PROCESS_CPUTIME): {}", e)))?;
    Ok(Duration::new(ts.tv_sec() as u64, ts.tv_nsec() as u32))
}

/// Running measurement on one of the supported clocks
#[derive(Debug, Clone, Copy)]
pub enum Stopwatch {
    Cpu(Duration),
    Wall(Instant),
}

impl Stopwatch {
    pub fn start(clock: TimingClock) -> Result<Self> {
        Ok(match clock {
            TimingClock::ProcessCpu => Self::Cpu(process_cpu_time()?),
            TimingClock::Wall => Self::Wall(Instant::now()),
        })
    }

    pub fn elapsed(&self) -> Result<Duration> {
        match self {
            Self::Cpu(started) => Ok(process_cpu_time()?.saturating_sub(*started)),
            Self::Wall(started) => Ok(started.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_clock_advances_under_work() {
        let watch = Stopwatch::start(TimingClock::ProcessCpu).unwrap();
        let mut acc = 0u64;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
        std::hint::black_box(acc);
        assert!(watch.elapsed().unwrap() > Duration::ZERO);
    }

    #[test]
    fn wall_clock_counts_sleep() {
        let watch = Stopwatch::start(TimingClock::Wall).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(watch.elapsed().unwrap() >= Duration::from_millis(5));
    }
}
