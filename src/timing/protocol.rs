use crate::config::presets::TimingPreset;
use crate::config::types::{Result, TimingClock};
use crate::timing::clock::Stopwatch;
use crate::timing::stats::{PerformanceStatistic, NO_TIMING};
use serde::{Deserialize, Serialize};

/// Raw per-trial durations, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSeries {
    pub samples_ns: Vec<u64>,
}

impl TrialSeries {
    pub fn statistic(&self) -> PerformanceStatistic {
        PerformanceStatistic::from_samples(&self.samples_ns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProtocol {
    repeats: usize,
    clock: TimingClock,
}

impl TimingProtocol {
    pub fn new(repeats: usize, clock: TimingClock) -> Self {
        Self { repeats, clock }
    }

    pub fn from_preset(preset: &TimingPreset) -> Self {
        Self::new(preset.repeats, preset.clock)
    }

    pub fn repeats(&self) -> usize {
        self.repeats
    }

    /// Time `trial` `repeats` times
    pub fn measure<F>(&self, mut trial: F) -> Result<TrialSeries>
    where
        F: FnMut() -> Result<()>,
    {
        self.measure_with_setup(|| Ok(()), |()| trial())
    }

    /// Like [`measure`](Self::measure), with an untimed `setup` before each
    /// trial whose product is handed to the trial
    pub fn measure_with_setup<I, S, F>(&self, mut setup: S, mut trial: F) -> Result<TrialSeries>
    where
        S: FnMut() -> Result<I>,
        F: FnMut(I) -> Result<()>,
    {
        let mut samples_ns = Vec::with_capacity(self.repeats);
        for _ in 0..self.repeats {
            let input = setup()?;
            let watch = Stopwatch::start(self.clock)?;
            trial(input)?;
            samples_ns.push(watch.elapsed()?.as_nanos() as u64);
        }
        Ok(TrialSeries { samples_ns })
    }

    /// The sentinel when `correct` is false, without running anything
    pub fn statistic_if_correct<F>(&self, correct: bool, trial: F) -> Result<PerformanceStatistic>
    where
        F: FnMut() -> Result<()>,
    {
        if !correct {
            return Ok(NO_TIMING);
        }
        Ok(self.measure(trial)?.statistic())
    }
}
