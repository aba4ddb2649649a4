use serde::{Deserialize, Serialize};

/// Median and dispersion of a trial series, in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistic {
    pub median_ns: u64,
    pub dispersion_ns: f64,
}

/// Reported for incorrect submissions and empty series
pub const NO_TIMING: PerformanceStatistic = PerformanceStatistic {
    median_ns: 0,
    dispersion_ns: 0.0,
};

impl PerformanceStatistic {
    /// Right median (`sorted[n / 2]`) and population standard deviation
    pub fn from_samples(samples_ns: &[u64]) -> Self {
        if samples_ns.is_empty() {
            return NO_TIMING;
        }

        let mut sorted = samples_ns.to_vec();
        sorted.sort_unstable();
        let median_ns = sorted[sorted.len() / 2];

        let n = sorted.len() as f64;
        let mean = sorted.iter().map(|&s| s as f64).sum::<f64>() / n;
        let variance = sorted
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            median_ns,
            dispersion_ns: variance.sqrt(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == NO_TIMING
    }

    pub fn median_secs(&self) -> f64 {
        self.median_ns as f64 / 1e9
    }

    pub fn dispersion_secs(&self) -> f64 {
        self.dispersion_ns / 1e9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_series() {
        let stat = PerformanceStatistic::from_samples(&[5, 1, 4, 2, 3]);
        assert_eq!(stat.median_ns, 3);
        assert!((stat.dispersion_ns - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn even_series_takes_right_median() {
        let stat = PerformanceStatistic::from_samples(&[1, 2, 3, 4]);
        assert_eq!(stat.median_ns, 3);
    }

    #[test]
    fn constant_series_has_zero_dispersion() {
        let stat = PerformanceStatistic::from_samples(&[7, 7, 7]);
        assert_eq!(stat.median_ns, 7);
        assert_eq!(stat.dispersion_ns, 0.0);
    }

    #[test]
    fn empty_series_is_sentinel() {
        assert!(PerformanceStatistic::from_samples(&[]).is_sentinel());
    }
}
