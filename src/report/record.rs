use crate::audit::LeakReport;
use crate::config::types::{GameKind, NO_RESULT};
use crate::games::GameEvaluation;
use crate::timing::{PerformanceStatistic, NO_TIMING};
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entrant's result for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission_id: String,
    pub game: GameKind,
    pub verdict: Verdict,
    pub correct: bool,
    pub performance: PerformanceStatistic,
    pub tests_passed: usize,
    pub tests_total: usize,
    pub leak: Option<LeakReport>,
    pub evaluated_at: DateTime<Utc>,
}

/// Flat leaderboard row with sentinel values in place of missing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub submission_id: String,
    /// `median±dispersion` in seconds, or the no-result sentinel
    pub result: String,
    pub tests: String,
    pub leaks: i64,
}

impl SubmissionRecord {
    pub fn from_evaluation(
        submission_id: &str,
        game: GameKind,
        verdict: Verdict,
        evaluation: &GameEvaluation,
    ) -> Self {
        let correct = verdict.is_correct();
        Self {
            submission_id: submission_id.to_string(),
            game,
            correct,
            performance: if correct {
                evaluation.performance
            } else {
                NO_TIMING
            },
            tests_passed: evaluation.tests_passed(),
            tests_total: evaluation.tests_total(),
            verdict,
            leak: None,
            evaluated_at: Utc::now(),
        }
    }

    /// Record for an entrant that never reached a driver
    pub fn without_evaluation(submission_id: &str, game: GameKind, verdict: Verdict) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            game,
            correct: false,
            performance: NO_TIMING,
            tests_passed: 0,
            tests_total: 0,
            verdict,
            leak: None,
            evaluated_at: Utc::now(),
        }
    }

    pub fn with_leak(mut self, leak: LeakReport) -> Self {
        self.leak = Some(leak);
        self
    }

    pub fn to_row(&self) -> LeaderboardRow {
        let result = match self.verdict {
            Verdict::NoResult { .. } | Verdict::InfrastructureFailure { .. } => NO_RESULT.to_string(),
            _ => format!(
                "{:.7}±{:.7}",
                self.performance.median_secs(),
                self.performance.dispersion_secs()
            ),
        };
        let leaks = self
            .leak
            .as_ref()
            .and_then(LeakReport::count)
            .map(|count| count as i64)
            .unwrap_or(NO_RESULT);

        LeaderboardRow {
            submission_id: self.submission_id.clone(),
            result,
            tests: format!("{} / {}", self.tests_passed, self.tests_total),
            leaks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::TrialResult;

    fn passed_evaluation() -> GameEvaluation {
        let mut evaluation = GameEvaluation::new(vec![TrialResult {
            case: "[1, 10]".to_string(),
            correct: true,
            elapsed_ms: 1,
            raw_output: "2520".to_string(),
            detail: None,
        }]);
        evaluation.performance = PerformanceStatistic {
            median_ns: 1_500,
            dispersion_ns: 300.0,
        };
        evaluation
    }

    #[test]
    fn row_formats_seconds_with_seven_decimals() {
        let record = SubmissionRecord::from_evaluation(
            "alice",
            GameKind::Numbers,
            Verdict::Passed,
            &passed_evaluation(),
        )
        .with_leak(LeakReport::Clean);

        let row = record.to_row();
        assert_eq!(row.result, "0.0000015±0.0000003");
        assert_eq!(row.tests, "1 / 1");
        assert_eq!(row.leaks, 0);
    }

    #[test]
    fn incorrect_verdict_drops_performance() {
        let record = SubmissionRecord::from_evaluation(
            "bob",
            GameKind::Numbers,
            Verdict::CorrectnessMismatch {
                detail: "expected 2520, got 7".to_string(),
            },
            &passed_evaluation(),
        );
        assert!(!record.correct);
        assert!(record.performance.is_sentinel());
        assert_eq!(record.to_row().result, "0.0000000±0.0000000");
    }

    #[test]
    fn no_result_row_uses_sentinels() {
        let record = SubmissionRecord::without_evaluation(
            "carol",
            GameKind::Split,
            Verdict::NoResult {
                reason: "no submission".to_string(),
            },
        )
        .with_leak(LeakReport::CouldNotRun {
            reason: "gcc missing".to_string(),
        });

        let row = record.to_row();
        assert_eq!(row.result, NO_RESULT.to_string());
        assert_eq!(row.leaks, NO_RESULT);
        assert_eq!(row.tests, "0 / 0");
    }
}
