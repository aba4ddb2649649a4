use crate::config::presets::NumbersPreset;
use crate::config::types::{GameKind, HarnessError, Result};
use crate::exec::{IsolationOutcome, IsolationRunner};
use crate::games::{unexpected_output, GameDriver, GameEvaluation, TrialResult};
use crate::native::{CallArgs, CallOutput, CallShape, Submission};
use crate::oracle;
use crate::timing::TimingProtocol;
use rand::Rng;

/// One numbers round: an interval and its oracle answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalCase {
    pub low: i32,
    pub high: i32,
    pub expected: i64,
}

impl IntervalCase {
    pub fn new(low: i32, high: i32) -> Result<Self> {
        let expected = oracle::smallest_common_multiple(low, high)?;
        if i32::try_from(expected).is_err() {
            return Err(HarnessError::InvalidTestCase(format!(
                "answer for [{}, {}] does not fit a C int",
                low, high
            )));
        }
        Ok(Self {
            low,
            high,
            expected,
        })
    }

    /// Random interval inside the preset borders
    pub fn random<R: Rng>(preset: &NumbersPreset, rng: &mut R) -> Result<Self> {
        if preset.min_border > preset.max_border {
            return Err(HarnessError::InvalidTestCase(format!(
                "border range [{}, {}] is empty",
                preset.min_border, preset.max_border
            )));
        }
        let low = rng.gen_range(preset.min_border..=preset.max_border);
        let high = rng.gen_range(low..=preset.max_border);
        Self::new(low, high)
    }

    pub fn label(&self) -> String {
        format!("[{}, {}]", self.low, self.high)
    }
}

pub struct NumbersDriver {
    preset: NumbersPreset,
    case: IntervalCase,
}

impl NumbersDriver {
    /// Driver for a fresh round with a random interval
    pub fn new(preset: NumbersPreset) -> Result<Self> {
        let case = IntervalCase::random(&preset, &mut rand::thread_rng())?;
        log::info!("Numbers round interval {} (answer {})", case.label(), case.expected);
        Ok(Self { preset, case })
    }

    /// Driver for a round with a fixed interval
    pub fn with_case(preset: NumbersPreset, case: IntervalCase) -> Self {
        Self { preset, case }
    }

    pub fn case(&self) -> IntervalCase {
        self.case
    }

    fn call(&self, submission: &Submission) -> Result<i32> {
        let symbol = &self.preset.symbol;
        let args = CallArgs::IntPair {
            first: self.case.low,
            second: self.case.high,
        };
        match submission.invoke(symbol, args)? {
            CallOutput::Int(value) => Ok(value),
            other => Err(unexpected_output(symbol, CallShape::IntPair, &other)),
        }
    }
}

impl GameDriver for NumbersDriver {
    fn game(&self) -> GameKind {
        GameKind::Numbers
    }

    fn required_symbols(&self) -> Vec<(&str, CallShape)> {
        vec![(self.preset.symbol.as_str(), CallShape::IntPair)]
    }

    fn evaluate(&self, submission: &Submission, runner: &IsolationRunner) -> Result<GameEvaluation> {
        let label = self.case.label();
        let check = runner.run(
            &format!("{}:numbers:check", submission.id()),
            runner.correctness_timeout(),
            || self.call(submission),
        )?;

        let trial = match check {
            IsolationOutcome::Faulted(fault) => {
                let mut evaluation = GameEvaluation::new(vec![TrialResult::faulted(&label, &fault)]);
                evaluation.fault = Some(fault);
                return Ok(evaluation);
            }
            IsolationOutcome::Completed {
                value,
                wall_time_ms,
            } => {
                let correct = i64::from(value) == self.case.expected;
                TrialResult {
                    case: label,
                    correct,
                    elapsed_ms: wall_time_ms,
                    raw_output: value.to_string(),
                    detail: (!correct)
                        .then(|| format!("expected {}, got {}", self.case.expected, value)),
                }
            }
        };

        let mut evaluation = GameEvaluation::new(vec![trial]);
        if !evaluation.all_correct() {
            return Ok(evaluation);
        }

        let protocol = TimingProtocol::from_preset(&self.preset.timing);
        evaluation.time_in_child(
            runner,
            &format!("{}:numbers:timing", submission.id()),
            || {
                protocol.measure(|| {
                    self.call(submission)?;
                    Ok(())
                })
            },
        )?;
        Ok(evaluation)
    }

    fn audit_args(&self) -> Vec<String> {
        vec![self.case.low.to_string(), self.case.high.to_string()]
    }
}
