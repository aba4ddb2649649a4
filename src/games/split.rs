use crate::config::presets::SplitPreset;
use crate::config::types::{GameKind, HarnessError, Result};
use crate::exec::{IsolationOutcome, IsolationRunner};
use crate::games::corpus;
use crate::games::{preview, unexpected_output, GameDriver, GameEvaluation, TrialResult};
use crate::native::{CallArgs, CallOutput, CallShape, FieldMatrix, Submission};
use crate::oracle;
use crate::timing::TimingProtocol;
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::path::Path;

/// One corpus file with its delimiter and oracle answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCase {
    /// 1-based position in the delimiter table
    pub number: usize,
    pub input: CString,
    pub delimiter: char,
    pub expected: Vec<String>,
}

impl SplitCase {
    pub fn new(number: usize, text: &str, delimiter: char) -> Result<Self> {
        let expected = oracle::split_fields(text, delimiter)?;
        let input = CString::new(text).map_err(|_| {
            HarnessError::InvalidTestCase(format!("split case {} contains a NUL byte", number))
        })?;
        Ok(Self {
            number,
            input,
            delimiter,
            expected,
        })
    }

    pub fn label(&self) -> String {
        format!("test_{} ({:?})", self.number, self.delimiter)
    }

    fn input_len(&self) -> usize {
        self.input.as_bytes().len()
    }

    fn matrix(&self) -> FieldMatrix {
        FieldMatrix::for_input(self.input_len())
    }
}

/// What the child reports back for one case
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SplitCheck {
    count: i32,
    mismatch: Option<String>,
}

fn compare_fields(case: &SplitCase, count: i32, matrix: &FieldMatrix) -> Option<String> {
    if count < 0 || count as usize != case.expected.len() {
        return Some(format!(
            "expected {} fields, got {}",
            case.expected.len(),
            count
        ));
    }
    for (index, expected) in case.expected.iter().enumerate() {
        let actual = matrix.field(index).unwrap_or_default();
        if actual != expected.as_bytes() {
            return Some(format!(
                "field {}: expected {}, got {}",
                index,
                preview(expected.as_bytes()),
                preview(actual)
            ));
        }
    }
    None
}

pub struct SplitDriver {
    preset: SplitPreset,
    cases: Vec<SplitCase>,
}

impl SplitDriver {
    pub fn new(preset: SplitPreset, cases: Vec<SplitCase>) -> Self {
        Self { preset, cases }
    }

    /// One case per entry of the delimiter table, read from
    /// `dir/<file_pattern>`
    pub fn from_corpus_dir(preset: SplitPreset, dir: &Path) -> Result<Self> {
        let mut cases = Vec::with_capacity(preset.delimiters.len());
        for (index, delimiter) in preset.delimiters.iter().enumerate() {
            let number = index + 1;
            let path = dir.join(corpus::case_file_name(&preset.file_pattern, number));
            let text = corpus::load_concatenated(&path)?;
            cases.push(SplitCase::new(number, &text, *delimiter)?);
        }
        log::info!("Loaded {} split cases from {}", cases.len(), dir.display());
        Ok(Self::new(preset, cases))
    }

    pub fn cases(&self) -> &[SplitCase] {
        &self.cases
    }

    fn call(&self, submission: &Submission, case: &SplitCase, matrix: &mut FieldMatrix) -> Result<i32> {
        let symbol = &self.preset.symbol;
        let args = CallArgs::Split {
            input: &case.input,
            fields: matrix,
            delimiter: case.delimiter as u8,
        };
        match submission.invoke(symbol, args)? {
            CallOutput::FieldCount(count) => Ok(count),
            other => Err(unexpected_output(symbol, CallShape::Split, &other)),
        }
    }

    fn check_case(&self, submission: &Submission, case: &SplitCase) -> Result<SplitCheck> {
        let mut matrix = case.matrix();
        let count = self.call(submission, case, &mut matrix)?;
        Ok(SplitCheck {
            count,
            mismatch: compare_fields(case, count, &matrix),
        })
    }
}

impl GameDriver for SplitDriver {
    fn game(&self) -> GameKind {
        GameKind::Split
    }

    fn required_symbols(&self) -> Vec<(&str, CallShape)> {
        vec![(self.preset.symbol.as_str(), CallShape::Split)]
    }

    fn evaluate(&self, submission: &Submission, runner: &IsolationRunner) -> Result<GameEvaluation> {
        let mut evaluation = GameEvaluation::new(Vec::with_capacity(self.cases.len()));

        for case in &self.cases {
            let outcome = runner.run(
                &format!("{}:split:{}", submission.id(), case.number),
                runner.correctness_timeout(),
                || self.check_case(submission, case),
            )?;

            let trial = match outcome {
                IsolationOutcome::Completed {
                    value,
                    wall_time_ms,
                } => TrialResult {
                    case: case.label(),
                    correct: value.mismatch.is_none(),
                    elapsed_ms: wall_time_ms,
                    raw_output: format!("{} fields", value.count),
                    detail: value.mismatch,
                },
                IsolationOutcome::Faulted(fault) => {
                    let trial = TrialResult::faulted(&case.label(), &fault);
                    evaluation.record_fault(fault);
                    trial
                }
            };
            evaluation.trials.push(trial);
        }

        log::info!(
            "{}: {} / {} split tests passed",
            submission.id(),
            evaluation.tests_passed(),
            evaluation.tests_total()
        );

        if !evaluation.all_correct() {
            return Ok(evaluation);
        }

        let protocol = TimingProtocol::from_preset(&self.preset.timing);
        evaluation.time_in_child(runner, &format!("{}:split:timing", submission.id()), || {
            // One matrix fits every case; answers were already checked
            let longest = self.cases.iter().map(SplitCase::input_len).max().unwrap_or(0);
            let mut matrix = FieldMatrix::for_input(longest);
            protocol.measure(|| {
                for case in &self.cases {
                    self.call(submission, case, &mut matrix)?;
                }
                Ok(())
            })
        })?;
        Ok(evaluation)
    }
}
