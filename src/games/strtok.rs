use crate::config::presets::StrtokPreset;
use crate::config::types::{GameKind, HarnessError, Result};
use crate::exec::{IsolationOutcome, IsolationRunner};
use crate::games::corpus;
use crate::games::{preview, unexpected_output, GameDriver, GameEvaluation, TrialResult};
use crate::native::{CallArgs, CallOutput, CallShape, Submission, TokenCursor};
use crate::oracle::HostTokenizer;
use crate::timing::TimingProtocol;
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::fmt;
use std::path::Path;

/// A text and the delimiter set it is tokenized with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeCase {
    pub text: Vec<u8>,
    pub delimiters: CString,
}

impl TokenizeCase {
    pub fn new(text: &str, delimiters: &str) -> Result<Self> {
        if text.as_bytes().contains(&0) {
            return Err(HarnessError::InvalidTestCase(
                "tokenizer text contains a NUL byte".to_string(),
            ));
        }
        let delimiters = CString::new(delimiters).map_err(|_| {
            HarnessError::InvalidTestCase("delimiter set contains a NUL byte".to_string())
        })?;
        Ok(Self {
            text: text.as_bytes().to_vec(),
            delimiters,
        })
    }

    /// Corpus file, or `dir/<test_file>` when `path` is a directory
    pub fn from_corpus(preset: &StrtokPreset, path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(&preset.test_file)
        } else {
            path.to_path_buf()
        };
        let text = corpus::load_concatenated(&file)?;
        Self::new(&text, &preset.delimiters)
    }

    /// Same delimiters, text repeated `times` times
    pub fn amplified(&self, times: usize) -> Self {
        Self {
            text: self.text.repeat(times.max(1)),
            delimiters: self.delimiters.clone(),
        }
    }

    fn reference(&self) -> HostTokenizer {
        HostTokenizer::new(&self.text, self.delimiters.as_bytes())
    }
}

/// Tokenization check states.
///
/// `Init -> Compare -> Continue -> Compare -> ... -> Done | Mismatch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizeState {
    Init,
    Compare,
    Continue,
    Done,
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// One side returned a token, the other null
    Presence,
    Length,
    Content,
}

/// First step where the player diverged from the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMismatch {
    /// 1-based call number
    pub step: usize,
    pub kind: MismatchKind,
    pub expected: Option<Vec<u8>>,
    pub actual: Option<Vec<u8>>,
}

impl fmt::Display for StepMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |token: &Option<Vec<u8>>| match token {
            Some(bytes) => preview(bytes),
            None => "NULL".to_string(),
        };
        write!(
            f,
            "{:?} mismatch at call {}: expected {}, got {}",
            self.kind,
            self.step,
            render(&self.expected),
            render(&self.actual)
        )
    }
}

/// Steps the player's answers against the host tokenizer, one call at a time
#[derive(Debug, Clone)]
pub struct TokenizeMachine {
    reference: HostTokenizer,
    state: TokenizeState,
    steps: usize,
    mismatch: Option<StepMismatch>,
}

impl TokenizeMachine {
    pub fn new(case: &TokenizeCase) -> Self {
        Self {
            reference: case.reference(),
            state: TokenizeState::Init,
            steps: 0,
            mismatch: None,
        }
    }

    pub fn state(&self) -> TokenizeState {
        self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn mismatch(&self) -> Option<&StepMismatch> {
        self.mismatch.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TokenizeState::Done | TokenizeState::Mismatch)
    }

    /// Feed the player's answer to the next call. Terminal states absorb.
    pub fn advance(&mut self, actual: Option<Vec<u8>>) -> TokenizeState {
        if self.is_terminal() {
            return self.state;
        }

        self.state = TokenizeState::Compare;
        self.steps += 1;
        let expected = self.reference.next_token();

        let kind = match (&expected, &actual) {
            (None, None) => {
                self.state = TokenizeState::Done;
                return self.state;
            }
            (Some(e), Some(a)) if e == a => {
                self.state = TokenizeState::Continue;
                return self.state;
            }
            (Some(e), Some(a)) if e.len() != a.len() => MismatchKind::Length,
            (Some(_), Some(_)) => MismatchKind::Content,
            _ => MismatchKind::Presence,
        };

        self.mismatch = Some(StepMismatch {
            step: self.steps,
            kind,
            expected,
            actual,
        });
        self.state = TokenizeState::Mismatch;
        self.state
    }
}

/// What the child reports back for the correctness run
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenizeRun {
    steps: usize,
    final_state: TokenizeState,
    mismatch: Option<StepMismatch>,
}

pub struct StrtokDriver {
    preset: StrtokPreset,
    case: TokenizeCase,
}

impl StrtokDriver {
    pub fn new(preset: StrtokPreset, case: TokenizeCase) -> Self {
        Self { preset, case }
    }

    pub fn from_corpus(preset: StrtokPreset, path: &Path) -> Result<Self> {
        let case = TokenizeCase::from_corpus(&preset, path)?;
        log::info!("Loaded strtok case of {} bytes", case.text.len());
        Ok(Self::new(preset, case))
    }

    fn call(&self, submission: &Submission, cursor: &mut TokenCursor, case: &TokenizeCase) -> Result<Option<Vec<u8>>> {
        let symbol = &self.preset.symbol;
        let args = CallArgs::Tokenize {
            cursor,
            delimiters: &case.delimiters,
        };
        match submission.invoke(symbol, args)? {
            CallOutput::Token(token) => Ok(token),
            other => Err(unexpected_output(symbol, CallShape::Tokenize, &other)),
        }
    }

    fn check(&self, submission: &Submission) -> Result<TokenizeRun> {
        let mut cursor = TokenCursor::new(&self.case.text)?;
        let mut machine = TokenizeMachine::new(&self.case);
        while !machine.is_terminal() {
            let token = self.call(submission, &mut cursor, &self.case)?;
            machine.advance(token);
        }
        Ok(TokenizeRun {
            steps: machine.steps(),
            final_state: machine.state(),
            mismatch: machine.mismatch().cloned(),
        })
    }

    /// Drain one full tokenization session, ignoring the tokens
    fn drain(&self, submission: &Submission, mut cursor: TokenCursor, case: &TokenizeCase) -> Result<()> {
        while self.call(submission, &mut cursor, case)?.is_some() {}
        Ok(())
    }
}

impl GameDriver for StrtokDriver {
    fn game(&self) -> GameKind {
        GameKind::Strtok
    }

    fn required_symbols(&self) -> Vec<(&str, CallShape)> {
        vec![(self.preset.symbol.as_str(), CallShape::Tokenize)]
    }

    fn evaluate(&self, submission: &Submission, runner: &IsolationRunner) -> Result<GameEvaluation> {
        let label = format!("strtok ({} bytes)", self.case.text.len());
        let outcome = runner.run(
            &format!("{}:strtok:check", submission.id()),
            runner.correctness_timeout(),
            || self.check(submission),
        )?;

        let trial = match outcome {
            IsolationOutcome::Faulted(fault) => {
                let mut evaluation = GameEvaluation::new(vec![TrialResult::faulted(&label, &fault)]);
                evaluation.fault = Some(fault);
                return Ok(evaluation);
            }
            IsolationOutcome::Completed {
                value,
                wall_time_ms,
            } => TrialResult {
                case: label,
                correct: value.final_state == TokenizeState::Done,
                elapsed_ms: wall_time_ms,
                raw_output: format!("{} calls", value.steps),
                detail: value.mismatch.map(|m| m.to_string()),
            },
        };

        let mut evaluation = GameEvaluation::new(vec![trial]);
        if !evaluation.all_correct() {
            return Ok(evaluation);
        }

        let protocol = TimingProtocol::from_preset(&self.preset.timing);
        let amplified = self.case.amplified(self.preset.timing.input_multiplier);
        evaluation.time_in_child(runner, &format!("{}:strtok:timing", submission.id()), || {
            protocol.measure_with_setup(
                || TokenCursor::new(&amplified.text),
                |cursor| self.drain(submission, cursor, &amplified),
            )
        })?;
        Ok(evaluation)
    }
}
