//! Round evaluation
//!
//! The [`Evaluator`] runs every entrant of a round through one game driver,
//! one at a time, and turns what it observed into exactly one
//! [`SubmissionRecord`] per entrant. A failing entrant never stops the round.

use crate::audit::{LeakAuditor, LeakReport};
use crate::config::harness::HarnessConfig;
use crate::config::types::{HarnessError, Result};
use crate::config::validator::validate_config;
use crate::exec::IsolationRunner;
use crate::games::GameDriver;
use crate::native::{player_id_from_path, CodeUnit, Submission};
use crate::observability::{emit, HarnessEvent, HarnessEventType, HarnessMetrics};
use crate::report::SubmissionRecord;
use crate::verdict::{RoundEvidence, Verdict, VerdictClassifier};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Literal marking an entrant without a submission
pub const MISSING_ENTRANT: &str = "NULL";

/// Where an entrant's code comes from
pub enum EntrantSource {
    /// Shared object on disk
    Library(PathBuf),
    /// Code already loaded in this process
    Unit(Box<dyn CodeUnit>),
    /// The entrant submitted nothing
    Missing,
}

impl std::fmt::Debug for EntrantSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Library(path) => f.debug_tuple("Library").field(path).finish(),
            Self::Unit(unit) => f.debug_tuple("Unit").field(&unit.describe()).finish(),
            Self::Missing => f.write_str("Missing"),
        }
    }
}

#[derive(Debug)]
pub struct Entrant {
    pub id: String,
    pub source: EntrantSource,
}

impl Entrant {
    pub fn library(id: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.to_string(),
            source: EntrantSource::Library(path.into()),
        }
    }

    pub fn unit(id: &str, unit: Box<dyn CodeUnit>) -> Self {
        Self {
            id: id.to_string(),
            source: EntrantSource::Unit(unit),
        }
    }

    pub fn missing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            source: EntrantSource::Missing,
        }
    }

    /// Parse `ID=PATH`, `ID=NULL` or a bare `PATH` (id taken from the file
    /// name)
    pub fn parse(arg: &str) -> Result<Self> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(HarnessError::Config("empty entrant".to_string()));
        }

        match arg.split_once('=') {
            Some((id, _)) if id.is_empty() => Err(HarnessError::Config(format!(
                "entrant '{}' has an empty id",
                arg
            ))),
            Some((id, MISSING_ENTRANT)) => Ok(Self::missing(id)),
            Some((id, path)) if !path.is_empty() => Ok(Self::library(id, path)),
            Some(_) => Err(HarnessError::Config(format!(
                "entrant '{}' has an empty path",
                arg
            ))),
            None => {
                let path = Path::new(arg);
                let id = player_id_from_path(path);
                if id.is_empty() {
                    return Err(HarnessError::Config(format!(
                        "cannot derive a player id from '{}'",
                        arg
                    )));
                }
                Ok(Self::library(&id, path))
            }
        }
    }
}

/// Evaluates rounds sequentially with one configuration
pub struct Evaluator {
    config: HarnessConfig,
    runner: IsolationRunner,
    auditor: Option<LeakAuditor>,
    metrics: HarnessMetrics,
    interrupted: Option<fn() -> bool>,
    round_id: String,
}

impl Evaluator {
    /// Validate `config` and build an evaluator. Validation warnings are
    /// logged, errors are returned.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let validation = validate_config(&config)?;
        for warning in &validation.warnings {
            log::warn!("Configuration warning: {}", warning);
        }

        Ok(Self {
            runner: IsolationRunner::new(config.isolation.clone()),
            config,
            auditor: None,
            metrics: HarnessMetrics::new(),
            interrupted: None,
            round_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    /// Leak-check every loaded library with `driver_source`
    pub fn with_auditor(mut self, driver_source: PathBuf) -> Self {
        self.auditor = Some(LeakAuditor::new(self.config.audit.clone(), driver_source));
        self
    }

    /// Poll `check` between entrants; `true` stops the round
    pub fn with_interrupt(mut self, check: fn() -> bool) -> Self {
        self.interrupted = Some(check);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn runner(&self) -> &IsolationRunner {
        &self.runner
    }

    pub fn metrics(&self) -> &HarnessMetrics {
        &self.metrics
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    fn interrupt_requested(&self) -> bool {
        self.interrupted.map(|check| check()).unwrap_or(false)
    }

    /// Evaluate every entrant against `driver`, in order
    pub fn evaluate_round(&self, driver: &dyn GameDriver, entrants: Vec<Entrant>) -> Vec<SubmissionRecord> {
        let game = driver.game();
        emit(
            HarnessEvent::new(
                HarnessEventType::RoundStart,
                format!("{} entrant(s)", entrants.len()),
            )
            .with_game(game)
            .with_round(&self.round_id),
        );

        let mut records = Vec::with_capacity(entrants.len());
        let mut stopped = false;

        for entrant in entrants {
            if !stopped && self.interrupt_requested() {
                stopped = true;
                emit(
                    HarnessEvent::new(
                        HarnessEventType::Interrupted,
                        format!("round stopped after {} entrant(s)", records.len()),
                    )
                    .with_game(game)
                    .with_round(&self.round_id),
                );
            }

            let record = if stopped {
                let verdict = Verdict::InfrastructureFailure {
                    reason: "round interrupted".to_string(),
                };
                self.metrics.record_verdict(&verdict);
                SubmissionRecord::without_evaluation(&entrant.id, game, verdict)
            } else {
                self.evaluate_entrant(driver, entrant)
            };
            records.push(record);
        }

        emit(
            HarnessEvent::new(
                HarnessEventType::RoundEnd,
                format!(
                    "{} record(s), {} passed",
                    records.len(),
                    records.iter().filter(|r| r.correct).count()
                ),
            )
            .with_game(game)
            .with_round(&self.round_id),
        );
        records
    }

    /// Evaluate one entrant; never fails, every problem becomes a verdict
    pub fn evaluate_entrant(&self, driver: &dyn GameDriver, entrant: Entrant) -> SubmissionRecord {
        let game = driver.game();
        let started = Instant::now();
        let required = driver.required_symbols();

        let (loaded, library) = match entrant.source {
            EntrantSource::Missing => (
                Err(HarnessError::Load("no submission".to_string())),
                None,
            ),
            EntrantSource::Library(path) => (
                Submission::load(&entrant.id, &path, &required),
                Some(path),
            ),
            EntrantSource::Unit(unit) => (Submission::from_unit(&entrant.id, unit, &required), None),
        };

        let submission = match loaded {
            Ok(submission) => submission,
            Err(e) => {
                let verdict = VerdictClassifier::classify(&RoundEvidence {
                    load_error: Some(e.to_string()),
                    ..RoundEvidence::default()
                });
                self.report(&entrant.id, driver, &verdict);
                return SubmissionRecord::without_evaluation(&entrant.id, game, verdict);
            }
        };

        log::info!("Evaluating '{}' ({}) at {}", entrant.id, game, submission.origin());

        let record = match driver.evaluate(&submission, &self.runner) {
            Ok(evaluation) => {
                let verdict = VerdictClassifier::classify(&RoundEvidence {
                    fault: evaluation.fault.clone(),
                    mismatch: evaluation.first_mismatch(),
                    cases_run: evaluation.tests_total(),
                    ..RoundEvidence::default()
                });
                self.report(&entrant.id, driver, &verdict);
                SubmissionRecord::from_evaluation(&entrant.id, game, verdict, &evaluation)
            }
            Err(e) => {
                let verdict = VerdictClassifier::classify(&RoundEvidence {
                    infrastructure_error: Some(e.to_string()),
                    ..RoundEvidence::default()
                });
                self.report(&entrant.id, driver, &verdict);
                SubmissionRecord::without_evaluation(&entrant.id, game, verdict)
            }
        };
        drop(submission);

        let record = match (&self.auditor, library) {
            (Some(auditor), Some(path)) => {
                let leak = auditor.audit(&path, &driver.audit_args());
                self.metrics.record_leak(&leak);
                match &leak {
                    LeakReport::Leaks { count } => emit(
                        HarnessEvent::new(HarnessEventType::LeaksFound, format!("{} error(s)", count))
                            .with_submission(&entrant.id)
                            .with_game(game)
                            .with_round(&self.round_id),
                    ),
                    LeakReport::CouldNotRun { reason } => emit(
                        HarnessEvent::new(HarnessEventType::LeakCheckFailed, reason.clone())
                            .with_submission(&entrant.id)
                            .with_game(game)
                            .with_round(&self.round_id),
                    ),
                    LeakReport::Clean => {}
                }
                record.with_leak(leak)
            }
            _ => record,
        };

        self.metrics.record_evaluation_time(started.elapsed());
        record
    }

    fn report(&self, submission_id: &str, driver: &dyn GameDriver, verdict: &Verdict) {
        self.metrics.record_verdict(verdict);

        let event_type = match verdict {
            Verdict::Passed => HarnessEventType::SubmissionPassed,
            Verdict::CorrectnessMismatch { .. } => HarnessEventType::CorrectnessMismatch,
            Verdict::CrashFault { .. } => HarnessEventType::CrashFault,
            Verdict::NoResult { .. } => HarnessEventType::LoadFailure,
            Verdict::InfrastructureFailure { .. } => HarnessEventType::InfrastructureFailure,
        };
        emit(
            HarnessEvent::new(event_type, verdict.to_string())
                .with_submission(submission_id)
                .with_game(driver.game())
                .with_round(&self.round_id),
        );
    }
}
