/// Structured submission-level events
///
/// Every event is logged through the `log` facade at a level derived from
/// its severity and, when a journal is configured, appended as one JSON line.
use crate::config::types::{GameKind, HarnessError, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessEventType {
    RoundStart,
    RoundEnd,
    SubmissionPassed,
    LoadFailure,
    CorrectnessMismatch,
    CrashFault,
    InfrastructureFailure,
    LeaksFound,
    LeakCheckFailed,
    Interrupted,
}

impl HarnessEventType {
    pub fn default_severity(&self) -> EventSeverity {
        match self {
            Self::RoundStart | Self::RoundEnd | Self::SubmissionPassed => EventSeverity::Low,
            Self::LoadFailure | Self::CorrectnessMismatch | Self::LeaksFound => EventSeverity::Medium,
            Self::CrashFault
            | Self::InfrastructureFailure
            | Self::LeakCheckFailed
            | Self::Interrupted => EventSeverity::High,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessEvent {
    pub event_type: HarnessEventType,
    pub severity: EventSeverity,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub submission_id: Option<String>,
    pub game: Option<GameKind>,
    pub round_id: Option<String>,
}

impl HarnessEvent {
    pub fn new(event_type: HarnessEventType, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: Utc::now(),
            details,
            submission_id: None,
            game: None,
            round_id: None,
        }
    }

    pub fn with_submission(mut self, submission_id: &str) -> Self {
        self.submission_id = Some(submission_id.to_string());
        self
    }

    pub fn with_game(mut self, game: GameKind) -> Self {
        self.game = Some(game);
        self
    }

    pub fn with_round(mut self, round_id: &str) -> Self {
        self.round_id = Some(round_id.to_string());
        self
    }
}

/// Append-only JSONL event file
pub struct EventJournal {
    file: Mutex<File>,
    path: PathBuf,
}

impl EventJournal {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HarnessError::Config(format!("Failed to create event journal directory: {}", e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HarnessError::Config(format!("Failed to open event journal: {}", e)))?;

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &HarnessEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode event: {}", e);
                return;
            }
        };

        match self.file.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
                    error!("Failed to write event journal {}: {}", self.path.display(), e);
                }
            }
            Err(_) => error!("Failed to acquire lock on event journal"),
        }
    }
}

static EVENT_JOURNAL: OnceCell<EventJournal> = OnceCell::new();

/// Install the process-wide journal. Later calls are ignored with a warning.
pub fn init_event_journal(path: &Path) -> Result<()> {
    let journal = EventJournal::open(path)?;
    if EVENT_JOURNAL.set(journal).is_err() {
        warn!("Event journal already initialized");
    } else {
        info!("Event journal at {}", path.display());
    }
    Ok(())
}

fn log_event(event: &HarnessEvent) {
    let subject = event.submission_id.as_deref().unwrap_or("-");
    match event.severity {
        EventSeverity::High => error!("{:?} [{}]: {}", event.event_type, subject, event.details),
        EventSeverity::Medium => warn!("{:?} [{}]: {}", event.event_type, subject, event.details),
        EventSeverity::Low => info!("{:?} [{}]: {}", event.event_type, subject, event.details),
    }
}

/// Log `event` and append it to the journal, if any
pub fn emit(event: HarnessEvent) {
    log_event(&event);
    if let Some(journal) = EVENT_JOURNAL.get() {
        journal.append(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_event_type() {
        let event = HarnessEvent::new(HarnessEventType::CrashFault, "SIGSEGV".to_string());
        assert_eq!(event.severity, EventSeverity::High);
        let event = HarnessEvent::new(HarnessEventType::SubmissionPassed, String::new());
        assert_eq!(event.severity, EventSeverity::Low);
    }

    #[test]
    fn journal_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let journal = EventJournal::open(&path).unwrap();

        journal.append(
            &HarnessEvent::new(HarnessEventType::LoadFailure, "missing symbol".to_string())
                .with_submission("alice")
                .with_game(GameKind::Split),
        );
        journal.append(&HarnessEvent::new(HarnessEventType::RoundEnd, "done".to_string()));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event_type"], "load_failure");
        assert_eq!(first["submission_id"], "alice");
        assert_eq!(first["game"], "split");
    }
}
