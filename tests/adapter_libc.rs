//! The system C library's `strtok` as a known-good tokenize submission
//!
//! libc's tokenizer keeps its state in a process global, so every call here
//! happens inside an isolated child.

mod common;

use gamejudge::config::harness::{HarnessConfig, IsolationConfig};
use gamejudge::config::presets::{StrtokPreset, TimingPreset};
use gamejudge::config::types::{GameKind, HarnessError, TimingClock};
use gamejudge::exec::IsolationRunner;
use gamejudge::games::strtok::{StrtokDriver, TokenizeCase};
use gamejudge::games::GameDriver;
use gamejudge::native::{CallShape, Submission};
use gamejudge::session::{Entrant, Evaluator};
use gamejudge::verdict::Verdict;
use std::path::Path;

const LIBC: &str = "libc.so.6";

fn preset() -> StrtokPreset {
    StrtokPreset {
        timing: TimingPreset {
            repeats: 3,
            clock: TimingClock::Wall,
            input_multiplier: 20,
        },
        ..StrtokPreset::default()
    }
}

fn driver(text: &str) -> StrtokDriver {
    StrtokDriver::new(preset(), TokenizeCase::new(text, " ,.;:").unwrap())
}

#[test]
fn libc_strtok_passes_and_is_timed() {
    let _serial = common::serial();
    let driver = driver("one two  three, four;five");
    let submission = Submission::load("glibc", Path::new(LIBC), &driver.required_symbols()).unwrap();
    let runner = IsolationRunner::new(IsolationConfig::default());

    let evaluation = driver.evaluate(&submission, &runner).unwrap();

    assert!(evaluation.all_correct(), "{:?}", evaluation.first_mismatch());
    assert!(evaluation.fault.is_none());
    assert!(!evaluation.performance.is_sentinel());
}

#[test]
fn libc_strtok_handles_delimiter_only_input() {
    let _serial = common::serial();
    let driver = driver(" ,;. ");
    let submission = Submission::load("glibc", Path::new(LIBC), &driver.required_symbols()).unwrap();
    let runner = IsolationRunner::new(IsolationConfig::default());

    let evaluation = driver.evaluate(&submission, &runner).unwrap();
    assert!(evaluation.all_correct(), "{:?}", evaluation.first_mismatch());
}

#[test]
fn missing_symbol_fails_the_load() {
    let _serial = common::serial();
    let err = Submission::load("glibc", Path::new(LIBC), &[("numbers_game", CallShape::IntPair)])
        .err()
        .unwrap();
    assert!(matches!(err, HarnessError::SymbolNotFound(ref s) if s == "numbers_game"));
}

#[test]
fn evaluator_round_with_libc_and_missing_entrants() {
    let _serial = common::serial();
    let mut config = HarnessConfig::default();
    config.strtok = preset();
    let evaluator = Evaluator::new(config).unwrap();

    let records = evaluator.evaluate_round(
        &driver("alpha beta gamma"),
        vec![
            Entrant::library("glibc", LIBC),
            Entrant::missing("absent"),
            Entrant::library("nowhere", "/nonexistent/libnowhere.so"),
        ],
    );

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].game, GameKind::Strtok);
    assert_eq!(records[0].verdict, Verdict::Passed);
    assert!(records[0].correct);
    assert!(!records[0].performance.is_sentinel());
    assert_eq!(records[0].tests_passed, records[0].tests_total);

    for record in &records[1..] {
        assert!(matches!(record.verdict, Verdict::NoResult { .. }));
        assert!(record.performance.is_sentinel());
        assert_eq!(record.to_row().result, "-1337");
    }
}
