//! Full rounds through the evaluator with in-process submissions
//!
//! Players are plain `extern "C"` functions registered through a
//! `StaticCodeUnit`; every call still goes through a forked child.

mod common;

use gamejudge::config::harness::HarnessConfig;
use gamejudge::config::presets::{NumbersPreset, SplitPreset};
use gamejudge::config::types::TimingClock;
use gamejudge::exec::Fault;
use gamejudge::games::numbers::{IntervalCase, NumbersDriver};
use gamejudge::games::split::{SplitCase, SplitDriver};
use gamejudge::games::strtok::{StrtokDriver, TokenizeCase};
use gamejudge::native::StaticCodeUnit;
use gamejudge::report::rank;
use gamejudge::session::{Entrant, Evaluator};
use gamejudge::verdict::Verdict;
use libc::{c_char, c_int};
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::time::Duration;

fn config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.isolation.wall_timeout_ms = 300;
    config.isolation.kill_grace_ms = 50;
    config.numbers.timing.repeats = 5;
    config.numbers.timing.clock = TimingClock::Wall;
    config.split.timing.repeats = 3;
    config.strtok.timing.repeats = 3;
    config.strtok.timing.input_multiplier = 4;
    config
}

extern "C" fn lcm_correct(low: c_int, high: c_int) -> c_int {
    fn gcd(a: i64, b: i64) -> i64 {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }
    let mut acc = 1i64;
    for n in low as i64..=high as i64 {
        acc = acc / gcd(acc, n) * n;
    }
    acc as c_int
}

extern "C" fn lcm_product(low: c_int, high: c_int) -> c_int {
    (low..=high).fold(1i32, |acc, n| acc.wrapping_mul(n))
}

/// Dies with SIGSEGV. The default action is restored first because the
/// Rust runtime's own SIGSEGV handler ignores raised signals.
extern "C" fn lcm_segfault(_: c_int, _: c_int) -> c_int {
    unsafe {
        libc::signal(libc::SIGSEGV, libc::SIG_DFL);
        libc::raise(libc::SIGSEGV);
    }
    0
}

extern "C" fn lcm_hang(_: c_int, _: c_int) -> c_int {
    loop {
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn numbers_entrant(id: &str, f: extern "C" fn(c_int, c_int) -> c_int) -> Entrant {
    Entrant::unit(
        id,
        Box::new(StaticCodeUnit::new(id).with_int_pair("numbers_game", f)),
    )
}

fn numbers_driver(low: i32, high: i32) -> NumbersDriver {
    NumbersDriver::with_case(
        NumbersPreset {
            timing: config().numbers.timing,
            ..NumbersPreset::default()
        },
        IntervalCase::new(low, high).unwrap(),
    )
}

#[test]
fn numbers_round_classifies_every_entrant() {
    let _serial = common::serial();
    let evaluator = Evaluator::new(config()).unwrap();
    let records = evaluator.evaluate_round(
        &numbers_driver(3, 9),
        vec![
            numbers_entrant("crasher", lcm_segfault),
            numbers_entrant("wrong", lcm_product),
            numbers_entrant("right", lcm_correct),
            numbers_entrant("sleeper", lcm_hang),
            Entrant::missing("absent"),
        ],
    );

    assert_eq!(records.len(), 5);

    match &records[0].verdict {
        Verdict::CrashFault {
            fault: Fault::Signaled { name, .. },
        } => assert_eq!(name, "SIGSEGV"),
        other => panic!("expected crash, got {:?}", other),
    }
    assert!(matches!(records[1].verdict, Verdict::CorrectnessMismatch { .. }));
    assert_eq!(records[2].verdict, Verdict::Passed);
    assert!(!records[2].performance.is_sentinel());
    assert!(matches!(
        records[3].verdict,
        Verdict::CrashFault {
            fault: Fault::TimedOut { .. }
        }
    ));
    assert!(matches!(records[4].verdict, Verdict::NoResult { .. }));

    for record in records.iter().filter(|r| !r.correct) {
        assert!(record.performance.is_sentinel(), "{} was timed", record.submission_id);
    }

    let ranked = rank(&records);
    assert_eq!(ranked[0].submission_id, "right");

    let snapshot = evaluator.metrics().snapshot();
    assert_eq!(snapshot.submissions_total, 5);
    assert_eq!(snapshot.passed, 1);
    assert_eq!(snapshot.crash_fault, 2);
    assert_eq!(snapshot.faults.signaled, 1);
    assert_eq!(snapshot.faults.timed_out, 1);
}

/// Correct whole-string split into caller-provided rows
unsafe extern "C" fn split_correct(input: *const c_char, fields: *mut *mut c_char, delimiter: c_char) -> c_int {
    let mut row = 0usize;
    let mut col = 0usize;
    let mut i = 0usize;
    loop {
        let c = *input.add(i);
        if c == delimiter || c == 0 {
            *(*fields.add(row)).add(col) = 0;
            row += 1;
            col = 0;
            if c == 0 {
                return row as c_int;
            }
        } else {
            *(*fields.add(row)).add(col) = c;
            col += 1;
        }
        i += 1;
    }
}

/// Drops empty fields
unsafe extern "C" fn split_skip_empty(input: *const c_char, fields: *mut *mut c_char, delimiter: c_char) -> c_int {
    let mut row = 0usize;
    let mut col = 0usize;
    let mut i = 0usize;
    loop {
        let c = *input.add(i);
        if c == delimiter || c == 0 {
            if col > 0 {
                *(*fields.add(row)).add(col) = 0;
                row += 1;
                col = 0;
            }
            if c == 0 {
                return row as c_int;
            }
        } else {
            *(*fields.add(row)).add(col) = c;
            col += 1;
        }
        i += 1;
    }
}

#[test]
fn split_round_counts_passed_cases() {
    let _serial = common::serial();
    let config = config();
    let preset = SplitPreset {
        timing: config.split.timing.clone(),
        ..SplitPreset::default()
    };
    let driver = SplitDriver::new(
        preset,
        vec![
            SplitCase::new(1, "a,b,,c", ',').unwrap(),
            SplitCase::new(2, "no empties here", ' ').unwrap(),
        ],
    );

    let evaluator = Evaluator::new(config).unwrap();
    let records = evaluator.evaluate_round(
        &driver,
        vec![
            Entrant::unit("exact", Box::new(StaticCodeUnit::new("exact").with_split("split", split_correct))),
            Entrant::unit("lossy", Box::new(StaticCodeUnit::new("lossy").with_split("split", split_skip_empty))),
        ],
    );

    assert_eq!(records[0].verdict, Verdict::Passed);
    assert_eq!((records[0].tests_passed, records[0].tests_total), (2, 2));
    assert_eq!(records[0].to_row().tests, "2 / 2");

    assert!(matches!(records[1].verdict, Verdict::CorrectnessMismatch { .. }));
    assert_eq!((records[1].tests_passed, records[1].tests_total), (1, 2));
    assert!(records[1].performance.is_sentinel());
}

/// Reports every byte of the input as its own field
unsafe extern "C" fn split_every_byte(input: *const c_char, fields: *mut *mut c_char, _delimiter: c_char) -> c_int {
    let mut count = 0usize;
    while *input.add(count) != 0 {
        let row = *fields.add(count);
        *row = *input.add(count);
        *row.add(1) = 0;
        count += 1;
    }
    count as c_int
}

/// Ignores the delimiter and copies the whole input into the first row
unsafe extern "C" fn split_never(input: *const c_char, fields: *mut *mut c_char, _delimiter: c_char) -> c_int {
    let row = *fields;
    let mut i = 0usize;
    loop {
        let c = *input.add(i);
        *row.add(i) = c;
        if c == 0 {
            return 1;
        }
        i += 1;
    }
}

#[test]
fn wrong_field_counts_are_mismatches_not_crashes() {
    let _serial = common::serial();
    let config = config();
    let preset = SplitPreset {
        timing: config.split.timing.clone(),
        ..SplitPreset::default()
    };
    let text = vec!["abc"; 400].join(",");
    let driver = SplitDriver::new(preset, vec![SplitCase::new(11, &text, ',').unwrap()]);

    let evaluator = Evaluator::new(config).unwrap();
    let records = evaluator.evaluate_round(
        &driver,
        vec![
            Entrant::unit("bytes", Box::new(StaticCodeUnit::new("bytes").with_split("split", split_every_byte))),
            Entrant::unit("whole", Box::new(StaticCodeUnit::new("whole").with_split("split", split_never))),
        ],
    );

    let details: Vec<&str> = records
        .iter()
        .map(|record| match &record.verdict {
            Verdict::CorrectnessMismatch { detail } => detail.as_str(),
            other => panic!("{}: expected mismatch, got {:?}", record.submission_id, other),
        })
        .collect();
    assert!(details[0].ends_with("expected 400 fields, got 1599"), "{}", details[0]);
    assert!(details[1].ends_with("expected 400 fields, got 1"), "{}", details[1]);
    assert!(records.iter().all(|r| r.performance.is_sentinel()));
    assert_eq!(evaluator.metrics().snapshot().crash_fault, 0);
}

static SPACED_NEXT: AtomicPtr<c_char> = AtomicPtr::new(std::ptr::null_mut());
static SPACED_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Splits on single spaces for two calls, then returns its third token with
/// the following delimiter still attached
unsafe extern "C" fn strtok_keeps_delimiter(input: *mut c_char, _delimiters: *const c_char) -> *mut c_char {
    if !input.is_null() {
        SPACED_NEXT.store(input, Ordering::Relaxed);
        SPACED_CALLS.store(0, Ordering::Relaxed);
    }
    if SPACED_CALLS.fetch_add(1, Ordering::Relaxed) >= 2 {
        return b"three \0".as_ptr() as *mut c_char;
    }
    let start = SPACED_NEXT.load(Ordering::Relaxed);
    let mut end = start;
    while *end != 0 && *end != b' ' as c_char {
        end = end.add(1);
    }
    *end = 0;
    SPACED_NEXT.store(end.add(1), Ordering::Relaxed);
    start
}

#[test]
fn strtok_mismatch_on_third_call_is_not_reported_earlier() {
    let _serial = common::serial();
    let config = config();
    let driver = StrtokDriver::new(
        config.strtok.clone(),
        TokenizeCase::new("one two  three", " ").unwrap(),
    );
    let evaluator = Evaluator::new(config).unwrap();

    let records = evaluator.evaluate_round(
        &driver,
        vec![Entrant::unit(
            "spaced",
            Box::new(StaticCodeUnit::new("spaced").with_tokenize("strtok", strtok_keeps_delimiter)),
        )],
    );

    match &records[0].verdict {
        Verdict::CorrectnessMismatch { detail } => {
            assert!(detail.contains("Length mismatch at call 3"), "{}", detail);
        }
        other => panic!("expected mismatch, got {:?}", other),
    }
    assert!(records[0].performance.is_sentinel());
    assert_eq!((records[0].tests_passed, records[0].tests_total), (0, 1));
}

/// Returns the whole remaining input as a single token, then NULL
unsafe extern "C" fn strtok_whole(input: *mut c_char, _delimiters: *const c_char) -> *mut c_char {
    input
}

#[test]
fn strtok_mismatch_reports_first_diverging_call() {
    let _serial = common::serial();
    let config = config();
    let driver = StrtokDriver::new(
        config.strtok.clone(),
        TokenizeCase::new("one two  three", " ").unwrap(),
    );
    let evaluator = Evaluator::new(config).unwrap();

    let records = evaluator.evaluate_round(
        &driver,
        vec![Entrant::unit(
            "whole",
            Box::new(StaticCodeUnit::new("whole").with_tokenize("strtok", strtok_whole)),
        )],
    );

    match &records[0].verdict {
        Verdict::CorrectnessMismatch { detail } => {
            assert!(detail.contains("call 1"), "{}", detail);
            assert!(detail.contains("Length"), "{}", detail);
        }
        other => panic!("expected mismatch, got {:?}", other),
    }
}
