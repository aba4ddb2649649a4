use crate::report::record::SubmissionRecord;
use std::cmp::Ordering;

fn compare(a: &SubmissionRecord, b: &SubmissionRecord) -> Ordering {
    b.correct
        .cmp(&a.correct)
        .then_with(|| b.tests_passed.cmp(&a.tests_passed))
        .then_with(|| a.performance.median_ns.cmp(&b.performance.median_ns))
        .then_with(|| {
            a.performance
                .dispersion_ns
                .total_cmp(&b.performance.dispersion_ns)
        })
        .then_with(|| a.submission_id.cmp(&b.submission_id))
}

/// Leaderboard order: correct first, then more passed cases, faster median,
/// smaller dispersion, and finally id
pub fn rank(records: &[SubmissionRecord]) -> Vec<&SubmissionRecord> {
    let mut ordered: Vec<&SubmissionRecord> = records.iter().collect();
    ordered.sort_by(|a, b| compare(a, b));
    ordered
}
