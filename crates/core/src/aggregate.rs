//! Result aggregation: summary counts and status precedence.
//!
//! One precedence table is used everywhere. Per sequence, evaluated in
//! fixed order with first match winning:
//! Cancel > Error > Wait (last result waiting) > Fail (required) >
//! Skip (required skipped, no required pass) > Pass.
//! Per group and instance: Cancel/Fail > Error > Skip > NotRun > Pass.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::outcome::TestStatus;
use crate::registry::SequenceRegistry;
use crate::result::{SequenceResult, SequenceStatus, TestResult};

/// Summary counts recomputed from scratch after every run or resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub required_passed: usize,
    pub required_total: usize,
    pub errors: usize,
    pub todos: usize,
    pub skips: usize,
    pub optional_passed: usize,
    pub optional_total: usize,
}

/// Bucket every result by (`required` flag × status).
pub fn summarize(results: &[TestResult]) -> ResultSummary {
    let mut summary = ResultSummary::default();
    for result in results {
        if result.required {
            summary.required_total += 1;
            if result.status == TestStatus::Pass {
                summary.required_passed += 1;
            }
        } else {
            summary.optional_total += 1;
            if result.status == TestStatus::Pass {
                summary.optional_passed += 1;
            }
        }
        match result.status {
            TestStatus::Error => summary.errors += 1,
            TestStatus::Todo => summary.todos += 1,
            TestStatus::Skip => summary.skips += 1,
            _ => {}
        }
    }
    summary
}

/// Overall status of one sequence run.
pub fn sequence_status(results: &[TestResult]) -> SequenceStatus {
    if results.iter().any(|r| r.status == TestStatus::Cancel) {
        return SequenceStatus::Cancel;
    }
    if results.iter().any(|r| r.status == TestStatus::Error) {
        return SequenceStatus::Error;
    }
    if results.last().is_some_and(|r| r.status == TestStatus::Wait) {
        return SequenceStatus::Wait;
    }
    if results
        .iter()
        .any(|r| r.required && r.status == TestStatus::Fail)
    {
        return SequenceStatus::Fail;
    }
    let required_skipped = results
        .iter()
        .any(|r| r.required && r.status == TestStatus::Skip);
    let required_passed = results
        .iter()
        .any(|r| r.required && r.status == TestStatus::Pass);
    if required_skipped && !required_passed {
        return SequenceStatus::Skip;
    }
    SequenceStatus::Pass
}

/// Keep, per sequence name, only the most recently created result.
/// Ordered by `created_at` (RFC 3339 strings compare lexicographically);
/// ties go to the most recently written record.
pub fn latest_results<'a>(
    results: &'a [SequenceResult],
) -> BTreeMap<&'a str, &'a SequenceResult> {
    let mut latest: BTreeMap<&str, &SequenceResult> = BTreeMap::new();
    for result in results {
        match latest.get(result.sequence_name.as_str()) {
            Some(existing) if existing.created_at > result.created_at => {}
            _ => {
                latest.insert(result.sequence_name.as_str(), result);
            }
        }
    }
    latest
}

/// Status of a grouped view keyed by logical test-case id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Fail,
    Error,
    Skip,
    NotRun,
    Pass,
}

/// Roll up the latest results of one group. `None` entries are sequences
/// with no results recorded. A still-waiting run counts as not-run: the
/// group has no completed result to judge.
pub fn group_status<I>(statuses: I) -> GroupStatus
where
    I: IntoIterator<Item = Option<SequenceStatus>>,
{
    let mut seen_error = false;
    let mut seen_skip = false;
    let mut seen_not_run = false;
    let mut seen_any = false;
    for status in statuses {
        seen_any = true;
        match status {
            Some(SequenceStatus::Cancel) | Some(SequenceStatus::Fail) => return GroupStatus::Fail,
            Some(SequenceStatus::Error) => seen_error = true,
            Some(SequenceStatus::Skip) => seen_skip = true,
            Some(SequenceStatus::Wait) | None => seen_not_run = true,
            Some(SequenceStatus::Pass) => {}
        }
    }
    if seen_error {
        GroupStatus::Error
    } else if seen_skip {
        GroupStatus::Skip
    } else if seen_not_run || !seen_any {
        GroupStatus::NotRun
    } else {
        GroupStatus::Pass
    }
}

/// The instance's final result: Pass only if every *required* registered
/// sequence's latest result is Pass.
pub fn instance_passed(registry: &SequenceRegistry, results: &[SequenceResult]) -> bool {
    let latest = latest_results(results);
    registry
        .sequences()
        .filter(|s| s.required)
        .all(|s| {
            latest
                .get(s.name.as_str())
                .is_some_and(|r| r.status == SequenceStatus::Pass)
        })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: TestStatus, required: bool) -> TestResult {
        TestResult {
            test_id: "T-01".to_string(),
            name: "t".to_string(),
            index: 0,
            status,
            message: None,
            detail: None,
            required,
            warnings: Vec::new(),
            requests: Vec::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn required_skip_without_required_pass_is_skip() {
        // Only an optional test passed; the required one skipped.
        let results = vec![result(TestStatus::Pass, false), result(TestStatus::Skip, true)];
        assert_eq!(sequence_status(&results), SequenceStatus::Skip);
    }

    #[test]
    fn required_skip_with_required_pass_stays_pass() {
        let results = vec![result(TestStatus::Pass, true), result(TestStatus::Skip, true)];
        assert_eq!(sequence_status(&results), SequenceStatus::Pass);
    }

    #[test]
    fn optional_fail_does_not_fail_sequence() {
        let results = vec![result(TestStatus::Pass, true), result(TestStatus::Fail, false)];
        assert_eq!(sequence_status(&results), SequenceStatus::Pass);
    }

    #[test]
    fn error_outranks_fail() {
        let results = vec![result(TestStatus::Fail, true), result(TestStatus::Error, true)];
        assert_eq!(sequence_status(&results), SequenceStatus::Error);
    }

    #[test]
    fn waiting_last_result_is_wait() {
        let results = vec![result(TestStatus::Pass, true), result(TestStatus::Wait, true)];
        assert_eq!(sequence_status(&results), SequenceStatus::Wait);
    }

    #[test]
    fn cancel_outranks_everything() {
        let results = vec![
            result(TestStatus::Error, true),
            result(TestStatus::Cancel, true),
        ];
        assert_eq!(sequence_status(&results), SequenceStatus::Cancel);
    }

    #[test]
    fn summary_buckets_by_required_and_status() {
        let results = vec![
            result(TestStatus::Pass, true),
            result(TestStatus::Pass, true),
            result(TestStatus::Skip, true),
            result(TestStatus::Error, true),
            result(TestStatus::Pass, false),
            result(TestStatus::Fail, false),
            result(TestStatus::Todo, false),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.required_passed, 2);
        assert_eq!(summary.required_total, 4);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.todos, 1);
        assert_eq!(summary.skips, 1);
        assert_eq!(summary.optional_passed, 1);
        assert_eq!(summary.optional_total, 3);
    }

    fn sequence_result(name: &str, status: SequenceStatus, created_at: &str) -> SequenceResult {
        SequenceResult {
            id: format!("{}-{}", name, created_at),
            instance_id: "inst".to_string(),
            sequence_name: name.to_string(),
            test_case: None,
            required: true,
            results: Vec::new(),
            status,
            wait_at: None,
            redirect_to: None,
            next_sequences: Vec::new(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn latest_results_picks_newest_and_breaks_ties_by_write_order() {
        let results = vec![
            sequence_result("a", SequenceStatus::Fail, "2026-01-01T00:00:00Z"),
            sequence_result("a", SequenceStatus::Pass, "2026-01-02T00:00:00Z"),
            sequence_result("b", SequenceStatus::Fail, "2026-01-03T00:00:00Z"),
            sequence_result("b", SequenceStatus::Pass, "2026-01-03T00:00:00Z"),
        ];
        let latest = latest_results(&results);
        assert_eq!(latest["a"].status, SequenceStatus::Pass);
        // Tie on created_at: the most recently written record wins.
        assert_eq!(latest["b"].status, SequenceStatus::Pass);
    }

    #[test]
    fn instance_outcome_considers_only_required_sequences() {
        use crate::registry::RegistryBuilder;
        use crate::sequence::SequenceDefinition;
        use crate::test::TestDefinition;

        let mut builder = RegistryBuilder::new();
        builder
            .register(
                SequenceDefinition::new("required_seq", "R")
                    .test(TestDefinition::new("t", |_s| Ok(()))),
            )
            .unwrap();
        builder
            .register(
                SequenceDefinition::new("optional_seq", "O")
                    .optional()
                    .test(TestDefinition::new("t", |_s| Ok(()))),
            )
            .unwrap();
        let registry = builder.build();

        // Required passed, optional failed: the instance still passes.
        let results = vec![
            sequence_result("required_seq", SequenceStatus::Pass, "2026-01-01T00:00:00Z"),
            sequence_result("optional_seq", SequenceStatus::Fail, "2026-01-01T00:00:00Z"),
        ];
        assert!(instance_passed(&registry, &results));

        // Required sequence's latest failed: the instance fails.
        let results = vec![
            sequence_result("required_seq", SequenceStatus::Pass, "2026-01-01T00:00:00Z"),
            sequence_result("required_seq", SequenceStatus::Fail, "2026-01-02T00:00:00Z"),
        ];
        assert!(!instance_passed(&registry, &results));

        // Required sequence never ran: not a pass.
        assert!(!instance_passed(&registry, &[]));
    }

    #[test]
    fn group_precedence() {
        use SequenceStatus as S;
        assert_eq!(group_status([Some(S::Pass), Some(S::Cancel)]), GroupStatus::Fail);
        assert_eq!(group_status([Some(S::Error), Some(S::Skip)]), GroupStatus::Error);
        assert_eq!(group_status([Some(S::Pass), Some(S::Skip)]), GroupStatus::Skip);
        assert_eq!(group_status([Some(S::Pass), None]), GroupStatus::NotRun);
        assert_eq!(group_status([Some(S::Pass), Some(S::Pass)]), GroupStatus::Pass);
        assert_eq!(group_status::<[Option<S>; 0]>([]), GroupStatus::NotRun);
    }
}
