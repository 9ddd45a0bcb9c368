//! Controller properties against in-memory oracles.

use oracle_search::{
    CancelFlag, RetryConfig, SearchController, SearchError, max_decisive_queries, search_with,
};
use oracle_transport::{OracleTransport, QueryFut};
use oracle_types::{Candidate, Verdict, VerdictKind};

use crate::common::{
    HiddenValueOracle, ScriptedOracle, fast_config, indeterminate, interval,
};

#[tokio::test]
async fn finds_42_in_1_to_100_with_expected_trace() {
    let config = fast_config(1, 100);
    let mut oracle = HiddenValueOracle::new(42);

    let solution = search_with(&config, &mut oracle, CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(solution.value, Candidate::new(42));
    let trace: Vec<(i64, VerdictKind)> = solution
        .trace
        .iter()
        .map(|p| (p.candidate.value(), p.verdict))
        .collect();
    assert_eq!(
        trace,
        vec![
            (50, VerdictKind::TooHigh),
            (25, VerdictKind::TooLow),
            (37, VerdictKind::TooLow),
            (43, VerdictKind::TooHigh),
            (40, VerdictKind::TooLow),
            (41, VerdictKind::TooLow),
            (42, VerdictKind::Correct),
        ]
    );
    assert_eq!(solution.proof.text(), "Correct! it was 42");
}

#[tokio::test]
async fn answer_stays_inside_interval_and_converges_in_bound() {
    let domain = interval(1, 1000);
    let bound = max_decisive_queries(domain) as usize;
    let controller = SearchController::new(domain, RetryConfig::immediate(3));

    for hidden in [1, 2, 499, 500, 501, 777, 999, 1000] {
        let mut oracle = HiddenValueOracle::new(hidden);
        let solution = controller.search(&mut oracle).await.unwrap();

        assert_eq!(solution.value.value(), hidden);
        assert!(
            solution.trace.iter().all(|p| p.interval.contains(hidden)),
            "hidden {hidden} left the interval: {:?}",
            solution.trace
        );
        assert!(solution.queries() <= bound, "hidden {hidden} took {}", solution.queries());
    }
}

#[tokio::test]
async fn indeterminates_below_budget_never_move_bounds() {
    let controller = SearchController::new(interval(1, 10_000_000), RetryConfig::immediate(3));
    // Every third query is lost; never three in a row on one midpoint.
    let mut oracle = HiddenValueOracle::flaky(1_234_567, 3);

    let solution = controller.search(&mut oracle).await.unwrap();
    assert_eq!(solution.value.value(), 1_234_567);

    let retried: Vec<_> = solution
        .trace
        .windows(2)
        .filter(|pair| pair[0].verdict == VerdictKind::Indeterminate)
        .collect();
    assert!(!retried.is_empty());
    for pair in retried {
        assert_eq!(pair[1].candidate, pair[0].candidate);
        assert_eq!(pair[1].interval, pair[0].interval);
        assert_eq!(pair[1].attempt, pair[0].attempt + 1);
    }

    let decisive = solution
        .trace
        .iter()
        .filter(|p| p.verdict != VerdictKind::Indeterminate)
        .count();
    assert!(decisive <= max_decisive_queries(interval(1, 10_000_000)) as usize);
}

#[tokio::test]
async fn always_too_low_exhausts_past_domain_high() {
    let controller = SearchController::new(interval(1, 100), RetryConfig::immediate(5));
    let mut oracle = ScriptedOracle::always(Verdict::TooLow);

    let err = controller.search(&mut oracle).await.unwrap_err();

    assert!(matches!(err, SearchError::Exhausted { probes: 7, .. }));
    assert_eq!(oracle.asked, vec![50, 75, 88, 94, 97, 99, 100]);
}

#[tokio::test]
async fn always_indeterminate_is_fatal_after_exactly_retry_limit() {
    let mut config = fast_config(1, 100);
    config.search.retry_limit = 5;
    let mut oracle = ScriptedOracle::always(indeterminate());

    let err = search_with(&config, &mut oracle, CancelFlag::new())
        .await
        .unwrap_err();

    assert_eq!(oracle.asked, vec![50; 5]);
    assert_eq!(err.state(), "fatal");
    assert!(matches!(
        err,
        SearchError::Unreachable { attempts: 5, candidate, .. } if candidate == Candidate::new(50)
    ));
}

#[tokio::test]
async fn recovers_when_oracle_comes_back_on_last_attempt() {
    let controller = SearchController::new(interval(1, 2), RetryConfig::immediate(3));
    let mut oracle = ScriptedOracle::new(
        [indeterminate(), indeterminate(), Verdict::TooLow],
        Verdict::Correct(oracle_types::Proof::response("yes")),
    );

    let solution = controller.search(&mut oracle).await.unwrap();
    assert_eq!(solution.value, Candidate::new(2));
    assert_eq!(oracle.asked, vec![1, 1, 1, 2]);
}

/// Sets the cancel flag once it has answered `after` queries.
struct CancellingOracle {
    inner: HiddenValueOracle,
    cancel: CancelFlag,
    after: usize,
}

impl OracleTransport for CancellingOracle {
    fn name(&self) -> &'static str {
        "cancelling"
    }

    fn query(&mut self, candidate: Candidate) -> QueryFut<'_> {
        if self.inner.asked.len() + 1 == self.after {
            self.cancel.cancel();
        }
        self.inner.query(candidate)
    }
}

#[tokio::test]
async fn cancellation_stops_before_next_query_and_reports_interval() {
    let cancel = CancelFlag::new();
    let controller = SearchController::new(interval(1, 100), RetryConfig::immediate(3))
        .with_cancel(cancel.clone());
    let mut oracle = CancellingOracle {
        inner: HiddenValueOracle::new(42),
        cancel,
        after: 3,
    };

    let err = controller.search(&mut oracle).await.unwrap_err();

    // 50 too high, 25 too low, 37 too low: [38, 49] remains.
    assert_eq!(oracle.inner.asked, vec![50, 25, 37]);
    assert!(matches!(
        err,
        SearchError::Cancelled { interval: remaining } if remaining == interval(38, 49)
    ));
}

#[tokio::test]
async fn single_value_domain_takes_one_query() {
    let controller = SearchController::new(interval(7, 7), RetryConfig::immediate(1));
    let mut oracle = HiddenValueOracle::new(7);

    let solution = controller.search(&mut oracle).await.unwrap();
    assert_eq!(solution.candidates().collect::<Vec<_>>(), vec![Candidate::new(7)]);
}
