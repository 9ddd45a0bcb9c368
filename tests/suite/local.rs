//! End-to-end searches against real local executables.
#![cfg(unix)]

use std::time::Duration;

use oracle_search::{CancelFlag, SearchError, run};
use oracle_transport::TransportMode;
use oracle_types::{Candidate, IndeterminateReason, ProofBody};

use crate::common::{fast_config, pick_a_number_script, write_script};

#[tokio::test]
async fn solves_against_pickanumber_script() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(1, 100);
    config.local.exec_path = pick_a_number_script(dir.path(), 42);

    let solution = run(TransportMode::Local, &config, CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(solution.value, Candidate::new(42));
    assert_eq!(
        solution.candidates().map(Candidate::value).collect::<Vec<_>>(),
        vec![50, 25, 37, 43, 40, 41, 42]
    );
    match solution.proof.body() {
        ProofBody::ExitStatus { code, stdout, .. } => {
            assert_eq!(*code, 0);
            assert_eq!(stdout.trim(), "flag{found_42}");
        }
        other => panic!("unexpected proof {other:?}"),
    }
}

#[tokio::test]
async fn custom_sentinel_codes_are_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "oracle",
        r#"read n
if [ "$n" -lt 7 ]; then exit 1; fi
if [ "$n" -gt 7 ]; then exit 2; fi
echo seven
exit 0"#,
    );
    let mut config = fast_config(1, 20);
    config.local.exec_path = script;
    config.local.too_low_code = 1;
    config.local.too_high_code = 2;

    let solution = run(TransportMode::Local, &config, CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(solution.value, Candidate::new(7));
    assert_eq!(solution.proof.text(), "seven");
}

#[tokio::test]
async fn hung_oracle_ends_unreachable_with_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(1, 100);
    config.local.exec_path = write_script(dir.path(), "hang", "read n\nsleep 5\nexit 9");
    config.local.timeout = Duration::from_millis(100);
    config.search.retry_limit = 2;

    let err = run(TransportMode::Local, &config, CancelFlag::new())
        .await
        .unwrap_err();

    match err {
        SearchError::Unreachable {
            candidate,
            attempts,
            last,
        } => {
            assert_eq!(candidate, Candidate::new(50));
            assert_eq!(attempts, 2);
            assert_eq!(
                last,
                IndeterminateReason::Timeout {
                    after: Duration::from_millis(100)
                }
            );
        }
        other => panic!("expected Unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_executable_fails_before_any_query() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(1, 100);
    config.local.exec_path = dir.path().join("pickanumber");

    let err = run(TransportMode::Local, &config, CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert!(err.to_string().contains("pickanumber"));
}
