//! End-to-end searches against an in-process TCP oracle.

use std::time::Duration;

use oracle_search::{CancelFlag, SearchError, run};
use oracle_transport::TransportMode;
use oracle_types::{Candidate, IndeterminateReason, ProofBody};
use tokio::net::TcpListener;

use crate::common::{fast_config, spawn_guess_server};

fn remote_config(port: u16, low: i64, high: i64) -> oracle_config::OracleConfig {
    let mut config = fast_config(low, high);
    config.remote.host = "127.0.0.1".to_string();
    config.remote.port = port;
    config.remote.timeout = Duration::from_secs(2);
    config
}

#[tokio::test]
async fn solves_against_guess_server() {
    let port = spawn_guess_server(4_242_424, 0).await;
    let config = remote_config(port, 1, 10_000_000);

    let solution = run(TransportMode::Remote, &config, CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(solution.value, Candidate::new(4_242_424));
    assert!(solution.queries() <= 25);
    match solution.proof.body() {
        ProofBody::Response { body } => assert!(body.contains("flag{remote_4242424}")),
        other => panic!("unexpected proof {other:?}"),
    }
}

#[tokio::test]
async fn dropped_connections_are_retried_on_same_candidate() {
    let port = spawn_guess_server(42, 2).await;
    let mut config = remote_config(port, 1, 100);
    config.search.retry_limit = 3;

    let solution = run(TransportMode::Remote, &config, CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(solution.value, Candidate::new(42));
    let first_three: Vec<i64> = solution.candidates().take(3).map(Candidate::value).collect();
    assert_eq!(first_three, vec![50, 50, 50]);
    assert_eq!(solution.trace[2].attempt, 3);
}

#[tokio::test]
async fn refused_connection_is_fatal_after_budget() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = remote_config(port, 1, 100);
    config.search.retry_limit = 2;

    let err = run(TransportMode::Remote, &config, CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Unreachable {
            attempts: 2,
            last: IndeterminateReason::Connect(_),
            ..
        }
    ));
}

#[tokio::test]
async fn unresolvable_host_is_a_transport_error() {
    let mut config = remote_config(5277, 1, 100);
    config.remote.host = "oracle-probe.invalid".to_string();

    let err = run(TransportMode::Remote, &config, CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
}
