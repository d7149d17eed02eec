//! IDLE against a live in-memory server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use postbox_imap::parser::{DataResponseType, Response};
use postbox_imap::transaction::catalog::{Idle, IdleState};
use postbox_imap::transaction::{self, ResultCode};
use postbox_imap::Config;

use common::live;

fn config() -> Config {
    Config::builder("localhost")
        .receive_timeout(Duration::from_secs(30))
        .idle_poll_interval(Duration::from_millis(50))
        .build()
}

#[tokio::test]
async fn done_is_sent_once_from_many_tasks() {
    let (mut conn, mut server) = live(&config());
    let updates = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&updates);
    let (idle, handle) = Idle::new(move |response: &Response| {
        if matches!(response, Response::Data(data) if data.kind == DataResponseType::Exists) {
            seen.fetch_add(1, Ordering::SeqCst);
        }
        true
    });

    let driver = tokio::spawn(async move {
        let result = transaction::run(&mut conn, idle).await;
        (result, conn)
    });

    server.expect("0001 IDLE").await;
    server.send("+ idling\r\n").await;
    assert_eq!(handle.wait_started().await, IdleState::Idling);
    server.send("* 3 EXISTS\r\n").await;

    while updates.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let callers: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.done() })
        })
        .collect();
    let mut winners = 0;
    for caller in callers {
        if caller.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    server.expect("DONE").await;
    server.send("0001 OK IDLE terminated\r\n").await;

    let (result, conn) = driver.await.unwrap();
    assert_eq!(result.code, ResultCode::Ok);
    assert!(!conn.is_idling());
    assert_eq!(handle.state(), IdleState::Finished);

    drop(conn);
    assert!(server.drain().await.is_empty());
}

#[tokio::test]
async fn done_before_acceptance_still_ends_idle() {
    let (mut conn, mut server) = live(&config());
    let (idle, handle) = Idle::new(|_: &Response| true);

    let driver = tokio::spawn(async move { transaction::run(&mut conn, idle).await });

    server.expect("0001 IDLE").await;
    assert!(handle.done());
    server.send("+ idling\r\n").await;
    server.expect("DONE").await;
    server.send("0001 OK IDLE terminated\r\n").await;

    assert!(driver.await.unwrap().succeeded());
    assert_eq!(handle.state(), IdleState::Finished);
}

#[tokio::test]
async fn callback_ends_idle() {
    let (mut conn, mut server) = live(&config());
    let (idle, handle) = Idle::new(|response: &Response| {
        !matches!(response, Response::Data(data) if data.kind == DataResponseType::Expunge)
    });

    let driver = tokio::spawn(async move { transaction::run(&mut conn, idle).await });

    server.expect("0001 IDLE").await;
    server.send("+ idling\r\n* 4 EXISTS\r\n* 2 EXPUNGE\r\n").await;
    server.expect("DONE").await;
    server.send("0001 OK IDLE terminated\r\n").await;

    let result = driver.await.unwrap();
    assert!(result.succeeded());
    assert!(handle.is_done_requested());
    assert_eq!(result.responses.len(), 4);
}

#[tokio::test]
async fn idle_outlives_receive_timeout() {
    let config = Config::builder("localhost")
        .receive_timeout(Duration::from_millis(100))
        .idle_poll_interval(Duration::from_millis(10))
        .build();
    let (mut conn, mut server) = live(&config);
    let (idle, handle) = Idle::new(|_: &Response| true);

    let driver = tokio::spawn(async move {
        let result = transaction::run(&mut conn, idle).await;
        (result, conn.receive_timeout())
    });

    server.expect("0001 IDLE").await;
    server.send("+ idling\r\n").await;
    handle.wait_started().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.state(), IdleState::Idling);

    handle.done();
    server.expect("DONE").await;
    server.send("0001 OK IDLE terminated\r\n").await;

    let (result, timeout) = driver.await.unwrap();
    assert!(result.succeeded());
    assert_eq!(timeout, Duration::from_millis(100));
}

#[tokio::test]
async fn rejected_idle_finishes_handle() {
    let (mut conn, mut server) = live(&config());
    let (idle, handle) = Idle::new(|_: &Response| true);

    let driver = tokio::spawn(async move { transaction::run(&mut conn, idle).await });
    server.expect("0001 IDLE").await;
    server.send("0001 BAD IDLE not supported\r\n").await;

    assert_eq!(driver.await.unwrap().code, ResultCode::Bad);
    assert_eq!(handle.wait_started().await, IdleState::Finished);
}

#[tokio::test]
async fn silence_after_done_times_out() {
    let config = Config::builder("localhost")
        .receive_timeout(Duration::from_millis(50))
        .idle_poll_interval(Duration::from_millis(10))
        .build();
    let (mut conn, mut server) = live(&config);
    let (idle, handle) = Idle::new(|_: &Response| true);

    let driver = tokio::spawn(async move {
        let result = transaction::run(&mut conn, idle).await;
        (result, conn.is_idling())
    });

    server.expect("0001 IDLE").await;
    server.send("+ idling\r\n").await;
    assert_eq!(handle.wait_started().await, IdleState::Idling);
    assert!(handle.done());
    server.expect("DONE").await;

    let (result, idling) = tokio::time::timeout(Duration::from_secs(2), driver)
        .await
        .expect("transaction hung after DONE")
        .unwrap();
    assert_eq!(result.code, ResultCode::SocketTimeout);
    assert!(!idling);
    assert_eq!(handle.state(), IdleState::Finished);
    drop(server);
}
