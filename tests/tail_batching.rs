// tests/tail_batching.rs

mod common;
use crate::common::init_tracing;

use std::time::Duration;

use pulserun::tail::{batch_lines, BatchPolicy, LogLineBatch};
use tokio::sync::mpsc;
use tokio::time::{advance, sleep, Instant};

fn policy() -> BatchPolicy {
    BatchPolicy {
        max_lines: 20,
        window: Duration::from_millis(1000),
    }
}

fn lines(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("line {i}")).collect()
}

/// Send `groups` bursts of 5 lines, `spacing` apart, then keep the source
/// open so only the count and the window can trigger flushes.
fn send_groups(line_tx: mpsc::Sender<String>, groups: usize, spacing: Duration) {
    tokio::spawn(async move {
        for group in 0..groups {
            for line in lines(group * 5..group * 5 + 5) {
                line_tx.send(line).await.unwrap();
            }
            sleep(spacing).await;
        }
        sleep(Duration::from_secs(60)).await;
        drop(line_tx);
    });
}

fn within(elapsed: Duration, at_ms: u64) -> bool {
    let at = Duration::from_millis(at_ms);
    elapsed >= at && elapsed < at + Duration::from_millis(50)
}

#[tokio::test(start_paused = true)]
async fn full_batches_flush_immediately() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    let start = Instant::now();
    for line in lines(0..45) {
        line_tx.send(line).await.unwrap();
    }

    let first = out_rx.recv().await.unwrap();
    let second = out_rx.recv().await.unwrap();
    assert_eq!(first, lines(0..20));
    assert_eq!(second, lines(20..40));
    assert!(start.elapsed() < Duration::from_millis(1000));

    // The remaining 5 wait for the window.
    let third = out_rx.recv().await.unwrap();
    assert_eq!(third, lines(40..45));
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn fast_groups_flush_at_every_twentieth_line() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    let start = Instant::now();
    // Groups at 0, 200, ..., 1800ms.
    send_groups(line_tx, 10, Duration::from_millis(200));

    // The 20th line lands with the group at 600ms, the 40th at 1400ms.
    let first = out_rx.recv().await.unwrap();
    assert_eq!(first, lines(0..20));
    assert!(within(start.elapsed(), 600), "flushed at {:?}", start.elapsed());

    let second = out_rx.recv().await.unwrap();
    assert_eq!(second, lines(20..40));
    assert!(within(start.elapsed(), 1400), "flushed at {:?}", start.elapsed());

    // The last 10 never reach the count and wait out the window.
    let third = out_rx.recv().await.unwrap();
    assert_eq!(third, lines(40..50));
    assert!(within(start.elapsed(), 2400), "flushed at {:?}", start.elapsed());
}

#[tokio::test(start_paused = true)]
async fn window_flush_between_count_flushes_restarts_the_count() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    let start = Instant::now();
    // Groups at 0, 300, ..., 2100ms.
    send_groups(line_tx, 8, Duration::from_millis(300));

    let first = out_rx.recv().await.unwrap();
    assert_eq!(first, lines(0..20));
    assert!(within(start.elapsed(), 900), "flushed at {:?}", start.elapsed());

    // 1000ms after the count flush, three more groups are waiting.
    let second = out_rx.recv().await.unwrap();
    assert_eq!(second, lines(20..35));
    assert!(within(start.elapsed(), 1900), "flushed at {:?}", start.elapsed());

    let third = out_rx.recv().await.unwrap();
    assert_eq!(third, lines(35..40));
    assert!(within(start.elapsed(), 2900), "flushed at {:?}", start.elapsed());
}

#[tokio::test(start_paused = true)]
async fn slow_lines_are_grouped_per_window() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    // One line every 200ms, starting at 100ms: five per 1000ms window.
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        for line in lines(0..10) {
            line_tx.send(line).await.unwrap();
            sleep(Duration::from_millis(200)).await;
        }
    });

    let first = out_rx.recv().await.unwrap();
    let second = out_rx.recv().await.unwrap();
    assert_eq!(first, lines(0..5));
    assert_eq!(second, lines(5..10));
}

#[tokio::test(start_paused = true)]
async fn empty_windows_produce_nothing() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel::<String>(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    advance(Duration::from_millis(3500)).await;
    assert!(out_rx.try_recv().is_err(), "no batch expected for empty windows");

    line_tx.send("late".to_string()).await.unwrap();
    let batch = out_rx.recv().await.unwrap();
    assert_eq!(batch, vec!["late".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn remainder_is_flushed_when_source_closes() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, mut out_rx) = mpsc::channel::<LogLineBatch>(16);
    let task = tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    for line in lines(0..3) {
        line_tx.send(line).await.unwrap();
    }
    drop(line_tx);

    assert_eq!(out_rx.recv().await.unwrap(), lines(0..3));
    assert!(out_rx.recv().await.is_none());
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn batching_stops_when_receiver_is_gone() {
    init_tracing();
    let (line_tx, line_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel::<LogLineBatch>(16);
    let task = tokio::spawn(batch_lines(line_rx, policy(), out_tx));

    drop(out_rx);
    for line in lines(0..20) {
        if line_tx.send(line).await.is_err() {
            break;
        }
    }

    task.await.unwrap();
    assert!(line_tx.is_closed());
}
