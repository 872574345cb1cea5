//! Tests for linked-source composition.
#![allow(unused_imports, dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rescind::{CancellationToken, CancellationTokenSource};

async fn register_counter(source: &CancellationTokenSource) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    source
        .register(move || async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn linked_cancels_when_any_input_cancels() {
    let a = CancellationTokenSource::new();
    let b = CancellationTokenSource::new();
    let linked = CancellationTokenSource::linked(&[a.token(), b.token()])
        .await
        .unwrap();
    let count = register_counter(&linked).await;

    assert!(!linked.is_cancellation_requested());

    b.cancel().await.unwrap();

    // The linked source fired its own callbacks...
    assert!(linked.is_cancellation_requested());
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // ...without touching the sibling input.
    assert!(!a.is_cancellation_requested());
}

#[tokio::test]
async fn linked_token_reports_upstream_cancellation() {
    let upstream = CancellationTokenSource::new();
    let linked = CancellationTokenSource::linked(&[upstream.token()])
        .await
        .unwrap();
    let token = linked.token();

    upstream.cancel().await.unwrap();

    assert!(token.is_cancellation_requested());
}

#[tokio::test]
async fn linked_fires_only_once_across_inputs() {
    let a = CancellationTokenSource::new();
    let b = CancellationTokenSource::new();
    let linked = CancellationTokenSource::linked(&[a.token(), b.token()])
        .await
        .unwrap();
    let count = register_counter(&linked).await;

    a.cancel().await.unwrap();
    b.cancel().await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn linked_can_be_cancelled_directly() {
    let upstream = CancellationTokenSource::new();
    let linked = CancellationTokenSource::linked(&[upstream.token()])
        .await
        .unwrap();

    linked.cancel().await.unwrap();

    assert!(linked.is_cancellation_completed());
    assert!(!upstream.is_cancellation_requested());

    // Upstream cancelling afterwards is harmless; its registration on the
    // linked source was cleaned up when the linked source cancelled.
    upstream.cancel().await.unwrap();
    assert!(linked.is_cancellation_completed());
}

#[tokio::test]
async fn already_cancelled_input_cancels_immediately() {
    let linked = CancellationTokenSource::linked(&[CancellationToken::cancelled()])
        .await
        .unwrap();

    assert!(linked.is_cancellation_requested());
}

#[tokio::test]
async fn non_cancellable_inputs_yield_an_independent_source() {
    let linked = CancellationTokenSource::linked(&[CancellationToken::none()])
        .await
        .unwrap();

    assert!(!linked.is_cancellation_requested());
    assert!(linked.can_be_cancelled());

    linked.cancel().await.unwrap();
    assert!(linked.is_cancellation_completed());
}

#[tokio::test]
async fn linked_sources_chain() {
    let root = CancellationTokenSource::new();
    let mid = CancellationTokenSource::linked(&[root.token()])
        .await
        .unwrap();
    let leaf = CancellationTokenSource::linked(&[mid.token()])
        .await
        .unwrap();

    root.cancel().await.unwrap();

    assert!(mid.is_cancellation_requested());
    assert!(leaf.is_cancellation_requested());
}

#[tokio::test]
async fn mixed_inputs_skip_the_non_cancellable() {
    let live = CancellationTokenSource::new();
    let linked =
        CancellationTokenSource::linked(&[CancellationToken::none(), live.token()])
            .await
            .unwrap();

    live.cancel().await.unwrap();

    assert!(linked.is_cancellation_requested());
}
