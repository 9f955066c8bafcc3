use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use voxrag::application::services::{OffloadError, OffloadPool};

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn gated_job(
    gate: Arc<AtomicBool>,
) -> impl FnOnce(&CancellationToken) -> u32 + Send + 'static {
    move |_cancel| {
        while !gate.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(2));
        }
        7
    }
}

#[tokio::test]
async fn given_idle_pool_when_running_job_then_returns_its_value() {
    let pool = OffloadPool::new(2, 2, None);

    let result = pool.run(|_| "transcript".to_string()).await.unwrap();

    assert_eq!(result, "transcript");
    assert_eq!(pool.available_slots(), 4);
}

#[tokio::test]
async fn given_full_pool_when_submitting_then_rejects_with_saturated() {
    let pool = OffloadPool::new(1, 1, None);
    let gate = Arc::new(AtomicBool::new(false));

    let running = {
        let pool = pool.clone();
        let job = gated_job(Arc::clone(&gate));
        tokio::spawn(async move { pool.run(job).await })
    };
    let queued = {
        let pool = pool.clone();
        let job = gated_job(Arc::clone(&gate));
        tokio::spawn(async move { pool.run(job).await })
    };
    wait_until(|| pool.available_slots() == 0).await;

    let rejected = pool.run(|_| 0).await;
    assert!(matches!(
        rejected,
        Err(OffloadError::Saturated { capacity: 2 })
    ));

    gate.store(true, Ordering::SeqCst);
    assert_eq!(running.await.unwrap().unwrap(), 7);
    assert_eq!(queued.await.unwrap().unwrap(), 7);
    assert_eq!(pool.available_slots(), 2);
}

#[tokio::test]
async fn given_slow_job_when_deadline_passes_then_times_out_and_cancels_token() {
    let pool = OffloadPool::new(1, 0, Some(Duration::from_millis(30)));
    let saw_cancel = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&saw_cancel);
    let result = pool
        .run(move |cancel| {
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(2));
            }
            flag.store(true, Ordering::SeqCst);
        })
        .await;

    assert!(matches!(result, Err(OffloadError::TimedOut(_))));
    wait_until(|| saw_cancel.load(Ordering::SeqCst)).await;
    wait_until(|| pool.available_slots() == 1).await;
}

#[tokio::test]
async fn given_caller_goes_away_when_job_is_running_then_token_is_cancelled() {
    let pool = OffloadPool::new(1, 0, None);
    let started = Arc::new(AtomicBool::new(false));
    let saw_cancel = Arc::new(AtomicBool::new(false));

    let handle = {
        let pool = pool.clone();
        let started = Arc::clone(&started);
        let saw_cancel = Arc::clone(&saw_cancel);
        tokio::spawn(async move {
            pool.run(move |cancel| {
                started.store(true, Ordering::SeqCst);
                while !cancel.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(2));
                }
                saw_cancel.store(true, Ordering::SeqCst);
            })
            .await
        })
    };
    wait_until(|| started.load(Ordering::SeqCst)).await;

    handle.abort();

    wait_until(|| saw_cancel.load(Ordering::SeqCst)).await;
    wait_until(|| pool.available_slots() == 1).await;
}

#[tokio::test]
async fn given_panicking_job_when_running_then_reports_panic_message() {
    let pool = OffloadPool::new(1, 0, None);

    let result: Result<(), _> = pool.run(|_| panic!("decoder exploded")).await;

    match result {
        Err(OffloadError::Panicked(msg)) => assert_eq!(msg, "decoder exploded"),
        other => panic!("expected panic error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(pool.available_slots(), 1);
}
