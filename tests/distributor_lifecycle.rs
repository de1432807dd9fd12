use aurumx::application::market_data::{
    DistributorConfig, DistributorState, PriceDistributor, RetryPolicy, Subscription,
};
use aurumx::domain::errors::MarketDataError;
use aurumx::domain::market::RawBar;
use aurumx::infrastructure::ScriptedPriceFeed;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::time;

fn bar(timestamp: i64) -> RawBar {
    RawBar::new(timestamp, 2000.0, 2001.0, 1999.0, 2000.5, 50.0)
}

fn config(max_attempts: u32) -> DistributorConfig {
    DistributorConfig {
        poll_interval: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
        },
        ..DistributorConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_state_walks_through_retry_to_exhaustion() {
    let feed = Arc::new(ScriptedPriceFeed::new());
    feed.set_when_exhausted(Err(MarketDataError::ConnectionLost {
        reason: "refused".to_string(),
    }));

    let distributor = PriceDistributor::new(feed.clone(), config(4));
    let states = Arc::new(Mutex::new(Vec::new()));
    let mut rx = distributor.watch_state();
    let recorder = {
        let states = Arc::clone(&states);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                states.lock().unwrap().push(state);
                if state == DistributorState::Exhausted {
                    break;
                }
            }
        })
    };

    assert_eq!(distributor.state(), DistributorState::Idle);
    distributor.start();
    tokio_test::assert_ok!(recorder.await);

    // Delays 1s, 2s, 4s between the four attempts
    assert_eq!(feed.latest_calls(), 4);
    let seen = states.lock().unwrap().clone();
    assert!(seen.contains(&DistributorState::Retrying { attempt: 1 }));
    assert_eq!(seen.last(), Some(&DistributorState::Exhausted));
    assert!(seen.contains(&DistributorState::Retrying { attempt: 3 }));
    assert!(!seen.contains(&DistributorState::Active));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_as_soon_as_exhausted_is_observed() {
    const LIMIT: Duration = Duration::from_secs(5);

    for _ in 0..100 {
        let feed = Arc::new(ScriptedPriceFeed::new());
        feed.push_failure(MarketDataError::ConnectionLost {
            reason: "refused".to_string(),
        });

        let distributor = PriceDistributor::new(feed.clone(), config(1));
        let mut states = distributor.watch_state();
        distributor.start();

        let exhausted = time::timeout(
            LIMIT,
            states.wait_for(|state| *state == DistributorState::Exhausted),
        )
        .await
        .is_ok_and(|changed| changed.is_ok());
        assert!(exhausted);

        distributor.start();
        let polled_again = time::timeout(LIMIT, async {
            while feed.latest_calls() < 2 {
                time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        tokio_test::assert_ok!(polled_again);
        assert_ne!(distributor.state(), DistributorState::Exhausted);

        distributor.disconnect();
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_schedule_is_capped() {
    let feed = Arc::new(ScriptedPriceFeed::new());
    feed.set_when_exhausted(Err(MarketDataError::Timeout { duration_ms: 1 }));

    let distributor = PriceDistributor::new(feed.clone(), config(10));
    distributor.start();

    // Attempts at 0, 1, 3, 7, 11, 15 (delays 1, 2, 4, 4, 4)
    time::sleep(Duration::from_millis(15_500)).await;
    assert_eq!(feed.latest_calls(), 6);
    assert_eq!(
        distributor.state(),
        DistributorState::Retrying { attempt: 6 }
    );
    distributor.disconnect();
}

#[tokio::test(start_paused = true)]
async fn test_callback_may_unsubscribe_itself() {
    let feed = Arc::new(ScriptedPriceFeed::new());
    feed.push_bar(bar(1));
    feed.push_bar(bar(2));

    let distributor = PriceDistributor::new(feed.clone(), config(3));
    let handle: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());
    let calls = Arc::new(Mutex::new(0));

    let subscription = {
        let handle = Arc::clone(&handle);
        let calls = Arc::clone(&calls);
        distributor.subscribe(move |_| {
            *calls.lock().unwrap() += 1;
            if let Some(subscription) = handle.get() {
                subscription.unsubscribe();
            }
        })
    };
    assert!(handle.set(subscription).is_ok());

    distributor.start();
    time::sleep(Duration::from_secs(12)).await;

    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(distributor.subscriber_count(), 0);
    assert_eq!(distributor.last_candle().map(|c| c.timestamp), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_no_bar_yet_is_not_a_failure() {
    let feed = Arc::new(ScriptedPriceFeed::new());
    let distributor = PriceDistributor::new(feed.clone(), config(3));
    distributor.start();

    time::sleep(Duration::from_secs(21)).await;
    assert_eq!(distributor.state(), DistributorState::Active);
    assert_eq!(feed.latest_calls(), 5);
    assert!(distributor.last_candle().is_none());

    feed.push_bar(bar(10));
    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(distributor.last_candle().map(|c| c.timestamp), Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_distributor_stops_polling() {
    let feed = Arc::new(ScriptedPriceFeed::new());
    let distributor = PriceDistributor::new(feed.clone(), config(3));
    distributor.start();
    time::sleep(Duration::from_secs(1)).await;
    drop(distributor);

    let calls = feed.latest_calls();
    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.latest_calls(), calls);
}
