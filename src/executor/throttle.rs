//! Call spacing for the shared sandbox
//!
//! Caps in-flight calls with a semaphore and keeps consecutive call starts at
//! least `min_interval` apart.

use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::time::Instant;

use super::ExecutionError;

#[derive(Debug)]
pub struct Throttle {
    permits: Semaphore,
    min_interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(max_concurrency: usize, min_interval: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrency.max(1)),
            min_interval,
            next_start: Mutex::new(None),
        }
    }

    /// No spacing and no practical concurrency cap
    pub fn unlimited() -> Self {
        Self::new(Semaphore::MAX_PERMITS, Duration::ZERO)
    }

    /// Wait for a call slot. The permit must be held for the duration of the call.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, ExecutionError> {
        let permit = self.permits.acquire().await?;

        let start = {
            let mut next_start = self.next_start.lock().await;
            let now = Instant::now();
            let start = match *next_start {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_start = Some(start + self.min_interval);
            start
        };
        tokio::time::sleep_until(start).await;

        Ok(permit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spaces_consecutive_calls() {
        let throttle = Throttle::new(4, Duration::from_millis(40));
        let begin = Instant::now();
        for _ in 0..3 {
            let _permit = throttle.acquire().await.unwrap();
        }
        assert!(begin.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_caps_concurrency() {
        let throttle = Arc::new(Throttle::new(2, Duration::ZERO));
        let first = throttle.acquire().await.unwrap();
        let _second = throttle.acquire().await.unwrap();
        assert_eq!(throttle.permits.available_permits(), 0);

        let waiter = {
            let throttle = throttle.clone();
            tokio::spawn(async move {
                let _third = throttle.acquire().await.unwrap();
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_unlimited_does_not_wait() {
        let throttle = Throttle::unlimited();
        let begin = Instant::now();
        for _ in 0..10 {
            let _permit = throttle.acquire().await.unwrap();
        }
        assert!(begin.elapsed() < Duration::from_millis(50));
    }
}
