// src/crawl/frontier.rs
// =============================================================================
// The frontier: URLs waiting to be crawled, in discovery order.
//
// How it works:
// - A VecDeque gives O(1) push at the back and pop at the front
// - A single lock guards the queue and the processed counter together, so
//   nobody can observe a processed count that disagrees with the queue
// - A Notify wakes the dispatcher when new work arrives instead of having
//   it sleep and poll
// =============================================================================

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::FrontierError;

#[derive(Debug, Default)]
struct Queue {
    items: VecDeque<String>,
    total_processed: usize,
}

/// Thread-safe FIFO of pending URLs plus a processed counter.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<Queue>,
    available: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(Queue {
                items: VecDeque::with_capacity(capacity),
                total_processed: 0,
            }),
            available: Notify::new(),
        }
    }

    /// Appends `url` to the tail and wakes a waiting consumer.
    pub fn enqueue(&self, url: String) {
        self.queue.lock().items.push_back(url);
        self.available.notify_one();
    }

    /// Removes the head of the queue.
    ///
    /// Callers are expected to check `size()` first; an empty frontier is
    /// reported as an error and leaves the counters untouched.
    pub fn dequeue(&self) -> Result<String, FrontierError> {
        self.try_dequeue().ok_or(FrontierError::Empty)
    }

    /// Removes the head of the queue if there is one.
    pub fn try_dequeue(&self) -> Option<String> {
        let mut queue = self.queue.lock();
        let url = queue.items.pop_front()?;
        queue.total_processed += 1;
        Some(url)
    }

    /// Number of pending URLs.
    pub fn size(&self) -> usize {
        self.queue.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of successful dequeues so far. Never decreases.
    pub fn total_processed_urls(&self) -> usize {
        self.queue.lock().total_processed
    }

    /// Wakes a consumer blocked in `wait_for_work` without adding anything,
    /// so it can re-check its exit conditions.
    pub fn wake(&self) {
        self.available.notify_one();
    }

    /// Waits until something calls `enqueue`/`wake`, or `max_wait` elapses.
    ///
    /// A wake-up that happens while nobody is waiting is remembered, so a
    /// consumer that checks the queue and then waits cannot miss it.
    pub async fn wait_for_work(&self, max_wait: Duration) {
        let _ = tokio::time::timeout(max_wait, self.available.notified()).await;
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not Vec with remove(0)?
//    - remove(0) shifts every remaining element: O(n) per dequeue
//    - VecDeque is a ring buffer, both ends are O(1)
//
// 2. Why one lock for items and total_processed?
//    - A dequeue changes both; with two locks a reader could see the item
//      gone but the counter not yet bumped
//
// 3. Why Notify::notify_one and not notify_waiters?
//    - notify_one stores a permit when nobody is waiting yet
//    - notify_waiters would lose a wake-up that races with the consumer
//      going to sleep
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let frontier = Frontier::new();
        frontier.enqueue("a".to_string());
        frontier.enqueue("b".to_string());
        frontier.enqueue("c".to_string());

        assert_eq!(frontier.dequeue().unwrap(), "a");
        assert_eq!(frontier.try_dequeue().as_deref(), Some("b"));
        assert_eq!(frontier.dequeue().unwrap(), "c");
    }

    #[test]
    fn test_counts_follow_enqueues_and_dequeues() {
        let frontier = Frontier::with_capacity(8);
        for i in 0..5 {
            frontier.enqueue(format!("https://example.com/{}", i));
            assert_eq!(frontier.size(), i + 1);
        }

        for dequeued in 1..=3 {
            frontier.dequeue().unwrap();
            assert_eq!(frontier.size(), 5 - dequeued);
            assert_eq!(frontier.total_processed_urls(), dequeued);
        }
    }

    #[test]
    fn test_empty_dequeue_leaves_state_unchanged() {
        let frontier = Frontier::new();
        assert_eq!(frontier.try_dequeue(), None);
        assert_eq!(frontier.dequeue(), Err(FrontierError::Empty));
        assert_eq!(frontier.size(), 0);
        assert_eq!(frontier.total_processed_urls(), 0);
        assert!(frontier.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_and_dequeue() {
        let frontier = Arc::new(Frontier::new());
        let mut handles = Vec::new();

        for producer in 0..8 {
            let frontier = Arc::clone(&frontier);
            handles.push(tokio::spawn(async move {
                for i in 0..250 {
                    frontier.enqueue(format!("{}-{}", producer, i));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let frontier = Arc::clone(&frontier);
            consumers.push(tokio::spawn(async move {
                let mut taken = 0;
                while frontier.try_dequeue().is_some() {
                    taken += 1;
                }
                taken
            }));
        }

        let mut taken = 0;
        for consumer in consumers {
            taken += consumer.await.unwrap();
        }

        assert_eq!(taken, 2000);
        assert_eq!(frontier.total_processed_urls(), 2000);
        assert_eq!(frontier.size(), 0);
    }

    #[tokio::test]
    async fn test_wake_before_wait_is_not_lost() {
        let frontier = Frontier::new();
        frontier.wake();
        // Would otherwise sit out the full minute
        tokio::time::timeout(
            Duration::from_secs(1),
            frontier.wait_for_work(Duration::from_secs(60)),
        )
        .await
        .expect("stored wake-up should release the waiter");
    }
}
