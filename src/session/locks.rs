use super::SessionToken;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-token async locks.
///
/// Each session token gets its own mutex, created on demand and dropped
/// again once nobody holds or waits on it. Operations on different tokens
/// never wait on each other.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `token`.
    pub async fn acquire(&self, token: &SessionToken) -> SessionLease {
        let lock = self
            .locks
            .entry(token.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        SessionLease {
            guard: Some(guard),
            token: token.as_str().to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of tokens with a live lock entry.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one session token, released on drop.
pub struct SessionLease {
    guard: Option<OwnedMutexGuard<()>>,
    token: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        // Release first so the strong count only counts the map and waiters.
        self.guard.take();
        self.locks
            .remove_if(&self.token, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_token_is_serialized() {
        let locks = SessionLocks::new();
        let token = SessionToken::generate();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let token = token.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _lease = locks.acquire(&token).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_tokens_do_not_block() {
        let locks = SessionLocks::new();
        let a = SessionToken::generate();
        let b = SessionToken::generate();

        let _held = locks.acquire(&a).await;
        let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&b)).await;
        assert!(other.is_ok());
        assert_eq!(locks.active(), 2);

        drop(other);
        assert_eq!(locks.active(), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = SessionLocks::new();
        let token = SessionToken::generate();
        {
            let _lease = locks.acquire(&token).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
