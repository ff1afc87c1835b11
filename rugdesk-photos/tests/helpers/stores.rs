//! In-memory object store with scripted failures

use async_trait::async_trait;
use chrono::Utc;
use rugdesk_photos::storage::{ObjectStore, PutOptions, SignedUrl, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Object store backed by a `HashMap`
///
/// Puts for paths containing a scripted fragment fail with
/// `StorageError::Network` a fixed number of times.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    /// Fragment → remaining failures (`usize::MAX` fails forever)
    failures: Mutex<Vec<(String, usize)>>,
    put_log: Mutex<Vec<String>>,
    put_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every put for `delay` so concurrent puts overlap
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = delay;
        self
    }

    /// Fail the next `times` puts whose path contains `fragment`
    pub fn fail_times(self, fragment: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((fragment.to_string(), times));
        self
    }

    /// Fail every put whose path contains `fragment`
    pub fn fail_always(self, fragment: &str) -> Self {
        self.fail_times(fragment, usize::MAX)
    }

    pub fn put_calls(&self) -> usize {
        self.put_log.lock().unwrap().len()
    }

    /// Paths of every put attempt, in call order
    pub fn put_log(&self) -> Vec<String> {
        self.put_log.lock().unwrap().clone()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Highest number of puts observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn scripted_failure(&self, path: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        for (fragment, remaining) in failures.iter_mut() {
            if path.contains(fragment.as_str()) && *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: PutOptions,
    ) -> Result<String, StorageError> {
        self.put_log.lock().unwrap().push(path.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.put_delay.is_zero() {
            tokio::time::sleep(self.put_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.scripted_failure(path) {
            return Err(StorageError::Network(format!("scripted failure for {}", path)));
        }

        let mut objects = self.objects.lock().unwrap();
        if !options.overwrite && objects.contains_key(path) {
            return Err(StorageError::Conflict(path.to_string()));
        }
        objects.insert(path.to_string(), bytes);
        Ok(path.to_string())
    }

    async fn sign(&self, path: &str, ttl: Duration) -> Result<SignedUrl, StorageError> {
        Ok(SignedUrl {
            url: format!("memory://{}", path),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        })
    }
}
