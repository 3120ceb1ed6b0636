//! Per-controller response cache.
//!
//! Maps a target string to the payload its first successful retrieval
//! produced. Entries are never evicted; the cache lives exactly as long as
//! the controller that owns it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct ResponseCache<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> Default for ResponseCache<T> {
    fn default() -> Self { Self::new() }
}

impl<T> ResponseCache<T> {
    pub fn new() -> Self { Self { entries: Mutex::new(HashMap::new()) } }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, target: impl Into<String>, payload: T) { self.entries().insert(target.into(), payload); }

    pub fn contains(&self, target: &str) -> bool { self.entries().contains_key(target) }

    pub fn len(&self) -> usize { self.entries().len() }

    pub fn is_empty(&self) -> bool { self.entries().is_empty() }

    /// Cached targets, sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.entries().keys().cloned().collect();
        targets.sort();
        targets
    }
}

impl<T: Clone> ResponseCache<T> {
    pub fn get(&self, target: &str) -> Option<T> { self.entries().get(target).cloned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let cache: ResponseCache<u32> = ResponseCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("/items"), None);
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ResponseCache::new();
        cache.insert("/items", vec![1, 2, 3]);
        assert!(cache.contains("/items"));
        assert_eq!(cache.get("/items"), Some(vec![1, 2, 3]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_exact_target() {
        let cache = ResponseCache::new();
        cache.insert("/items", 1);
        assert!(!cache.contains("/items/"));
        assert!(!cache.contains("/Items"));
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = ResponseCache::new();
        cache.insert("/a", 1);
        cache.insert("/a", 2);
        assert_eq!(cache.get("/a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_targets_sorted() {
        let cache = ResponseCache::new();
        cache.insert("/b", 2);
        cache.insert("/a", 1);
        assert_eq!(cache.targets(), vec!["/a".to_string(), "/b".to_string()]);
    }
}
