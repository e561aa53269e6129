use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    last_access: Instant,
    access_count: u64,
}

/// What the supervisor removed and how stale it was.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionReport {
    pub session_id: String,
    pub idle: Duration,
}

/// Registry of live sessions keyed by id. All access goes through the one
/// internal lock. `with_session` runs the closure while the lock is held, so
/// it is for short, synchronous mutations only; long-running work (generator
/// calls) belongs outside, with the session taken out and re-inserted.
pub struct SessionStore<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> SessionStore<T> {
    pub fn new() -> Self {
        SessionStore {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, session_id: &str, value: T) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            session_id.to_string(),
            Entry {
                value,
                last_access: Instant::now(),
                access_count: 0,
            },
        );
    }

    /// Run `f` against a session, recording the access. Returns `None` when
    /// the session does not exist (possibly evicted).
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(session_id)?;
        entry.last_access = Instant::now();
        entry.access_count += 1;
        Some(f(&mut entry.value))
    }

    /// Remove a session and hand its state back to the caller.
    pub fn take(&self, session_id: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(session_id).map(|e| e.value)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict the oldest quarter of sessions, ranked by last access time with
    /// access count as tie-break. At least one session goes when any exist.
    pub fn evict_oldest_quarter(&self) -> Vec<EvictionReport> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(String, Instant, u64)> = entries
            .iter()
            .map(|(id, e)| (id.clone(), e.last_access, e.access_count))
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));

        let count = (ranked.len() / 4).max(1);
        let now = Instant::now();
        let mut reports = Vec::with_capacity(count);
        for (id, last_access, _) in ranked.into_iter().take(count) {
            entries.remove(&id);
            reports.push(EvictionReport {
                session_id: id,
                idle: now.saturating_duration_since(last_access),
            });
        }
        reports
    }

    /// Evict every session idle longer than `max_idle`.
    pub fn evict_idle(&self, max_idle: Duration) -> Vec<EvictionReport> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_access) > max_idle)
            .map(|(id, _)| id.clone())
            .collect();

        let mut reports = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(entry) = entries.remove(&id) {
                reports.push(EvictionReport {
                    session_id: id,
                    idle: now.saturating_duration_since(entry.last_access),
                });
            }
        }
        reports
    }
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_access_and_take() {
        let store = SessionStore::new();
        store.insert("a", 1u32);
        assert!(store.contains("a"));
        assert_eq!(store.with_session("a", |v| *v += 1), Some(()));
        assert_eq!(store.take("a"), Some(2));
        assert!(!store.contains("a"));
        assert_eq!(store.with_session("a", |v| *v), None);
    }

    #[test]
    fn test_evicts_at_least_one_when_pressed() {
        let store = SessionStore::new();
        store.insert("a", ());
        store.insert("b", ());
        let reports = store.evict_oldest_quarter();
        assert_eq!(reports.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_eviction_prefers_least_recently_used() {
        let store = SessionStore::new();
        for id in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            store.insert(id, ());
        }
        // Touch everything except "a" and "b"; they become the oldest.
        for id in ["c", "d", "e", "f", "g", "h"] {
            store.with_session(id, |_| ());
        }
        let reports = store.evict_oldest_quarter();
        let mut evicted: Vec<&str> = reports.iter().map(|r| r.session_id.as_str()).collect();
        evicted.sort_unstable();
        assert_eq!(evicted, vec!["a", "b"]);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_access_count_breaks_ties() {
        let store = SessionStore::new();
        store.insert("cold", ());
        store.insert("warm", ());
        store.with_session("warm", |_| ());
        // Re-touch both so last_access is close; counts differ.
        store.with_session("cold", |_| ());
        store.with_session("warm", |_| ());
        // "cold" has fewer accesses; with near-equal recency it should not
        // survive ahead of "warm" when both are candidates.
        let reports = store.evict_oldest_quarter();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].session_id, "cold");
    }

    #[test]
    fn test_evict_idle_only_removes_stale() {
        let store = SessionStore::new();
        store.insert("fresh", ());
        let reports = store.evict_idle(Duration::from_secs(60));
        assert!(reports.is_empty());
        assert!(store.contains("fresh"));
    }
}
