use dashmap::DashMap;

/// Screen name to user id lookups that have already been resolved.
///
/// A user id never changes for an account, so entries are written once and
/// never evicted. Concurrent first writes race harmlessly because every
/// writer stores the same value. Share one cache between scrapers with
/// `Arc<UserIdCache>`, or give each session its own.
#[derive(Debug, Default)]
pub struct UserIdCache {
    ids: DashMap<String, String>,
}

impl UserIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen names are matched case-insensitively.
    pub fn get(&self, screen_name: &str) -> Option<String> {
        self.ids
            .get(&screen_name.to_ascii_lowercase())
            .map(|id| id.value().clone())
    }

    pub fn insert(&self, screen_name: &str, user_id: &str) {
        if user_id.is_empty() {
            return;
        }
        self.ids
            .entry(screen_name.to_ascii_lowercase())
            .or_insert_with(|| user_id.to_owned());
    }

    pub fn clear(&self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn first_write_wins() {
        let cache = UserIdCache::new();
        cache.insert("Twitter", "783214");
        cache.insert("twitter", "999");
        assert_eq!(cache.get("TWITTER").as_deref(), Some("783214"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_ids_are_not_cached() {
        let cache = UserIdCache::new();
        cache.insert("ghost", "");
        assert!(cache.get("ghost").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_writers_agree() {
        let cache = Arc::new(UserIdCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.insert("nasa", "11348282"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.get("nasa").as_deref(), Some("11348282"));

        cache.clear();
        assert!(cache.get("nasa").is_none());
    }
}
